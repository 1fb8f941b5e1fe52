//! RDFS subclass reasoning for class targets and `sh:class`.

use crate::connections::{StatementPattern, StatementSource, StatementView};
use crate::error::ShaclError;
use oxrdf::vocab::rdfs;
use oxrdf::{NamedNode, Term};
use rustc_hash::{FxHashMap, FxHashSet};

/// The `rdfs:subClassOf` hierarchy of the data.
#[derive(Debug, Default, Clone)]
pub struct RdfsSubClassOfReasoner {
    /// Direct subclasses of each class.
    sub_classes: FxHashMap<NamedNode, FxHashSet<NamedNode>>,
}

impl RdfsSubClassOfReasoner {
    /// Reads the `rdfs:subClassOf` statements of `view`, ignoring the ones not between IRIs.
    pub fn load(source: &dyn StatementSource, view: StatementView) -> Result<Self, ShaclError> {
        let mut reasoner = Self::default();
        for quad in source.scan(
            view,
            &StatementPattern::new().with_predicate(rdfs::SUB_CLASS_OF),
        )? {
            let quad = quad?;
            if let (Term::NamedNode(sub), Term::NamedNode(sup)) =
                (Term::from(quad.subject), quad.object)
            {
                reasoner.add_sub_class_of(sub, sup);
            }
        }
        tracing::debug!(
            classes = reasoner.sub_classes.len(),
            "loaded rdfs:subClassOf hierarchy"
        );
        Ok(reasoner)
    }

    pub fn add_sub_class_of(&mut self, sub_class: NamedNode, super_class: NamedNode) {
        self.sub_classes
            .entry(super_class)
            .or_default()
            .insert(sub_class);
    }

    /// `class` and all its direct and indirect subclasses.
    ///
    /// A node typed with any of them is an instance of `class`.
    pub fn backwards_chain(&self, class: &NamedNode) -> FxHashSet<NamedNode> {
        let mut classes = FxHashSet::default();
        classes.insert(class.clone());
        let mut stack = vec![class];
        while let Some(current) = stack.pop() {
            if let Some(subs) = self.sub_classes.get(current) {
                for sub in subs {
                    if classes.insert(sub.clone()) {
                        stack.push(sub);
                    }
                }
            }
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> NamedNode {
        NamedNode::new_unchecked(format!("http://example.org/{name}"))
    }

    #[test]
    fn test_backwards_chain_is_transitive() {
        let mut reasoner = RdfsSubClassOfReasoner::default();
        reasoner.add_sub_class_of(class("Student"), class("Person"));
        reasoner.add_sub_class_of(class("PhdStudent"), class("Student"));
        reasoner.add_sub_class_of(class("Dog"), class("Animal"));
        let chain = reasoner.backwards_chain(&class("Person"));
        assert_eq!(chain.len(), 3);
        assert!(chain.contains(&class("PhdStudent")));
        assert!(!chain.contains(&class("Dog")));
    }

    #[test]
    fn test_cycles_terminate() {
        let mut reasoner = RdfsSubClassOfReasoner::default();
        reasoner.add_sub_class_of(class("A"), class("B"));
        reasoner.add_sub_class_of(class("B"), class("A"));
        assert_eq!(reasoner.backwards_chain(&class("A")).len(), 2);
        assert_eq!(reasoner.backwards_chain(&class("C")).len(), 1);
    }
}
