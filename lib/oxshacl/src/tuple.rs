//! The unit of data flowing through validation plans.

use crate::comparator::cmp_terms;
use crate::error::ShaclError;
use crate::report::ValidationResult;
use oxrdf::Term;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Whether a tuple is seen from a node shape (focus node only) or from a property shape (focus node and value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    NodeShape,
    PropertyShape,
}

/// A chain of target nodes, optionally ending with a property value.
///
/// The chain always holds at least one element.
/// Equality and hashing only look at the chain, the scope and the value flag:
/// the attached violation records are payload.
#[derive(Debug, Clone)]
pub struct ValidationTuple {
    chain: Vec<Term>,
    scope: Scope,
    has_value: bool,
    results: Vec<ValidationResult>,
}

impl ValidationTuple {
    /// A node shape tuple with a single target.
    pub fn for_target(target: impl Into<Term>) -> Self {
        Self {
            chain: vec![target.into()],
            scope: Scope::NodeShape,
            has_value: false,
            results: Vec::new(),
        }
    }

    /// A property shape tuple `[target, value]`.
    pub fn with_value(target: impl Into<Term>, value: impl Into<Term>) -> Self {
        Self {
            chain: vec![target.into(), value.into()],
            scope: Scope::PropertyShape,
            has_value: true,
            results: Vec::new(),
        }
    }

    /// A node shape tuple from a full target chain.
    pub fn from_target_chain(chain: Vec<Term>) -> Result<Self, ShaclError> {
        if chain.is_empty() {
            return Err(ShaclError::invalid_tuple("a target chain can't be empty"));
        }
        Ok(Self {
            chain,
            scope: Scope::NodeShape,
            has_value: false,
            results: Vec::new(),
        })
    }

    pub fn chain(&self) -> &[Term] {
        &self.chain
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn has_value(&self) -> bool {
        self.has_value
    }

    /// The chain without the trailing value.
    pub fn target_chain(&self) -> &[Term] {
        if self.has_value {
            &self.chain[..self.chain.len() - 1]
        } else {
            &self.chain
        }
    }

    /// The node currently validated: the focus node of the shape this tuple is flowing through.
    pub fn active_target(&self) -> &Term {
        let target_chain = self.target_chain();
        &target_chain[target_chain.len() - 1]
    }

    /// The property value, if this tuple carries one.
    pub fn value(&self) -> Option<&Term> {
        if self.has_value {
            self.chain.last()
        } else {
            None
        }
    }

    /// The value a constraint should look at: the property value, or the focus node itself in node scope.
    pub fn value_or_target(&self) -> &Term {
        self.value().unwrap_or_else(|| self.active_target())
    }

    /// Replaces the value or appends one, switching to property scope.
    #[must_use]
    pub fn set_value(mut self, value: Term) -> Self {
        if self.has_value {
            self.chain.pop();
        }
        self.chain.push(value);
        self.has_value = true;
        self.scope = Scope::PropertyShape;
        self
    }

    /// Drops the value if any.
    #[must_use]
    pub fn trim_to_target(mut self) -> Self {
        if self.has_value {
            self.chain.pop();
            self.has_value = false;
        }
        self
    }

    #[must_use]
    pub fn shift_to_node_shape(self) -> Self {
        let mut tuple = self.trim_to_target();
        tuple.scope = Scope::NodeShape;
        tuple
    }

    /// Marks the last chain element as the value of the second to last one.
    pub fn shift_to_property_shape(mut self) -> Result<Self, ShaclError> {
        if self.chain.len() < 2 {
            return Err(ShaclError::invalid_tuple(format!(
                "{self} is too short to be seen from a property shape"
            )));
        }
        self.scope = Scope::PropertyShape;
        self.has_value = true;
        Ok(self)
    }

    /// Moves one step up the chain.
    ///
    /// In property scope the value is dropped and the previous element becomes the value,
    /// or, without a value, the active target becomes the value of its parent.
    /// In node scope the active target is dropped.
    pub fn pop(mut self) -> Result<Self, ShaclError> {
        if self.scope == Scope::PropertyShape && !self.has_value {
            return self.shift_to_property_shape();
        }
        let min_len = if self.has_value { 3 } else { 2 };
        if self.chain.len() < min_len {
            return Err(ShaclError::invalid_tuple(format!(
                "{self} is too short to be popped"
            )));
        }
        self.chain.pop();
        Ok(self)
    }

    /// Turns the value into the active target of a node shape view.
    pub fn push_value_as_target(mut self) -> Result<Self, ShaclError> {
        if !self.has_value {
            return Err(ShaclError::invalid_tuple(format!("{self} has no value")));
        }
        self.has_value = false;
        self.scope = Scope::NodeShape;
        Ok(self)
    }

    /// Turns the active target into the value of its parent in the chain.
    pub fn pop_target_to_value(self) -> Result<Self, ShaclError> {
        self.trim_to_target().shift_to_property_shape()
    }

    /// Appends the value of `right` (or its active target) to this tuple's target chain.
    #[must_use]
    pub fn join_value(&self, right: &Self) -> Self {
        let mut joined = self.append_value(right.value_or_target().clone());
        joined.results.extend(right.results.iter().cloned());
        joined
    }

    /// A property shape tuple made of this tuple's target chain and `value`.
    #[must_use]
    pub fn append_value(&self, value: Term) -> Self {
        let mut chain = Vec::with_capacity(self.target_chain().len() + 1);
        chain.extend_from_slice(self.target_chain());
        chain.push(value);
        Self {
            chain,
            scope: Scope::PropertyShape,
            has_value: true,
            results: self.results.clone(),
        }
    }

    pub fn cmp_active_target(&self, other: &Self) -> Ordering {
        cmp_terms(self.active_target(), other.active_target())
    }

    /// Compares the full target chains, ignoring values.
    pub fn cmp_full_target(&self, other: &Self) -> Ordering {
        let (a, b) = (self.target_chain(), other.target_chain());
        a.iter()
            .zip(b)
            .map(|(a, b)| cmp_terms(a, b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len()))
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    /// Makes `record` the outermost violation record, nesting the already attached records as its detail.
    pub fn wrap_result(&mut self, mut record: ValidationResult) {
        record.detail.append(&mut self.results);
        self.results.push(record);
    }

    pub fn extend_results(&mut self, results: impl IntoIterator<Item = ValidationResult>) {
        self.results.extend(results);
    }

    pub fn into_results(self) -> Vec<ValidationResult> {
        self.results
    }
}

impl PartialEq for ValidationTuple {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.has_value == other.has_value && self.chain == other.chain
    }
}

impl Eq for ValidationTuple {}

impl Hash for ValidationTuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chain.hash(state);
        self.scope.hash(state);
        self.has_value.hash(state);
    }
}

impl fmt::Display for ValidationTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, term) in self.chain.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if self.has_value && i + 1 == self.chain.len() {
                f.write_str("value=")?;
            }
            write!(f, "{term}")?;
        }
        write!(f, "] {:?}", self.scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::NamedNode;

    fn ex(name: &str) -> Term {
        NamedNode::new_unchecked(format!("http://example.org/{name}")).into()
    }

    #[test]
    fn test_active_target() {
        let tuple = ValidationTuple::for_target(ex("a"));
        assert_eq!(tuple.active_target(), &ex("a"));
        assert_eq!(tuple.value(), None);
        assert_eq!(tuple.value_or_target(), &ex("a"));

        let tuple = ValidationTuple::with_value(ex("a"), ex("b"));
        assert_eq!(tuple.active_target(), &ex("a"));
        assert_eq!(tuple.value(), Some(&ex("b")));
    }

    #[test]
    fn test_scope_shifts() {
        let tuple = ValidationTuple::with_value(ex("a"), ex("b"));
        let node = tuple.clone().shift_to_node_shape();
        assert_eq!(node.chain(), &[ex("a")]);
        assert_eq!(node.scope(), Scope::NodeShape);

        let pushed = tuple.clone().push_value_as_target().unwrap();
        assert_eq!(pushed.active_target(), &ex("b"));
        assert_eq!(pushed.chain().len(), 2);

        let popped = pushed.pop_target_to_value().unwrap();
        assert_eq!(popped, tuple);

        ValidationTuple::for_target(ex("a"))
            .shift_to_property_shape()
            .unwrap_err();
    }

    #[test]
    fn test_pop() {
        let tuple = ValidationTuple::from_target_chain(vec![ex("a"), ex("b")])
            .unwrap()
            .append_value(ex("c"));
        let popped = tuple.pop().unwrap();
        assert_eq!(popped.chain(), &[ex("a"), ex("b")]);
        assert_eq!(popped.value(), Some(&ex("b")));
        assert_eq!(popped.active_target(), &ex("a"));
        popped.pop().unwrap_err();

        let trimmed = ValidationTuple::from_target_chain(vec![ex("a"), ex("b")])
            .unwrap()
            .append_value(ex("c"))
            .trim_to_target();
        let popped = trimmed.pop().unwrap();
        assert_eq!(popped.chain(), &[ex("a"), ex("b")]);
        assert_eq!(popped.value(), Some(&ex("b")));

        let node = ValidationTuple::from_target_chain(vec![ex("a"), ex("b")]).unwrap();
        let popped = node.pop().unwrap();
        assert_eq!(popped, ValidationTuple::for_target(ex("a")));
        popped.pop().unwrap_err();
    }

    #[test]
    fn test_set_value_and_join() {
        let target = ValidationTuple::for_target(ex("a"));
        let with_value = target.clone().set_value(ex("v1")).set_value(ex("v2"));
        assert_eq!(with_value.chain(), &[ex("a"), ex("v2")]);

        let joined = target.join_value(&ValidationTuple::with_value(ex("a"), ex("v3")));
        assert_eq!(joined.chain(), &[ex("a"), ex("v3")]);
        assert_eq!(joined.scope(), Scope::PropertyShape);
        assert_eq!(joined.active_target(), &ex("a"));
    }

    #[test]
    fn test_equality_ignores_results() {
        let mut a = ValidationTuple::for_target(ex("a"));
        let b = ValidationTuple::for_target(ex("a"));
        a.wrap_result(crate::report::ValidationResult::new(
            ex("a"),
            crate::shape::ShapeId::Named(NamedNode::new_unchecked("http://example.org/S")),
            crate::constraint::SourceConstraintComponent::MinCount,
        ));
        assert_eq!(a, b);
        assert_ne!(a, b.clone().set_value(ex("a")));
    }

    #[test]
    fn test_wrap_result_nests_detail() {
        let shape = crate::shape::ShapeId::Named(NamedNode::new_unchecked("http://example.org/S"));
        let mut tuple = ValidationTuple::for_target(ex("a"));
        tuple.wrap_result(crate::report::ValidationResult::new(
            ex("a"),
            shape.clone(),
            crate::constraint::SourceConstraintComponent::Datatype,
        ));
        tuple.wrap_result(crate::report::ValidationResult::new(
            ex("a"),
            shape,
            crate::constraint::SourceConstraintComponent::Or,
        ));
        assert_eq!(tuple.results().len(), 1);
        assert_eq!(tuple.results()[0].detail.len(), 1);
    }

    #[test]
    fn test_full_target_order() {
        let a = ValidationTuple::from_target_chain(vec![ex("a"), ex("c")]).unwrap();
        let b = ValidationTuple::from_target_chain(vec![ex("b"), ex("c")]).unwrap();
        assert_eq!(a.cmp_active_target(&b), Ordering::Equal);
        assert_eq!(a.cmp_full_target(&b), Ordering::Less);
    }
}
