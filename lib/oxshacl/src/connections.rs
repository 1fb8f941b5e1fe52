//! Access to the statements of a transaction.
//!
//! A transaction is seen through four [`StatementView`]s: the state it would commit ([`Base`](StatementView::Base)),
//! the statements it adds and removes, and the state before it started.
//! [`StatementSource`] is the seam to the store, and [`ConnectionsGroup`] bundles it with the per-validation
//! state shared by every plan: settings, the RDFS subclass reasoner and the plan cache.

use crate::error::ShaclError;
use crate::path::PropertyPath;
use crate::plan::{BoxedPlan, CachedPlan, Sorted};
use crate::reasoner::RdfsSubClassOfReasoner;
use crate::settings::ValidationSettings;
use crate::target::Target;
use crate::tuple::ValidationTuple;
use dashmap::DashMap;
use oxrdf::{GraphName, NamedNode, Quad, Term};
use spareval::QuerySolution;
use spargebra::Query;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

/// Which side of a transaction a read looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementView {
    /// The state the transaction would commit.
    Base,
    /// Statements added by the transaction.
    Added,
    /// Statements removed by the transaction.
    Removed,
    /// The state before the transaction.
    PreviousState,
}

/// A statement pattern, `None` being a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StatementPattern {
    pub subject: Option<Term>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
    pub graph_name: Option<GraphName>,
}

impl StatementPattern {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<Term>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<NamedNode>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    #[must_use]
    pub fn with_graph_name(mut self, graph_name: impl Into<GraphName>) -> Self {
        self.graph_name = Some(graph_name.into());
        self
    }

    /// Checks if a quad matches the pattern.
    pub fn matches(&self, quad: &Quad) -> bool {
        self.subject
            .as_ref()
            .is_none_or(|s| *s == Term::from(quad.subject.clone()))
            && self.predicate.as_ref().is_none_or(|p| *p == quad.predicate)
            && self.object.as_ref().is_none_or(|o| *o == quad.object)
            && self
                .graph_name
                .as_ref()
                .is_none_or(|g| *g == quad.graph_name)
    }
}

pub type QuadIter<'a> = Box<dyn Iterator<Item = Result<Quad, ShaclError>> + 'a>;

pub type SolutionIter<'a> = Box<dyn Iterator<Item = Result<QuerySolution, ShaclError>> + 'a>;

/// A store able to expose a transaction to the validation engine.
///
/// Implementations must keep the four views consistent:
/// `Base` is `PreviousState` plus `Added` minus `Removed`, and `Added` and `Removed` are disjoint.
pub trait StatementSource: Sync {
    /// Statements of `view` matching `pattern`.
    fn scan(&self, view: StatementView, pattern: &StatementPattern)
    -> Result<QuadIter<'_>, ShaclError>;

    fn has_statement(
        &self,
        view: StatementView,
        pattern: &StatementPattern,
    ) -> Result<bool, ShaclError> {
        Ok(self.scan(view, pattern)?.next().transpose()?.is_some())
    }

    /// Whether the transaction adds any statement.
    fn has_added(&self) -> bool;

    /// Whether the transaction removes any statement.
    fn has_removed(&self) -> bool;

    /// Whether the store held no statement before the transaction.
    fn is_base_empty(&self) -> bool;

    /// Evaluates a SPARQL `SELECT` query against `view`.
    fn evaluate(&self, view: StatementView, query: &Query) -> Result<SolutionIter<'_>, ShaclError>;

    /// Whether several threads may read the views at the same time.
    fn supports_concurrent_reads(&self) -> bool {
        true
    }
}

/// Identifies a plan whose output can be shared by several shards of one validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanKey {
    Targets {
        view: StatementView,
        target: Target,
    },
    PathEdges {
        view: StatementView,
        path: PropertyPath,
    },
}

/// Everything a plan needs to read a transaction.
///
/// One group is created per validation and shared by all the shards, possibly across threads.
pub struct ConnectionsGroup<'a> {
    source: &'a dyn StatementSource,
    settings: &'a ValidationSettings,
    reasoner: OnceLock<RdfsSubClassOfReasoner>,
    cache: DashMap<PlanKey, Arc<[ValidationTuple]>>,
    node_ids: AtomicUsize,
}

impl<'a> ConnectionsGroup<'a> {
    pub fn new(source: &'a dyn StatementSource, settings: &'a ValidationSettings) -> Self {
        Self {
            source,
            settings,
            reasoner: OnceLock::new(),
            cache: DashMap::new(),
            node_ids: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &'a dyn StatementSource {
        self.source
    }

    pub fn settings(&self) -> &'a ValidationSettings {
        self.settings
    }

    pub fn scan(
        &self,
        view: StatementView,
        pattern: &StatementPattern,
    ) -> Result<QuadIter<'a>, ShaclError> {
        self.source.scan(view, pattern)
    }

    pub fn has_statement(
        &self,
        view: StatementView,
        pattern: &StatementPattern,
    ) -> Result<bool, ShaclError> {
        self.source.has_statement(view, pattern)
    }

    pub fn evaluate(
        &self,
        view: StatementView,
        query: &Query,
    ) -> Result<SolutionIter<'a>, ShaclError> {
        self.source.evaluate(view, query)
    }

    pub fn is_base_empty(&self) -> bool {
        self.source.is_base_empty()
    }

    /// The subclass reasoner, loaded from the base view on first use.
    ///
    /// Returns `None` when RDFS subclass reasoning is disabled.
    pub fn reasoner(&self) -> Result<Option<&RdfsSubClassOfReasoner>, ShaclError> {
        if !self.settings.rdfs_sub_class_reasoning {
            return Ok(None);
        }
        if let Some(reasoner) = self.reasoner.get() {
            return Ok(Some(reasoner));
        }
        let loaded = RdfsSubClassOfReasoner::load(self.source, StatementView::Base)?;
        Ok(Some(self.reasoner.get_or_init(|| loaded)))
    }

    /// `class` and, when reasoning is enabled, all of its subclasses, sorted.
    pub fn backwards_chain(&self, class: &NamedNode) -> Result<Vec<NamedNode>, ShaclError> {
        let mut classes = match self.reasoner()? {
            Some(reasoner) => reasoner.backwards_chain(class).into_iter().collect(),
            None => vec![class.clone()],
        };
        classes.sort_unstable_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(classes)
    }

    /// Returns the output of the plan identified by `key`, building it with `build` on a cache miss.
    ///
    /// The output is materialized once and replayed to every caller.
    pub fn cached(
        &self,
        key: PlanKey,
        build: impl FnOnce() -> Result<Sorted<'a>, ShaclError>,
    ) -> Result<Sorted<'a>, ShaclError> {
        if !self.settings.cache_select_nodes {
            return build();
        }
        if let Some(tuples) = self.cache.get(&key) {
            tracing::trace!(?key, "plan cache hit");
            return Ok(Sorted::assume_sorted(Box::new(CachedPlan::new(Arc::clone(
                &tuples,
            )))));
        }
        let tuples = build()?.collect::<Result<Arc<[_]>, _>>()?;
        let tuples = Arc::clone(self.cache.entry(key).or_insert(tuples).value());
        Ok(Sorted::assume_sorted(Box::new(CachedPlan::new(tuples))))
    }

    /// A fresh identifier for a plan node, used to correlate log lines.
    pub fn next_node_id(&self) -> usize {
        self.node_ids.fetch_add(1, Ordering::Relaxed)
    }

    /// Wraps a plan so that every tuple it emits is traced, when execution logging is enabled.
    pub fn logged(&self, plan: BoxedPlan<'a>, label: &'static str) -> BoxedPlan<'a> {
        if self.settings.log_validation_execution {
            Box::new(crate::plan::Logged::new(plan, label, self.next_node_id()))
        } else {
            plan
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::vocab::rdf;
    use oxrdf::{Literal, NamedNodeRef};

    const ALICE: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.org/alice");
    const NAME: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("http://example.org/name");

    #[test]
    fn test_pattern_matches() {
        let quad = Quad::new(
            ALICE,
            NAME,
            Literal::new_simple_literal("Alice"),
            GraphName::DefaultGraph,
        );
        assert!(StatementPattern::new().matches(&quad));
        assert!(
            StatementPattern::new()
                .with_subject(ALICE.into_owned())
                .with_predicate(NAME.into_owned())
                .matches(&quad)
        );
        assert!(!StatementPattern::new().with_predicate(rdf::TYPE).matches(&quad));
        assert!(
            StatementPattern::new()
                .with_graph_name(GraphName::DefaultGraph)
                .matches(&quad)
        );
        assert!(
            !StatementPattern::new()
                .with_graph_name(NamedNode::new_unchecked("http://example.org/g"))
                .matches(&quad)
        );
    }
}
