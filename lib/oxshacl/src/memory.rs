//! An in-memory store with validated transactions.

use crate::connections::{QuadIter, SolutionIter, StatementPattern, StatementSource, StatementView};
use crate::error::ShaclError;
use crate::report::ValidationReport;
use crate::validator::ShaclValidator;
use oxrdf::{Dataset, GraphNameRef, NamedOrBlankNodeRef, Quad, QuadRef, Term};
use spareval::{QueryEvaluator, QueryResults};
use spargebra::Query;
use std::sync::OnceLock;

/// A set of quads only changed through validated transactions.
///
/// ```
/// use oxrdf::{GraphName, Literal, NamedNode, Quad};
/// use oxshacl::{MemoryStore, ShaclValidator, Shapes};
///
/// let validator = ShaclValidator::new(Shapes::default());
/// let mut store = MemoryStore::new();
/// let ex = NamedNode::new("http://example.com")?;
/// let mut transaction = store.transaction();
/// transaction.insert(Quad::new(ex.clone(), ex.clone(), Literal::from(1), GraphName::DefaultGraph));
/// let report = transaction.commit(&validator)?;
/// assert!(report.conforms());
/// assert_eq!(store.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    dataset: Dataset,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed quads.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn contains<'a>(&self, quad: impl Into<QuadRef<'a>>) -> bool {
        self.dataset.contains(quad)
    }

    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Starts a transaction. Nothing is changed until it is committed.
    pub fn transaction(&mut self) -> MemoryTransaction<'_> {
        MemoryTransaction {
            store: self,
            added: Dataset::new(),
            removed: Dataset::new(),
            query_datasets: empty_query_datasets(),
        }
    }
}

impl From<Dataset> for MemoryStore {
    fn from(dataset: Dataset) -> Self {
        Self { dataset }
    }
}

/// Pending changes to a [`MemoryStore`].
///
/// Inserting a quad removed earlier in the transaction, or removing a quad inserted earlier,
/// cancels the first change.
pub struct MemoryTransaction<'a> {
    store: &'a mut MemoryStore,
    added: Dataset,
    removed: Dataset,
    /// The datasets queries are evaluated on, one per view, built on first use.
    query_datasets: [OnceLock<Dataset>; 4],
}

impl MemoryTransaction<'_> {
    /// Adds a quad. Returns `false` if the quad is already in the store.
    pub fn insert(&mut self, quad: impl Into<Quad>) -> bool {
        let quad = quad.into();
        self.query_datasets = empty_query_datasets();
        if self.removed.remove(&quad) {
            return true;
        }
        if self.store.dataset.contains(&quad) {
            return false;
        }
        self.added.insert(&quad)
    }

    /// Removes a quad. Returns `false` if the quad is not in the store.
    pub fn remove(&mut self, quad: impl Into<Quad>) -> bool {
        let quad = quad.into();
        self.query_datasets = empty_query_datasets();
        if self.added.remove(&quad) {
            return true;
        }
        if !self.store.dataset.contains(&quad) {
            return false;
        }
        self.removed.insert(&quad)
    }

    pub fn extend(&mut self, quads: impl IntoIterator<Item = impl Into<Quad>>) {
        for quad in quads {
            self.insert(quad);
        }
    }

    /// The quads the transaction adds.
    pub fn added(&self) -> &Dataset {
        &self.added
    }

    /// The quads the transaction removes.
    pub fn removed(&self) -> &Dataset {
        &self.removed
    }

    /// Validates the transaction and applies it if it conforms.
    ///
    /// A non conforming transaction is discarded and its report returned as
    /// [`ShaclError::Validation`].
    pub fn commit(self, validator: &ShaclValidator) -> Result<ValidationReport, ShaclError> {
        let report = validator.validate_commit(&self)?;
        for quad in &self.removed {
            self.store.dataset.remove(quad);
        }
        for quad in &self.added {
            self.store.dataset.insert(quad);
        }
        tracing::debug!(
            added = self.added.len(),
            removed = self.removed.len(),
            "committed transaction"
        );
        Ok(report)
    }

    /// Discards the transaction.
    pub fn rollback(self) {
        tracing::debug!(
            added = self.added.len(),
            removed = self.removed.len(),
            "rolled back transaction"
        );
    }

    fn matching(&self, view: StatementView, pattern: &StatementPattern) -> Vec<Quad> {
        match view {
            StatementView::Added => matching_quads(&self.added, pattern),
            StatementView::Removed => matching_quads(&self.removed, pattern),
            StatementView::PreviousState => matching_quads(&self.store.dataset, pattern),
            StatementView::Base => {
                let mut quads = matching_quads(&self.store.dataset, pattern);
                quads.retain(|quad| !self.removed.contains(quad));
                quads.extend(matching_quads(&self.added, pattern));
                quads
            }
        }
    }

    /// The quads of a view, also copied in the default graph so queries see their union.
    fn query_dataset(&self, view: StatementView) -> &Dataset {
        let index = match view {
            StatementView::Base => 0,
            StatementView::Added => 1,
            StatementView::Removed => 2,
            StatementView::PreviousState => 3,
        };
        self.query_datasets[index].get_or_init(|| {
            let mut dataset = Dataset::new();
            for quad in self.matching(view, &StatementPattern::new()) {
                if !quad.graph_name.is_default_graph() {
                    dataset.insert(QuadRef::new(
                        &quad.subject,
                        &quad.predicate,
                        &quad.object,
                        GraphNameRef::DefaultGraph,
                    ));
                }
                dataset.insert(&quad);
            }
            dataset
        })
    }
}

impl StatementSource for MemoryTransaction<'_> {
    fn scan(
        &self,
        view: StatementView,
        pattern: &StatementPattern,
    ) -> Result<QuadIter<'_>, ShaclError> {
        Ok(Box::new(self.matching(view, pattern).into_iter().map(Ok)))
    }

    fn has_added(&self) -> bool {
        !self.added.is_empty()
    }

    fn has_removed(&self) -> bool {
        !self.removed.is_empty()
    }

    fn is_base_empty(&self) -> bool {
        self.store.dataset.is_empty()
    }

    fn evaluate(&self, view: StatementView, query: &Query) -> Result<SolutionIter<'_>, ShaclError> {
        match QueryEvaluator::new()
            .execute(self.query_dataset(view), query)
            .map_err(ShaclError::store)?
        {
            QueryResults::Solutions(solutions) => {
                Ok(Box::new(solutions.map(|s| s.map_err(ShaclError::store))))
            }
            QueryResults::Boolean(_) | QueryResults::Graph(_) => Err(
                ShaclError::query_construction(query.to_string(), "not a SELECT query"),
            ),
        }
    }
}

fn empty_query_datasets() -> [OnceLock<Dataset>; 4] {
    std::array::from_fn(|_| OnceLock::new())
}

/// The quads of `dataset` matching `pattern`, using the dataset indexes.
fn matching_quads(dataset: &Dataset, pattern: &StatementPattern) -> Vec<Quad> {
    let candidates: Box<dyn Iterator<Item = QuadRef<'_>>> = match (&pattern.subject, &pattern.object) {
        (Some(subject), _) => match subject {
            Term::NamedNode(node) => {
                Box::new(dataset.quads_for_subject(NamedOrBlankNodeRef::from(node.as_ref())))
            }
            Term::BlankNode(node) => {
                Box::new(dataset.quads_for_subject(NamedOrBlankNodeRef::from(node.as_ref())))
            }
            _ => return Vec::new(),
        },
        (None, Some(object)) => Box::new(dataset.quads_for_object(object.as_ref())),
        (None, None) => match &pattern.predicate {
            Some(predicate) => Box::new(dataset.quads_for_predicate(predicate.as_ref())),
            None => Box::new(dataset.iter()),
        },
    };
    candidates
        .map(QuadRef::into_owned)
        .filter(|quad| pattern.matches(quad))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shapes;
    use oxrdf::{GraphName, Literal, NamedNode};
    use spargebra::SparqlParser;

    fn quad(subject: &str, object: i32) -> Quad {
        Quad::new(
            NamedNode::new_unchecked(format!("http://example.org/{subject}")),
            NamedNode::new_unchecked("http://example.org/p"),
            Literal::from(object),
            GraphName::DefaultGraph,
        )
    }

    fn count(transaction: &MemoryTransaction<'_>, view: StatementView) -> usize {
        transaction
            .scan(view, &StatementPattern::new())
            .unwrap()
            .count()
    }

    #[test]
    fn test_views() {
        let mut store = MemoryStore::from(Dataset::from_iter([quad("a", 1), quad("b", 2)]));
        let mut transaction = store.transaction();
        assert!(transaction.insert(quad("c", 3)));
        assert!(!transaction.insert(quad("a", 1)));
        assert!(transaction.remove(quad("b", 2)));
        assert!(!transaction.remove(quad("d", 4)));
        assert_eq!(count(&transaction, StatementView::Added), 1);
        assert_eq!(count(&transaction, StatementView::Removed), 1);
        assert_eq!(count(&transaction, StatementView::PreviousState), 2);
        assert_eq!(count(&transaction, StatementView::Base), 2);
        assert!(!transaction.is_base_empty());
    }

    #[test]
    fn test_insert_then_remove_cancels() {
        let mut store = MemoryStore::new();
        let mut transaction = store.transaction();
        transaction.insert(quad("a", 1));
        transaction.remove(quad("a", 1));
        assert!(!transaction.has_added());
        assert!(!transaction.has_removed());
    }

    #[test]
    fn test_pattern_scan() {
        let mut store = MemoryStore::from(Dataset::from_iter([quad("a", 1), quad("b", 2)]));
        let transaction = store.transaction();
        let pattern = StatementPattern::new().with_object(Literal::from(2));
        assert_eq!(
            transaction
                .scan(StatementView::Base, &pattern)
                .unwrap()
                .count(),
            1
        );
    }

    #[test]
    fn test_evaluate_sees_named_graphs_in_default_graph() {
        let mut store = MemoryStore::new();
        let mut transaction = store.transaction();
        let mut named = quad("a", 1);
        named.graph_name = NamedNode::new_unchecked("http://example.org/g").into();
        transaction.insert(named);
        let query = SparqlParser::new()
            .parse_query("SELECT ?s WHERE { ?s ?p ?o }")
            .unwrap();
        let solutions = transaction
            .evaluate(StatementView::Base, &query)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(solutions.len(), 1);
    }

    #[test]
    fn test_commit_and_rollback() {
        let validator = ShaclValidator::new(Shapes::default());
        let mut store = MemoryStore::new();
        let mut transaction = store.transaction();
        transaction.insert(quad("a", 1));
        transaction.rollback();
        assert!(store.is_empty());
        let mut transaction = store.transaction();
        transaction.extend([quad("a", 1), quad("b", 2)]);
        assert!(transaction.commit(&validator).unwrap().conforms());
        assert_eq!(store.len(), 2);
    }
}
