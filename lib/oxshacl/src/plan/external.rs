//! Plan nodes looking up the store for every tuple of their input.

use super::fork::{Outlet, Outlets, Router, fork};
use super::{PlanNode, Sorted, TupleFilter};
use crate::comparator::cmp_terms;
use crate::connections::{ConnectionsGroup, StatementPattern, StatementView};
use crate::error::ShaclError;
use crate::path::PropertyPath;
use crate::target::Target;
use crate::tuple::ValidationTuple;
use oxrdf::{NamedNode, Term};
use rustc_hash::{FxHashMap, FxHashSet};
use spargebra::SparqlParser;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Tuples without any value are dropped.
    Inner,
    /// Tuples without any value are kept as they are.
    LeftOuter,
}

const JOINED: usize = 0;
const DISCARDED_LEFT: usize = 1;

struct BulkedJoinRouter<'a> {
    left: Sorted<'a>,
    connections: &'a ConnectionsGroup<'a>,
    view: StatementView,
    path: PropertyPath,
    kind: JoinKind,
    exhausted: bool,
}

impl BulkedJoinRouter<'_> {
    fn lookup(
        &self,
        batch: &[ValidationTuple],
    ) -> Result<FxHashMap<Term, Vec<Term>>, ShaclError> {
        let mut values = FxHashMap::<Term, Vec<Term>>::default();
        let mut queried = Vec::new();
        let mut seen = FxHashSet::default();
        for tuple in batch {
            let key = tuple.active_target();
            if !seen.insert(key) {
                continue;
            }
            match key {
                Term::NamedNode(_) | Term::Literal(_) => queried.push(key),
                _ => {
                    values.insert(
                        key.clone(),
                        self.path.values_of(self.connections, self.view, key)?,
                    );
                }
            }
        }
        if !queried.is_empty() {
            let mut query = String::from("SELECT ?a ?c WHERE { VALUES ?a {");
            for key in queried {
                write!(query, " {key}")
                    .map_err(|e| ShaclError::query_construction(&query, e.to_string()))?;
            }
            query.push_str(" } ");
            query.push_str(&self.path.query_fragment("a", "c"));
            query.push_str(" }");
            let parsed = SparqlParser::new()
                .parse_query(&query)
                .map_err(|e| ShaclError::query_construction(&query, e.to_string()))?;
            for solution in self.connections.evaluate(self.view, &parsed)? {
                let solution = solution?;
                if let (Some(key), Some(value)) = (solution.get("a"), solution.get("c")) {
                    values.entry(key.clone()).or_default().push(value.clone());
                }
            }
        }
        for values in values.values_mut() {
            values.sort_by(cmp_terms);
            values.dedup();
        }
        Ok(values)
    }
}

impl Router for BulkedJoinRouter<'_> {
    /// Reads one batch of `left` and dispatches it.
    fn advance(&mut self, outlets: &mut Outlets) -> Result<bool, ShaclError> {
        if self.exhausted {
            return Ok(false);
        }
        let batch_size = self.connections.settings().bulk_join_batch_size.max(1);
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match self.left.next().transpose()? {
                Some(tuple) => batch.push(tuple),
                None => {
                    self.exhausted = true;
                    break;
                }
            }
        }
        if batch.is_empty() {
            return Ok(false);
        }
        let values = self.lookup(&batch)?;
        for tuple in batch {
            match values.get(tuple.active_target()) {
                Some(values) if !values.is_empty() => {
                    for value in values {
                        outlets.push(JOINED, tuple.append_value(value.clone()));
                    }
                }
                _ if self.kind == JoinKind::LeftOuter => {
                    if outlets.is_open(DISCARDED_LEFT) {
                        outlets.push(DISCARDED_LEFT, tuple.clone());
                    }
                    outlets.push(JOINED, tuple);
                }
                _ => outlets.push(DISCARDED_LEFT, tuple),
            }
        }
        Ok(true)
    }

    fn depth(&self) -> usize {
        self.left.depth() + 1
    }
}

/// Joins each tuple with the values reached from its active target by a path.
///
/// The lookups are batched: the keys of up to `batch_size` tuples are sent in a single
/// query with a `VALUES` clause. Blank node keys can't be sent in a query and are looked up
/// with direct scans instead.
/// The joined output keeps the input order, the values of a tuple being ordered with [`cmp_terms`].
/// The tuples without any value are also available on the [discarded](Self::discarded_left) output,
/// whatever the [`JoinKind`].
pub struct BulkedExternalJoin<'a> {
    joined: Outlet<'a>,
    discarded_left: Outlet<'a>,
}

impl<'a> BulkedExternalJoin<'a> {
    pub fn new(
        left: Sorted<'a>,
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
        path: PropertyPath,
        kind: JoinKind,
    ) -> Self {
        let [joined, discarded_left] = fork(BulkedJoinRouter {
            left,
            connections,
            view,
            path,
            kind,
            exhausted: false,
        });
        Self {
            joined,
            discarded_left,
        }
    }

    pub fn joined(self) -> Sorted<'a> {
        Sorted::assume_sorted(Box::new(self.joined))
    }

    /// The tuples of `left` without any value.
    pub fn discarded_left(self) -> Sorted<'a> {
        Sorted::assume_sorted(Box::new(self.discarded_left))
    }

    /// The joined and discarded left outputs.
    pub fn into_parts(self) -> (Sorted<'a>, Sorted<'a>) {
        (
            Sorted::assume_sorted(Box::new(self.joined)),
            Sorted::assume_sorted(Box::new(self.discarded_left)),
        )
    }
}

/// Keeps the tuples whose value (or focus node) has a statement with the given predicate and one of the objects.
///
/// Used by `sh:class` with the `rdf:type` predicate and the subclasses of the expected class.
pub struct ExternalPredicateObjectFilter<'a> {
    connections: &'a ConnectionsGroup<'a>,
    view: StatementView,
    predicate: NamedNode,
    objects: FxHashSet<Term>,
}

impl<'a> ExternalPredicateObjectFilter<'a> {
    pub fn new(
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
        predicate: NamedNode,
        objects: impl IntoIterator<Item = Term>,
    ) -> Self {
        Self {
            connections,
            view,
            predicate,
            objects: objects.into_iter().collect(),
        }
    }
}

impl TupleFilter for ExternalPredicateObjectFilter<'_> {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        let node = tuple.value_or_target();
        if node.is_literal() {
            return Ok(false);
        }
        if self.objects.len() == 1 {
            if let Some(object) = self.objects.iter().next() {
                return self.connections.has_statement(
                    self.view,
                    &StatementPattern::new()
                        .with_subject(node.clone())
                        .with_predicate(self.predicate.clone())
                        .with_object(object.clone()),
                );
            }
        }
        for quad in self.connections.scan(
            self.view,
            &StatementPattern::new()
                .with_subject(node.clone())
                .with_predicate(self.predicate.clone()),
        )? {
            if self.objects.contains(&quad?.object) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Keeps the tuples whose active target is still a target in the given view.
pub struct ExternalTargetFilter<'a> {
    connections: &'a ConnectionsGroup<'a>,
    view: StatementView,
    targets: &'a [Target],
}

impl<'a> ExternalTargetFilter<'a> {
    pub fn new(
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
        targets: &'a [Target],
    ) -> Self {
        Self {
            connections,
            view,
            targets,
        }
    }
}

impl TupleFilter for ExternalTargetFilter<'_> {
    fn matches(&mut self, tuple: &ValidationTuple) -> Result<bool, ShaclError> {
        for target in self.targets {
            if target.contains(self.connections, self.view, tuple.active_target())? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::plan::Sort;
    use crate::plan::tests::{collect, ex, plan_of, targets};
    use crate::settings::ValidationSettings;
    use oxrdf::{Dataset, GraphName, Quad};

    fn knows() -> NamedNode {
        NamedNode::new_unchecked("http://example.org/knows")
    }

    fn store() -> MemoryStore {
        let quad = |s: &str, o: &str| {
            Quad::new(
                NamedNode::new_unchecked(format!("http://example.org/{s}")),
                knows(),
                ex(o),
                GraphName::DefaultGraph,
            )
        };
        MemoryStore::from(Dataset::from_iter([
            quad("a", "c"),
            quad("a", "b"),
            quad("e", "f"),
        ]))
    }

    #[test]
    fn test_discarded_left() {
        let mut store = store();
        let transaction = store.transaction();
        let settings = ValidationSettings::default().with_bulk_join_batch_size(2);
        let connections = ConnectionsGroup::new(&transaction, &settings);
        let (joined, discarded) = BulkedExternalJoin::new(
            Sort::new(plan_of(targets(&["a", "d", "e"]))),
            &connections,
            StatementView::Base,
            PropertyPath::predicate(knows()),
            JoinKind::Inner,
        )
        .into_parts();
        let discarded = collect(discarded);
        assert_eq!(discarded, targets(&["d"]));
        assert_eq!(
            collect(joined),
            vec![
                ValidationTuple::with_value(ex("a"), ex("b")),
                ValidationTuple::with_value(ex("a"), ex("c")),
                ValidationTuple::with_value(ex("e"), ex("f")),
            ]
        );
    }

    #[test]
    fn test_left_outer_keeps_discarded_tuples() {
        let mut store = store();
        let transaction = store.transaction();
        let settings = ValidationSettings::default();
        let connections = ConnectionsGroup::new(&transaction, &settings);
        let join = |kind| {
            BulkedExternalJoin::new(
                Sort::new(plan_of(targets(&["d", "e"]))),
                &connections,
                StatementView::Base,
                PropertyPath::predicate(knows()),
                kind,
            )
        };
        assert_eq!(
            collect(join(JoinKind::LeftOuter).joined()),
            vec![
                ValidationTuple::for_target(ex("d")),
                ValidationTuple::with_value(ex("e"), ex("f")),
            ]
        );
        assert_eq!(
            collect(join(JoinKind::LeftOuter).discarded_left()),
            targets(&["d"])
        );
    }
}
