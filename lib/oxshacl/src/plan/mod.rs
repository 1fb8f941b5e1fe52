//! Lazy, pull-based validation plans.
//!
//! A plan is a tree of [`PlanNode`]s. Each node is an iterator of [`ValidationTuple`]s pulling from its parents.
//! Leaves read statements through the [`ConnectionsGroup`](crate::connections::ConnectionsGroup),
//! inner nodes sort, join, filter, group and reshape the tuple stream.
//!
//! Nodes relying on the order of their input (merge joins, grouping) take a [`Sorted`] plan:
//! a plan whose tuples are ordered by active target.
//! [`Sorted`] can only be built by [`Sort`] or by nodes known to emit ordered output, so the
//! ordering precondition is checked by the type system.
//!
//! Nodes with several outputs (filters, joins) are [forked](fork): each output is an [`Outlet`]
//! that can be consumed independently, and the outputs nobody reads are never buffered.

mod cache;
mod external;
mod filter;
mod fork;
mod group;
mod join;
mod select;
mod sort;
mod transform;
mod union;
mod unique;

pub use cache::CachedPlan;
pub use external::{BulkedExternalJoin, ExternalPredicateObjectFilter, ExternalTargetFilter, JoinKind};
pub use filter::{
    DatatypeFilter, FilterNode, InFilter, LanguageInFilter, LengthFilter, NodeKindFilter,
    PatternFilter, RangeBound, RangeFilter, TupleFilter,
};
pub use fork::Outlet;
pub(crate) use fork::{Outlets, Router, fork};
pub use group::{GroupByFilter, GroupCondition};
pub use join::InnerJoin;
pub use select::{Projection, Select, UnorderedSelect, ValuesBacked};
pub use sort::Sort;
pub use transform::{Reported, ResultTemplate, Transform, TransformNode};
pub use union::Union;
pub use unique::Unique;

use crate::error::ShaclError;
use crate::tuple::ValidationTuple;

/// A node of a validation plan.
pub trait PlanNode: Iterator<Item = Result<ValidationTuple, ShaclError>> {
    /// Depth of the node in the plan tree, leaves having depth 1.
    fn depth(&self) -> usize;
}

impl<P: PlanNode + ?Sized> PlanNode for Box<P> {
    fn depth(&self) -> usize {
        (**self).depth()
    }
}

pub type BoxedPlan<'a> = Box<dyn PlanNode + 'a>;

/// A plan whose tuples are ordered by active target using [`cmp_terms`](crate::comparator::cmp_terms).
pub struct Sorted<'a> {
    inner: BoxedPlan<'a>,
}

impl<'a> Sorted<'a> {
    /// Wraps a plan known to emit ordered tuples.
    pub(crate) fn assume_sorted(inner: BoxedPlan<'a>) -> Self {
        Self { inner }
    }

    /// A plan with a single tuple is trivially sorted.
    pub fn of_single(tuple: ValidationTuple) -> Self {
        Self::assume_sorted(Box::new(CachedPlan::new(vec![tuple].into())))
    }

    pub fn empty() -> Self {
        Self::assume_sorted(Box::new(EmptyPlan))
    }

    pub fn into_inner(self) -> BoxedPlan<'a> {
        self.inner
    }

    /// Keeps the tuples for which `filter` returns `matching`.
    ///
    /// The other branch is closed right away and never buffered.
    pub fn filter(self, filter: impl TupleFilter + 'a, matching: bool) -> Self {
        let node = FilterNode::new(self.inner, filter);
        Self::assume_sorted(Box::new(if matching {
            node.true_node()
        } else {
            node.false_node()
        }))
    }

    /// Removes duplicated tuples.
    pub fn unique(self) -> Self {
        Self::assume_sorted(Box::new(Unique::new(self.inner)))
    }

    /// Applies a transformation that keeps the active target of every tuple.
    pub fn map_keeping_target(self, transform: Transform) -> Result<Self, ShaclError> {
        if !transform.keeps_active_target() {
            return Err(ShaclError::invalid_tuple(format!(
                "{} changes the active target of the tuples",
                transform.name()
            )));
        }
        Ok(Self::assume_sorted(Box::new(TransformNode::new(
            self.inner, transform,
        ))))
    }
}

impl Iterator for Sorted<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl PlanNode for Sorted<'_> {
    fn depth(&self) -> usize {
        self.inner.depth()
    }
}

/// A plan without any tuple.
pub struct EmptyPlan;

impl Iterator for EmptyPlan {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

impl PlanNode for EmptyPlan {
    fn depth(&self) -> usize {
        1
    }
}

/// Traces every tuple flowing out of its parent.
pub struct Logged<'a> {
    parent: BoxedPlan<'a>,
    label: &'static str,
    id: usize,
}

impl<'a> Logged<'a> {
    pub fn new(parent: BoxedPlan<'a>, label: &'static str, id: usize) -> Self {
        Self { parent, label, id }
    }
}

impl Iterator for Logged<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.parent.next();
        match &next {
            Some(Ok(tuple)) => {
                tracing::trace!(node = self.id, label = self.label, %tuple, "tuple");
            }
            Some(Err(error)) => {
                tracing::trace!(node = self.id, label = self.label, %error, "error");
            }
            None => tracing::trace!(node = self.id, label = self.label, "exhausted"),
        }
        next
    }
}

impl PlanNode for Logged<'_> {
    fn depth(&self) -> usize {
        self.parent.depth()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tuple::Scope;
    use oxrdf::{NamedNode, Term};

    pub fn ex(name: &str) -> Term {
        NamedNode::new_unchecked(format!("http://example.org/{name}")).into()
    }

    /// An unsorted plan over the given tuples.
    pub fn plan_of(tuples: Vec<ValidationTuple>) -> BoxedPlan<'static> {
        Box::new(CachedPlan::new(tuples.into()))
    }

    pub fn targets(names: &[&str]) -> Vec<ValidationTuple> {
        names
            .iter()
            .map(|n| ValidationTuple::for_target(ex(n)))
            .collect()
    }

    pub fn collect(plan: impl PlanNode) -> Vec<ValidationTuple> {
        plan.collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_single_and_empty() {
        assert_eq!(collect(Sorted::empty()).len(), 0);
        let tuple = ValidationTuple::for_target(ex("a"));
        assert_eq!(collect(Sorted::of_single(tuple.clone())), vec![tuple]);
    }

    #[test]
    fn test_map_keeping_target_rejects_reordering() {
        let sorted = Sort::new(plan_of(targets(&["a"])));
        assert!(
            sorted
                .map_keeping_target(Transform::TargetChainPopper)
                .is_err()
        );
        let with_value =
            || Sort::new(plan_of(vec![ValidationTuple::with_value(ex("a"), ex("b"))]));
        let trimmed = collect(
            with_value()
                .map_keeping_target(Transform::TrimToTarget)
                .unwrap(),
        );
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].chain(), &[ex("a")]);
        assert_eq!(trimmed[0].scope(), Scope::PropertyShape);
        assert!(!trimmed[0].has_value());
        let shifted = collect(
            with_value()
                .map_keeping_target(Transform::ShiftToNodeShape)
                .unwrap(),
        );
        assert_eq!(shifted, targets(&["a"]));
    }
}
