//! Focus node selection for nested shapes.
//!
//! The focus nodes of a shape nested in property shapes are reached from the targets of the
//! root shape by following the paths of the enclosing property shapes.
//! A [`TargetChain`] records these paths, so the focus nodes of a nested shape come as tuples
//! holding the full chain of nodes from the root target down to the focus node.

use crate::connections::{ConnectionsGroup, StatementPattern, StatementView};
use crate::error::ShaclError;
use crate::path::PropertyPath;
use crate::plan::{
    BoxedPlan, BulkedExternalJoin, JoinKind, Sort, Sorted, Transform, TransformNode, Union,
    ValuesBacked,
};
use crate::target::Target;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{NamedNode, Term};
use rustc_hash::FxHashSet;

/// Targets of a root shape followed by a sequence of paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetChain {
    targets: Vec<Target>,
    segments: Vec<PropertyPath>,
}

impl TargetChain {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            segments: Vec::new(),
        }
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn segments(&self) -> &[PropertyPath] {
        &self.segments
    }

    /// No path to follow: the focus nodes are the targets themselves.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The chain of the values of `path`.
    #[must_use]
    pub fn extend(&self, path: PropertyPath) -> Self {
        let mut extended = self.clone();
        extended.segments.push(path);
        extended
    }

    /// The chain without its last path, and that path.
    pub fn pop(&self) -> Option<(Self, PropertyPath)> {
        let mut popped = self.clone();
        let last = popped.segments.pop()?;
        Some((popped, last))
    }

    fn root_targets<'a>(
        &self,
        connections: &'a ConnectionsGroup<'a>,
        view: StatementView,
    ) -> Result<Sorted<'a>, ShaclError> {
        if let [target] = self.targets.as_slice() {
            return target.scan_plan(connections, view);
        }
        let plans = self
            .targets
            .iter()
            .map(|t| Ok(t.scan_plan(connections, view)?.into_inner()))
            .collect::<Result<Vec<BoxedPlan<'a>>, ShaclError>>()?;
        Ok(Sort::new(Box::new(Union::new(plans))).unique())
    }

    /// Follows the paths of the chain in the base view from root targets.
    fn follow_segments<'a>(
        &self,
        connections: &'a ConnectionsGroup<'a>,
        roots: Sorted<'a>,
    ) -> Sorted<'a> {
        let mut current = roots;
        for segment in &self.segments {
            let values = BulkedExternalJoin::new(
                current,
                connections,
                StatementView::Base,
                segment.clone(),
                JoinKind::Inner,
            )
            .joined();
            current = Sort::new(Box::new(TransformNode::new(
                values.into_inner(),
                Transform::TargetChainPusher,
            )))
            .unique();
        }
        current
    }

    /// All the focus nodes of the chain in the base view.
    pub fn all_targets<'a>(
        &self,
        connections: &'a ConnectionsGroup<'a>,
    ) -> Result<Sorted<'a>, ShaclError> {
        let roots = self.root_targets(connections, StatementView::Base)?;
        Ok(self.follow_segments(connections, roots))
    }

    /// The focus nodes reached from the targets introduced by the transaction.
    pub fn added_targets<'a>(
        &self,
        connections: &'a ConnectionsGroup<'a>,
    ) -> Result<Sorted<'a>, ShaclError> {
        let roots = self.root_targets(connections, StatementView::Added)?;
        Ok(self.follow_segments(connections, roots))
    }

    /// The focus nodes whose validation result may have changed in the transaction.
    ///
    /// These are the new targets plus the targets from which an added or removed statement
    /// read by the validation can be reached in at most `lookback` steps.
    /// `paths` are the paths followed from the root targets, the chain segments included, and
    /// `reads_types` is set if the `rdf:type` of the reached nodes is read.
    /// A changed statement is attributed to the node the path leaves from, then the paths are
    /// walked backwards, in the base view and in the previous state so that nodes disconnected
    /// by the transaction are found too. Class nodes are never walked through.
    pub fn affected_targets<'a>(
        &self,
        connections: &'a ConnectionsGroup<'a>,
        paths: &[PropertyPath],
        reads_types: bool,
        lookback: usize,
    ) -> Result<Sorted<'a>, ShaclError> {
        if connections.is_base_empty() {
            return self.added_targets(connections);
        }
        if self.class_hierarchy_changed(connections)? {
            tracing::debug!("rdfs:subClassOf statements changed, validating all targets");
            return self.all_targets(connections);
        }
        let steps = directed_steps(paths);
        let mut watched = steps.clone();
        if reads_types {
            watched.push((rdf::TYPE.into_owned(), false));
        }
        let mut reached = FxHashSet::default();
        let mut frontier = Vec::new();
        for (predicate, inverse) in &watched {
            let pattern = StatementPattern::new().with_predicate(predicate.clone());
            for view in [StatementView::Added, StatementView::Removed] {
                for quad in connections.scan(view, &pattern)? {
                    let quad = quad?;
                    let origin = if *inverse {
                        quad.object
                    } else {
                        quad.subject.into()
                    };
                    if reached.insert(origin.clone()) {
                        frontier.push(origin);
                    }
                }
            }
        }
        for _ in 0..lookback {
            if frontier.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for node in frontier {
                for predecessor in predecessors(connections, &node, &steps)? {
                    if reached.insert(predecessor.clone()) {
                        next.push(predecessor);
                    }
                }
            }
            frontier = next;
        }
        let mut touched_targets = Vec::new();
        for node in reached {
            for target in &self.targets {
                if target.contains(connections, StatementView::Base, &node)? {
                    touched_targets.push(node);
                    break;
                }
            }
        }
        let roots = Sort::new(Box::new(Union::new(vec![
            self.root_targets(connections, StatementView::Added)?
                .into_inner(),
            ValuesBacked::new(touched_targets).into_inner(),
        ])))
        .unique();
        Ok(self.follow_segments(connections, roots))
    }

    fn class_hierarchy_changed(
        &self,
        connections: &ConnectionsGroup<'_>,
    ) -> Result<bool, ShaclError> {
        if !connections.settings().rdfs_sub_class_reasoning
            || !self.targets.iter().any(|t| matches!(t, Target::Class(_)))
        {
            return Ok(false);
        }
        let pattern = StatementPattern::new().with_predicate(rdfs::SUB_CLASS_OF);
        Ok(connections.has_statement(StatementView::Added, &pattern)?
            || connections.has_statement(StatementView::Removed, &pattern)?)
    }

    /// SPARQL graph pattern binding the chain of nodes, and the variable names from root to focus node.
    pub fn query_fragment(
        &self,
        connections: &ConnectionsGroup<'_>,
    ) -> Result<(String, Vec<String>), ShaclError> {
        let variables = (0..=self.segments.len())
            .map(|i| format!("a{i}"))
            .collect::<Vec<_>>();
        let mut fragment = String::new();
        for (i, target) in self.targets.iter().enumerate() {
            if i > 0 {
                fragment.push_str(" UNION ");
            }
            fragment.push_str("{ ");
            fragment.push_str(&target.query_fragment(connections, &variables[0])?);
            fragment.push_str(" }");
        }
        for (segment, vars) in self.segments.iter().zip(variables.windows(2)) {
            fragment.push(' ');
            fragment.push_str(&segment.query_fragment(&vars[0], &vars[1]));
        }
        Ok((fragment, variables))
    }
}

/// The predicates of `paths` with the direction they are followed in, `true` for inverse.
///
/// Paths that are not a predicate or an inverse predicate are followed both ways.
fn directed_steps(paths: &[PropertyPath]) -> Vec<(NamedNode, bool)> {
    let mut steps = Vec::new();
    for path in paths {
        let directed = match path.as_simple() {
            Some((predicate, inverse)) => vec![(predicate.clone(), inverse)],
            None => path
                .predicates()
                .into_iter()
                .flat_map(|predicate| [(predicate.clone(), false), (predicate, true)])
                .collect(),
        };
        for step in directed {
            if !steps.contains(&step) {
                steps.push(step);
            }
        }
    }
    steps
}

/// Nodes from which one of `steps` leads to `node`, in the base view or in the previous state.
fn predecessors(
    connections: &ConnectionsGroup<'_>,
    node: &Term,
    steps: &[(NamedNode, bool)],
) -> Result<Vec<Term>, ShaclError> {
    let mut predecessors = Vec::new();
    for view in [StatementView::Base, StatementView::PreviousState] {
        for (predicate, inverse) in steps {
            let pattern = StatementPattern::new().with_predicate(predicate.clone());
            if !inverse {
                for quad in connections.scan(view, &pattern.with_object(node.clone()))? {
                    predecessors.push(quad?.subject.into());
                }
            } else if !node.is_literal() {
                for quad in connections.scan(view, &pattern.with_subject(node.clone()))? {
                    predecessors.push(quad?.object);
                }
            }
        }
    }
    Ok(predecessors)
}
