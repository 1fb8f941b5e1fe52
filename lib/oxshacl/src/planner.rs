//! Turns shapes into validation plans.
//!
//! Validation is split in [`Shard`]s: one per constraint component of every shape reachable from
//! a root shape through `sh:property`. The focus nodes of a shard are described by a
//! [`TargetChain`] from the root targets.
//!
//! A transactional plan only looks at the focus nodes whose status may have changed:
//! - value constraints of root shapes only check the values added by the transaction,
//! - other constraints are re-derived on the affected focus nodes, found by walking back from
//!   the nodes touched by the transaction.
//!
//! Logical constraints evaluate their child shapes lazily, when the plan is iterated, on the
//! focus nodes reaching them. Recursive shapes are hence only unfolded as deep as the data goes.

use crate::connections::{ConnectionsGroup, StatementPattern, StatementView};
use crate::constraint::{ConstraintComponent, ValidationApproach};
use crate::error::ShaclError;
use crate::path::PropertyPath;
use crate::plan::{
    BoxedPlan, BulkedExternalJoin, CachedPlan, DatatypeFilter, EmptyPlan,
    ExternalPredicateObjectFilter, ExternalTargetFilter, FilterNode, GroupByFilter,
    GroupCondition, InFilter, InnerJoin, JoinKind, LanguageInFilter, LengthFilter,
    NodeKindFilter, PatternFilter, PlanNode, RangeBound, RangeFilter, Reported, ResultTemplate,
    Select, Sort, Sorted, Transform, TransformNode, TupleFilter, Union,
};
use crate::report::ValidationResult;
use crate::settings::ApproachOverride;
use crate::shape::{Shape, ShapeIndex, Shapes};
use crate::sparql;
use crate::target::Target;
use crate::target_chain::TargetChain;
use crate::tuple::ValidationTuple;
use oxrdf::vocab::{rdf, rdfs};
use oxrdf::Term;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Maximal number of nested shape evaluations, and of paths in a target chain.
pub const MAX_RECURSION_DEPTH: usize = 50;

/// A constraint component of a shape, with the focus nodes it applies to.
#[derive(Debug, Clone)]
pub struct Shard {
    root: ShapeIndex,
    shape: ShapeIndex,
    chain: TargetChain,
    component: usize,
}

impl Shard {
    /// The root shape whose targets select the focus nodes.
    pub fn root(&self) -> ShapeIndex {
        self.root
    }

    pub fn shape(&self) -> ShapeIndex {
        self.shape
    }

    pub fn chain(&self) -> &TargetChain {
        &self.chain
    }

    /// Position of the component in the shape.
    pub fn component(&self) -> usize {
        self.component
    }
}

/// All the shards of the shapes, in a deterministic order.
pub fn shards(shapes: &Shapes) -> Result<Vec<Shard>, ShaclError> {
    let mut shards = Vec::new();
    for &root in shapes.roots() {
        let chain = TargetChain::new(shapes.shape(root).targets.clone());
        collect_shards(shapes, root, root, chain, &mut shards)?;
    }
    Ok(shards)
}

fn collect_shards(
    shapes: &Shapes,
    root: ShapeIndex,
    index: ShapeIndex,
    chain: TargetChain,
    shards: &mut Vec<Shard>,
) -> Result<(), ShaclError> {
    if chain.segments().len() > MAX_RECURSION_DEPTH {
        return Err(ShaclError::MaxRecursionDepth {
            depth: MAX_RECURSION_DEPTH,
        });
    }
    let shape = shapes.shape(index);
    if shape.deactivated {
        return Ok(());
    }
    for component in 0..shape.components.len() {
        shards.push(Shard {
            root,
            shape: index,
            chain: chain.clone(),
            component,
        });
    }
    let chain = match shape.path() {
        Some(path) => chain.extend(path.clone()),
        None => chain,
    };
    for &property in &shape.properties {
        collect_shards(shapes, root, property, chain.clone(), shards)?;
    }
    Ok(())
}

/// Builds the plans of the shards of one validation run.
#[derive(Clone, Copy)]
pub struct Planner<'a> {
    shapes: &'a Shapes,
    connections: &'a ConnectionsGroup<'a>,
}

impl<'a> Planner<'a> {
    pub fn new(shapes: &'a Shapes, connections: &'a ConnectionsGroup<'a>) -> Self {
        Self {
            shapes,
            connections,
        }
    }

    /// The approach used to validate a shard.
    pub fn approach(self, shard: &Shard) -> ValidationApproach {
        let component = self.component(shard);
        if !component.supports_sparql() {
            return ValidationApproach::Transactional;
        }
        match self.connections.settings().approach {
            ApproachOverride::Auto => self.preferred_approach(component, &mut Vec::new()),
            ApproachOverride::Transactional => ValidationApproach::Transactional,
            ApproachOverride::SparqlBased => ValidationApproach::SparqlBased,
        }
    }

    /// Logical constraints prefer what all the constraints of their children prefer.
    fn preferred_approach(
        self,
        component: &ConstraintComponent,
        stack: &mut Vec<ShapeIndex>,
    ) -> ValidationApproach {
        if !component.is_composite() {
            return component.preferred_approach();
        }
        let mut approaches = vec![ValidationApproach::Transactional];
        for &child in component.child_shapes() {
            if stack.contains(&child) {
                continue;
            }
            stack.push(child);
            for child_component in &self.shapes.shape(child).components {
                approaches.push(self.preferred_approach(child_component, stack));
            }
            stack.pop();
        }
        ValidationApproach::reduce(approaches)
    }

    /// The violations introduced by the transaction.
    pub fn transactional_plan(self, shard: &Shard) -> Result<BoxedPlan<'a>, ShaclError> {
        let shape = self.shapes.shape(shard.shape);
        let component = self.component(shard);
        if self.approach(shard) == ValidationApproach::SparqlBased {
            if let Some(plan) = self.sparql_plan(shard)? {
                return Ok(plan);
            }
        }
        // The added targets miss the nodes whose class became a target class
        if shard.chain.is_root()
            && !(has_class_targets(&shard.chain) && self.class_hierarchy_changed()?)
        {
            if let Some(plan) = self.direct_incremental_plan(shard)? {
                return Ok(plan);
            }
        }
        let focus = self.affected_focus(shard)?;
        self.component_violations(shape, component, focus, shard.chain.segments().len())
    }

    /// All the violations of the data.
    pub fn full_plan(self, shard: &Shard) -> Result<BoxedPlan<'a>, ShaclError> {
        let shape = self.shapes.shape(shard.shape);
        let component = self.component(shard);
        if self.connections.settings().approach != ApproachOverride::Transactional {
            if let Some(plan) = self.sparql_plan(shard)? {
                return Ok(plan);
            }
        }
        let focus = shard.chain.all_targets(self.connections)?;
        self.component_violations(shape, component, focus, shard.chain.segments().len())
    }

    fn component(self, shard: &Shard) -> &'a ConstraintComponent {
        &self.shapes.shape(shard.shape).components[shard.component]
    }

    /// One query validating the component on all the focus nodes.
    ///
    /// Returns `None` if the component can't be expressed as a query.
    fn sparql_plan(self, shard: &Shard) -> Result<Option<BoxedPlan<'a>>, ShaclError> {
        let shape = self.shapes.shape(shard.shape);
        let component = self.component(shard);
        let query =
            match sparql::violation_query(self.connections, shape, component, &shard.chain) {
                Ok(Some(query)) => query,
                Ok(None) => return Ok(None),
                Err(ShaclError::Unsupported { feature, .. }) => {
                    tracing::debug!(%feature, "no SPARQL query for the constraint, using a plan");
                    return Ok(None);
                }
                Err(error) => return Err(error),
            };
        let select = Select::new(
            self.connections,
            StatementView::Base,
            &query.text,
            query.variables,
            query.with_value,
        )?;
        Ok(Some(self.reported(shape, component, Box::new(select))))
    }

    /// Checks the values added by the transaction against a value constraint of a root shape.
    ///
    /// The values are the ones of the new targets, plus the new values of the existing targets.
    fn direct_incremental_plan(self, shard: &Shard) -> Result<Option<BoxedPlan<'a>>, ShaclError> {
        let shape = self.shapes.shape(shard.shape);
        let component = self.component(shard);
        let Some(filter) = value_filter(component) else {
            return Ok(None);
        };
        let connections = self.connections;
        let added_targets = shard.chain.added_targets(connections)?;
        let values = match shape.path() {
            None => added_targets,
            Some(path) => {
                let added_values = path.scan_plan(connections, StatementView::Added)?;
                if connections.is_base_empty() {
                    InnerJoin::new(added_targets, added_values).joined()
                } else {
                    let targets = &self.shapes.shape(shard.root).targets;
                    let new_values_of_existing_targets =
                        InnerJoin::new(shard.chain.added_targets(connections)?, added_values)
                            .discarded_right()
                            .filter(
                                ExternalTargetFilter::new(
                                    connections,
                                    StatementView::Base,
                                    targets,
                                ),
                                true,
                            );
                    let values_of_new_targets = BulkedExternalJoin::new(
                        added_targets,
                        connections,
                        StatementView::Base,
                        path.clone(),
                        JoinKind::Inner,
                    )
                    .joined();
                    Sort::new(Box::new(Union::new(vec![
                        values_of_new_targets.into_inner(),
                        new_values_of_existing_targets.into_inner(),
                    ])))
                    .unique()
                }
            }
        };
        let violations = FilterNode::new(values.into_inner(), filter).false_node();
        Ok(Some(self.reported(shape, component, Box::new(violations))))
    }

    /// The focus nodes of the shard whose validation result may have changed.
    fn affected_focus(self, shard: &Shard) -> Result<Sorted<'a>, ShaclError> {
        let shape = self.shapes.shape(shard.shape);
        let component = self.component(shard);
        let mut footprint = Footprint::default();
        footprint.add(shard.chain.segments());
        let Some(reach) =
            self.component_reach(shape, component, &mut footprint, &mut vec![shard.shape])
        else {
            tracing::debug!(shape = %shape.id, "recursive shape, validating all the targets");
            return shard.chain.all_targets(self.connections);
        };
        if footprint.uses_classes && self.class_hierarchy_changed()? {
            tracing::debug!(shape = %shape.id, "class hierarchy changed, validating all the targets");
            return shard.chain.all_targets(self.connections);
        }
        shard.chain.affected_targets(
            self.connections,
            &footprint.paths,
            footprint.uses_classes,
            shard.chain.segments().len() + reach,
        )
    }

    fn class_hierarchy_changed(self) -> Result<bool, ShaclError> {
        if !self.connections.settings().rdfs_sub_class_reasoning {
            return Ok(false);
        }
        let pattern = StatementPattern::new().with_predicate(rdfs::SUB_CLASS_OF);
        Ok(self
            .connections
            .has_statement(StatementView::Added, &pattern)?
            || self
                .connections
                .has_statement(StatementView::Removed, &pattern)?)
    }

    /// Number of statements between the focus node of `shape` and the furthest node `component` looks at.
    ///
    /// Returns `None` for recursive shapes.
    fn component_reach(
        self,
        shape: &Shape,
        component: &ConstraintComponent,
        footprint: &mut Footprint,
        stack: &mut Vec<ShapeIndex>,
    ) -> Option<usize> {
        if let Some(path) = shape.path() {
            footprint.add([path]);
        }
        let mut nested = 0;
        match component {
            ConstraintComponent::Class(_) => footprint.uses_classes = true,
            _ => {
                for &child in component.child_shapes() {
                    nested = nested.max(self.shape_reach(child, footprint, stack)?);
                }
            }
        }
        Some(usize::from(shape.is_property_shape()) + nested)
    }

    fn shape_reach(
        self,
        index: ShapeIndex,
        footprint: &mut Footprint,
        stack: &mut Vec<ShapeIndex>,
    ) -> Option<usize> {
        if stack.contains(&index) {
            return None;
        }
        stack.push(index);
        let shape = self.shapes.shape(index);
        let mut reach = 0;
        for component in &shape.components {
            reach = reach.max(self.component_reach(shape, component, footprint, stack)?);
        }
        let own = usize::from(shape.is_property_shape());
        for &property in &shape.properties {
            reach = reach.max(own + self.shape_reach(property, footprint, stack)?);
        }
        stack.pop();
        Some(reach)
    }

    /// The values a component of `shape` looks at: the focus nodes of a node shape,
    /// the path values of a property shape.
    fn values(self, shape: &Shape, focus: Sorted<'a>, kind: JoinKind) -> Sorted<'a> {
        match shape.path() {
            None => focus,
            Some(path) => BulkedExternalJoin::new(
                focus,
                self.connections,
                StatementView::Base,
                path.clone(),
                kind,
            )
            .joined(),
        }
    }

    /// The violations of a component in the base view for the given focus nodes.
    fn component_violations(
        self,
        shape: &'a Shape,
        component: &'a ConstraintComponent,
        focus: Sorted<'a>,
        depth: usize,
    ) -> Result<BoxedPlan<'a>, ShaclError> {
        if shape.deactivated {
            return Ok(Box::new(EmptyPlan));
        }
        if let Some(filter) = value_filter(component) {
            let violations = self.values(shape, focus, JoinKind::Inner).filter(filter, false);
            return Ok(self.reported(shape, component, violations.into_inner()));
        }
        let connections = self.connections;
        let violations: BoxedPlan<'a> = match component {
            ConstraintComponent::Class(class) => {
                let classes = connections
                    .backwards_chain(class)?
                    .into_iter()
                    .map(Term::from);
                self.values(shape, focus, JoinKind::Inner)
                    .filter(
                        ExternalPredicateObjectFilter::new(
                            connections,
                            StatementView::Base,
                            rdf::TYPE.into_owned(),
                            classes,
                        ),
                        false,
                    )
                    .into_inner()
            }
            ConstraintComponent::MinCount(0) => Box::new(EmptyPlan),
            ConstraintComponent::MinCount(min) => GroupByFilter::new(
                self.values(shape, focus, JoinKind::LeftOuter),
                GroupCondition::CountBelow(*min),
            )
            .into_inner(),
            ConstraintComponent::MaxCount(max) => GroupByFilter::new(
                self.values(shape, focus, JoinKind::Inner),
                GroupCondition::CountAbove(*max),
            )
            .into_inner(),
            ConstraintComponent::UniqueLang => GroupByFilter::new(
                self.values(shape, focus, JoinKind::Inner),
                GroupCondition::DuplicateLanguage,
            )
            .into_inner(),
            ConstraintComponent::HasValue(value) => {
                if shape.is_property_shape() {
                    GroupByFilter::new(
                        self.values(shape, focus, JoinKind::LeftOuter),
                        GroupCondition::Missing(value.clone()),
                    )
                    .into_inner()
                } else {
                    focus
                        .filter(InFilter::new([value.clone()]), false)
                        .into_inner()
                }
            }
            ConstraintComponent::Not(child) => {
                let values = self.values(shape, focus, JoinKind::Inner);
                match self.simple_filter(*child) {
                    // The child conforms exactly when its only filter matches.
                    Some(filter) => values.filter(filter, true).into_inner(),
                    None => Box::new(CompositeNode::new(self, shape, component, values, depth)),
                }
            }
            ConstraintComponent::And(_)
            | ConstraintComponent::Or(_)
            | ConstraintComponent::Xone(_)
            | ConstraintComponent::Node(_) => Box::new(CompositeNode::new(
                self,
                shape,
                component,
                self.values(shape, focus, JoinKind::Inner),
                depth,
            )),
            _ => {
                return Err(ShaclError::unsupported(
                    component.source_constraint_component().to_string(),
                    Some(shape.id.to_term()),
                ));
            }
        };
        Ok(self.reported(shape, component, violations))
    }

    /// The filter of a node shape made of a single value constraint.
    fn simple_filter(self, index: ShapeIndex) -> Option<Box<dyn TupleFilter>> {
        let shape = self.shapes.shape(index);
        if shape.deactivated || shape.is_property_shape() || !shape.properties.is_empty() {
            return None;
        }
        match shape.components.as_slice() {
            [component] => value_filter(component),
            _ => None,
        }
    }

    /// All the violations of a shape for the given focus nodes, its property shapes included.
    fn shape_violations(
        self,
        index: ShapeIndex,
        focus: Sorted<'a>,
        depth: usize,
    ) -> Result<BoxedPlan<'a>, ShaclError> {
        if depth > MAX_RECURSION_DEPTH {
            return Err(ShaclError::MaxRecursionDepth {
                depth: MAX_RECURSION_DEPTH,
            });
        }
        let shape = self.shapes.shape(index);
        if shape.deactivated {
            return Ok(Box::new(EmptyPlan));
        }
        let focus = focus.collect::<Result<Arc<[_]>, _>>()?;
        if focus.is_empty() {
            return Ok(Box::new(EmptyPlan));
        }
        let replay = || Sorted::assume_sorted(Box::new(CachedPlan::new(Arc::clone(&focus))));
        let mut plans = Vec::with_capacity(shape.components.len() + shape.properties.len());
        for component in &shape.components {
            plans.push(self.component_violations(shape, component, replay(), depth)?);
        }
        for &property in &shape.properties {
            let property_focus = match shape.path() {
                None => replay(),
                Some(path) => Sort::new(Box::new(TransformNode::new(
                    BulkedExternalJoin::new(
                        replay(),
                        self.connections,
                        StatementView::Base,
                        path.clone(),
                        JoinKind::Inner,
                    )
                    .joined()
                    .into_inner(),
                    Transform::TargetChainPusher,
                )))
                .unique(),
            };
            plans.push(Box::new(Deferred::new(Box::new(move || {
                self.shape_violations(property, property_focus, depth + 1)
            }))));
        }
        Ok(Box::new(Union::new(plans)))
    }

    fn reported(
        self,
        shape: &Shape,
        component: &ConstraintComponent,
        violations: BoxedPlan<'a>,
    ) -> BoxedPlan<'a> {
        let template = ResultTemplate {
            source_shape: shape.id.clone(),
            component: component.source_constraint_component(),
            path: shape.path().cloned(),
            severity: shape.severity,
            message: shape.message.clone(),
        };
        self.connections
            .logged(Box::new(Reported::new(violations, template)), "violations")
    }
}

/// The per-value filter of a value constraint.
fn value_filter(component: &ConstraintComponent) -> Option<Box<dyn TupleFilter>> {
    Some(match component {
        ConstraintComponent::Datatype(datatype) => Box::new(DatatypeFilter::new(datatype.clone())),
        ConstraintComponent::NodeKind(kind) => Box::new(NodeKindFilter::new(*kind)),
        ConstraintComponent::MinExclusive(bound) => Box::new(RangeFilter::new(
            RangeBound::MinExclusive,
            bound.clone().into(),
        )),
        ConstraintComponent::MaxExclusive(bound) => Box::new(RangeFilter::new(
            RangeBound::MaxExclusive,
            bound.clone().into(),
        )),
        ConstraintComponent::MinInclusive(bound) => Box::new(RangeFilter::new(
            RangeBound::MinInclusive,
            bound.clone().into(),
        )),
        ConstraintComponent::MaxInclusive(bound) => Box::new(RangeFilter::new(
            RangeBound::MaxInclusive,
            bound.clone().into(),
        )),
        ConstraintComponent::MinLength(bound) => Box::new(LengthFilter::min(*bound)),
        ConstraintComponent::MaxLength(bound) => Box::new(LengthFilter::max(*bound)),
        ConstraintComponent::Pattern { regex, .. } => Box::new(PatternFilter::new(regex.clone())),
        ConstraintComponent::LanguageIn(ranges) => Box::new(LanguageInFilter::new(ranges.clone())),
        ConstraintComponent::In(values) => Box::new(InFilter::new(values.iter().cloned())),
        _ => return None,
    })
}

fn has_class_targets(chain: &TargetChain) -> bool {
    chain
        .targets()
        .iter()
        .any(|target| matches!(target, Target::Class(_)))
}

/// What the focus nodes of a shard depend on.
#[derive(Default)]
struct Footprint {
    /// Paths followed from the root targets.
    paths: Vec<PropertyPath>,
    /// The `rdf:type` of reached nodes is read.
    uses_classes: bool,
}

impl Footprint {
    fn add<'p>(&mut self, paths: impl IntoIterator<Item = &'p PropertyPath>) {
        for path in paths {
            if !self.paths.contains(path) {
                self.paths.push(path.clone());
            }
        }
    }
}

type PlanBuilder<'a> = Box<dyn FnOnce() -> Result<BoxedPlan<'a>, ShaclError> + 'a>;

/// A plan only built when first pulled.
struct Deferred<'a> {
    build: Option<PlanBuilder<'a>>,
    plan: Option<BoxedPlan<'a>>,
}

impl<'a> Deferred<'a> {
    fn new(build: PlanBuilder<'a>) -> Self {
        Self {
            build: Some(build),
            plan: None,
        }
    }
}

impl Iterator for Deferred<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(build) = self.build.take() {
            match build() {
                Ok(plan) => self.plan = Some(plan),
                Err(error) => return Some(Err(error)),
            }
        }
        self.plan.as_mut()?.next()
    }
}

impl PlanNode for Deferred<'_> {
    fn depth(&self) -> usize {
        self.plan.as_ref().map_or(1, |plan| plan.depth() + 1)
    }
}

/// `sh:and`, `sh:or`, `sh:not`, `sh:xone` and `sh:node`.
///
/// On first pull, the child shapes are validated on the values of the input and each value is
/// checked against the number of children it conforms to. The records of the failing children
/// are attached to the emitted tuples, to become the detail of the violation.
struct CompositeNode<'a> {
    planner: Planner<'a>,
    shape: &'a Shape,
    component: &'a ConstraintComponent,
    values: Option<Sorted<'a>>,
    depth: usize,
    output: std::vec::IntoIter<ValidationTuple>,
}

impl<'a> CompositeNode<'a> {
    fn new(
        planner: Planner<'a>,
        shape: &'a Shape,
        component: &'a ConstraintComponent,
        values: Sorted<'a>,
        depth: usize,
    ) -> Self {
        Self {
            planner,
            shape,
            component,
            values: Some(values),
            depth,
            output: Vec::new().into_iter(),
        }
    }

    fn evaluate(&self, values: Sorted<'a>) -> Result<Vec<ValidationTuple>, ShaclError> {
        let values = values.collect::<Result<Vec<_>, _>>()?;
        if values.is_empty() {
            return Ok(Vec::new());
        }
        // The children validate the values of a property shape, and the focus node of a node shape.
        let mut focus = values
            .iter()
            .map(|value| {
                if value.has_value() {
                    value.clone().push_value_as_target()
                } else {
                    Ok(value.clone())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        focus.sort_by(|a, b| {
            a.cmp_active_target(b)
                .then_with(|| a.cmp_full_target(b))
        });
        focus.dedup();
        let key_length = focus.first().map_or(0, |tuple| tuple.chain().len());
        let focus = Arc::<[ValidationTuple]>::from(focus);

        let children = self.component.child_shapes();
        let mut failures = Vec::with_capacity(children.len());
        for &child in children {
            let plan = self.planner.shape_violations(
                child,
                Sorted::assume_sorted(Box::new(CachedPlan::new(Arc::clone(&focus)))),
                self.depth + 1,
            )?;
            let mut failing = FxHashMap::<Vec<Term>, Vec<ValidationResult>>::default();
            for tuple in plan {
                let tuple = tuple?;
                let key = tuple.chain().iter().take(key_length).cloned().collect();
                failing.entry(key).or_default().extend(tuple.into_results());
            }
            failures.push(failing);
        }

        let mut violations = Vec::new();
        for value in values {
            let failed = failures
                .iter()
                .filter_map(|failing| failing.get(value.chain()))
                .collect::<Vec<_>>();
            let violated = match self.component {
                ConstraintComponent::And(_) | ConstraintComponent::Node(_) => !failed.is_empty(),
                ConstraintComponent::Or(_) => failed.len() == children.len(),
                ConstraintComponent::Xone(_) => children.len() - failed.len() != 1,
                ConstraintComponent::Not(_) => failed.is_empty(),
                _ => false,
            };
            if violated {
                let mut tuple = value;
                for results in failed {
                    tuple.extend_results(results.iter().cloned());
                }
                violations.push(tuple);
            }
        }
        tracing::trace!(
            shape = %self.shape.id,
            component = %self.component.source_constraint_component(),
            violations = violations.len(),
            "evaluated logical constraint"
        );
        Ok(violations)
    }
}

impl Iterator for CompositeNode<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(values) = self.values.take() {
            match self.evaluate(values) {
                Ok(violations) => self.output = violations.into_iter(),
                Err(error) => return Some(Err(error)),
            }
        }
        self.output.next().map(Ok)
    }
}

impl PlanNode for CompositeNode<'_> {
    fn depth(&self) -> usize {
        self.values.as_ref().map_or(1, |values| values.depth() + 1)
    }
}
