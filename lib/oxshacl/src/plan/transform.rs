//! Tuple reshaping nodes and the node attaching violation records.

use super::{BoxedPlan, PlanNode};
use crate::constraint::SourceConstraintComponent;
use crate::error::ShaclError;
use crate::path::PropertyPath;
use crate::report::{Severity, ValidationResult};
use crate::shape::ShapeId;
use crate::tuple::ValidationTuple;

/// A structural rewrite applied to every tuple of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Drops the value.
    TrimToTarget,
    /// Drops the value and switches to node scope.
    ShiftToNodeShape,
    /// Reads the last chain element as the value of the previous one.
    ShiftToPropertyShape,
    /// Turns the active target into the value of its parent.
    TargetChainPopper,
    /// Turns the value into the active target.
    TargetChainPusher,
}

impl Transform {
    pub fn keeps_active_target(self) -> bool {
        matches!(self, Self::TrimToTarget | Self::ShiftToNodeShape)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TrimToTarget => "trim to target",
            Self::ShiftToNodeShape => "shift to node shape",
            Self::ShiftToPropertyShape => "shift to property shape",
            Self::TargetChainPopper => "target chain popper",
            Self::TargetChainPusher => "target chain pusher",
        }
    }

    pub fn apply(self, tuple: ValidationTuple) -> Result<ValidationTuple, ShaclError> {
        match self {
            Self::TrimToTarget => Ok(tuple.trim_to_target()),
            Self::ShiftToNodeShape => Ok(tuple.shift_to_node_shape()),
            Self::ShiftToPropertyShape => tuple.shift_to_property_shape(),
            Self::TargetChainPopper => tuple.pop_target_to_value(),
            Self::TargetChainPusher => tuple.push_value_as_target(),
        }
    }
}

pub struct TransformNode<'a> {
    parent: BoxedPlan<'a>,
    transform: Transform,
}

impl<'a> TransformNode<'a> {
    pub fn new(parent: BoxedPlan<'a>, transform: Transform) -> Self {
        Self { parent, transform }
    }
}

impl Iterator for TransformNode<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.parent.next()?.and_then(|t| self.transform.apply(t)))
    }
}

impl PlanNode for TransformNode<'_> {
    fn depth(&self) -> usize {
        self.parent.depth() + 1
    }
}

/// What a violation record of a constraint looks like.
#[derive(Debug, Clone)]
pub struct ResultTemplate {
    pub source_shape: ShapeId,
    pub component: SourceConstraintComponent,
    pub path: Option<PropertyPath>,
    pub severity: Severity,
    pub message: Option<String>,
}

impl ResultTemplate {
    /// The record for a violating tuple.
    ///
    /// The value is the property value if the tuple carries one.
    /// For node shapes, the value is the focus node itself.
    pub fn record(&self, tuple: &ValidationTuple) -> ValidationResult {
        let focus = tuple.active_target().clone();
        let value = match tuple.value() {
            Some(value) => Some(value.clone()),
            None if self.path.is_none() => Some(focus.clone()),
            None => None,
        };
        let mut result = ValidationResult::new(focus, self.source_shape.clone(), self.component)
            .with_severity(self.severity);
        if let Some(path) = &self.path {
            result = result.with_path(path.clone());
        }
        if let Some(value) = value {
            result = result.with_value(value);
        }
        if let Some(message) = &self.message {
            result = result.with_message(message.clone());
        }
        result
    }
}

/// Attaches a violation record to every tuple of its parent, nesting the records already attached as detail.
pub struct Reported<'a> {
    parent: BoxedPlan<'a>,
    template: ResultTemplate,
}

impl<'a> Reported<'a> {
    pub fn new(parent: BoxedPlan<'a>, template: ResultTemplate) -> Self {
        Self { parent, template }
    }
}

impl Iterator for Reported<'_> {
    type Item = Result<ValidationTuple, ShaclError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.parent.next()?.map(|mut tuple| {
            let record = self.template.record(&tuple);
            tuple.wrap_result(record);
            tuple
        }))
    }
}

impl PlanNode for Reported<'_> {
    fn depth(&self) -> usize {
        self.parent.depth() + 1
    }
}
