//! Validation reports.
//!
//! A report collects the violation records carried by the tuples that reach the end of a validation plan.
//! [`ValidationReport::to_graph`] writes it with the `sh:ValidationReport` vocabulary.

use crate::constraint::SourceConstraintComponent;
use crate::path::PropertyPath;
use crate::shape::ShapeId;
use crate::vocab::sh;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Graph, Literal, NamedNodeRef, Term, Triple};
use std::fmt;

/// The `sh:severity` of a shape, copied to the results it produces.
///
/// Only [`Severity::Violation`] makes a report non-conforming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    #[default]
    Violation,
    Warning,
    Info,
}

impl Severity {
    const ALL: [Self; 3] = [Self::Violation, Self::Warning, Self::Info];

    /// The `sh:Violation`, `sh:Warning` or `sh:Info` IRI.
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::Violation => sh::VIOLATION,
            Self::Warning => sh::WARNING,
            Self::Info => sh::INFO,
        }
    }

    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        Self::ALL.into_iter().find(|severity| severity.iri() == iri)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Violation => "Violation",
            Self::Warning => "Warning",
            Self::Info => "Info",
        })
    }
}

/// One `sh:ValidationResult`.
///
/// Results of `sh:or`, `sh:xone` or `sh:node` constraints keep the results of their operands in [`detail`](Self::detail).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationResult {
    pub focus_node: Term,
    /// Set for results of property shapes.
    pub result_path: Option<PropertyPath>,
    /// The value node that failed the constraint, if the constraint is about a single value.
    pub value: Option<Term>,
    pub source_shape: ShapeId,
    pub source_constraint_component: SourceConstraintComponent,
    /// The `sh:message` of the source shape.
    pub result_message: Option<String>,
    pub result_severity: Severity,
    pub detail: Vec<ValidationResult>,
}

impl ValidationResult {
    pub fn new(
        focus_node: Term,
        source_shape: ShapeId,
        source_constraint_component: SourceConstraintComponent,
    ) -> Self {
        Self {
            focus_node,
            result_path: None,
            value: None,
            source_shape,
            source_constraint_component,
            result_message: None,
            result_severity: Severity::default(),
            detail: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_path(self, path: PropertyPath) -> Self {
        Self {
            result_path: Some(path),
            ..self
        }
    }

    #[must_use]
    pub fn with_value(self, value: Term) -> Self {
        Self {
            value: Some(value),
            ..self
        }
    }

    #[must_use]
    pub fn with_message(self, message: impl Into<String>) -> Self {
        Self {
            result_message: Some(message.into()),
            ..self
        }
    }

    #[must_use]
    pub fn with_severity(self, result_severity: Severity) -> Self {
        Self {
            result_severity,
            ..self
        }
    }

    /// Writes the result and its detail into `graph` and returns the result node.
    fn write(&self, graph: &mut Graph) -> BlankNode {
        let node = BlankNode::default();
        let mut objects: Vec<(NamedNodeRef<'static>, Term)> = vec![
            (rdf::TYPE, sh::VALIDATION_RESULT.into()),
            (sh::FOCUS_NODE, self.focus_node.clone()),
            (sh::SOURCE_SHAPE, self.source_shape.to_term()),
            (
                sh::SOURCE_CONSTRAINT_COMPONENT,
                self.source_constraint_component.iri().into(),
            ),
            (sh::RESULT_SEVERITY, self.result_severity.iri().into()),
        ];
        if let Some(path) = &self.result_path {
            objects.push((sh::RESULT_PATH, path.write_to_graph(graph)));
        }
        if let Some(value) = &self.value {
            objects.push((sh::VALUE, value.clone()));
        }
        if let Some(message) = &self.result_message {
            objects.push((sh::RESULT_MESSAGE, Literal::from(message.as_str()).into()));
        }
        for detail in &self.detail {
            objects.push((sh::DETAIL, detail.write(graph).into()));
        }
        for (predicate, object) in objects {
            graph.insert(&Triple::new(node.clone(), predicate, object));
        }
        node
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} from {}",
            self.source_constraint_component, self.focus_node, self.source_shape
        )?;
        if let Some(path) = &self.result_path {
            write!(f, " path {path}")?;
        }
        if let Some(value) = &self.value {
            write!(f, " value {value}")?;
        }
        Ok(())
    }
}

/// The outcome of a validation.
///
/// In transactional mode it only holds the results introduced by the transaction.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// No result has the [`Severity::Violation`] severity.
    pub fn conforms(&self) -> bool {
        self.violation_count() == 0
    }

    pub fn results(&self) -> &[ValidationResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.results
            .iter()
            .filter(|result| result.result_severity == severity)
            .count()
    }

    pub fn violation_count(&self) -> usize {
        self.count(Severity::Violation)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn add_result(&mut self, result: ValidationResult) {
        self.results.push(result);
    }

    /// Builds the `sh:ValidationReport` graph, one blank node per result.
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new();
        let report = BlankNode::default();
        graph.insert(&Triple::new(
            report.clone(),
            rdf::TYPE,
            sh::VALIDATION_REPORT,
        ));
        graph.insert(&Triple::new(
            report.clone(),
            sh::CONFORMS,
            Literal::new_typed_literal(self.conforms().to_string(), xsd::BOOLEAN),
        ));
        for result in &self.results {
            let node = result.write(&mut graph);
            graph.insert(&Triple::new(report.clone(), sh::RESULT, node));
        }
        graph
    }
}

impl FromIterator<ValidationResult> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = ValidationResult>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}
