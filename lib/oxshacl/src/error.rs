//! Error types for shape loading and validation.

use crate::report::ValidationReport;
use oxrdf::{NamedNode, Term};
use std::error::Error;

/// Main error type of the validation engine.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShaclError {
    /// The shapes graph is malformed.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// A feature is not supported by the incremental engine.
    ///
    /// The engine refuses to build a plan instead of silently validating less than asked.
    #[error("Unsupported SHACL feature {feature}{}", .shape.as_ref().map(|s| format!(" in shape {s}")).unwrap_or_default())]
    Unsupported {
        feature: String,
        shape: Option<Term>,
    },

    /// A generated SPARQL query could not be parsed.
    #[error("Invalid generated SPARQL query ({message}):\n{query}")]
    QueryConstruction { query: String, message: String },

    /// Error from the underlying statement store.
    #[error(transparent)]
    Store(Box<dyn Error + Send + Sync>),

    /// The target chain grew beyond the supported depth.
    #[error("Maximum recursion depth ({depth}) exceeded while following nested shapes")]
    MaxRecursionDepth { depth: usize },

    /// A structural operation was applied to a tuple that does not support it.
    #[error("Invalid validation tuple operation: {message}")]
    InvalidTuple { message: String },

    /// The transaction does not conform to the loaded shapes.
    #[error(transparent)]
    Validation(#[from] ValidationFailed),
}

impl ShaclError {
    /// Builds an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>, shape: Option<Term>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
            shape,
        }
    }

    /// Builds a query construction error keeping the offending query text.
    pub fn query_construction(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::QueryConstruction {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Wraps a store error.
    pub fn store(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Store(error.into())
    }

    pub(crate) fn invalid_tuple(message: impl Into<String>) -> Self {
        Self::InvalidTuple {
            message: message.into(),
        }
    }

    /// Returns the validation report if this error is a validation failure.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::Validation(failure) => Some(failure.report()),
            _ => None,
        }
    }
}

/// Error raised while loading shapes from an RDF graph.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ShapeError {
    #[error("The shape {shape} is malformed: {message}")]
    InvalidShape { shape: Term, message: String },
    /// A single-valued property is set more than once.
    #[error("Property {property} is set more than once on shape {shape}")]
    DuplicateProperty { shape: Term, property: NamedNode },
    #[error("The shape {shape} has no {property} value")]
    MissingProperty { shape: Term, property: NamedNode },
    #[error("The {property} value of shape {shape} must be {expected}, found {actual}")]
    InvalidPropertyValue {
        shape: Term,
        property: NamedNode,
        expected: String,
        actual: Term,
    },
    /// An `rdf:first`/`rdf:rest` list is cyclic, branching or not terminated by `rdf:nil`.
    #[error("The shape {shape} contains a malformed RDF list: {message}")]
    InvalidRdfList { shape: Term, message: String },
    #[error("The sh:pattern {pattern:?} is not a valid regular expression: {message}")]
    InvalidRegex { pattern: String, message: String },
}

impl ShapeError {
    pub(crate) fn invalid_shape(shape: impl Into<Term>, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            shape: shape.into(),
            message: message.into(),
        }
    }

    pub(crate) fn duplicate_property(shape: impl Into<Term>, property: impl Into<NamedNode>) -> Self {
        Self::DuplicateProperty {
            shape: shape.into(),
            property: property.into(),
        }
    }

    pub(crate) fn missing_property(shape: impl Into<Term>, property: impl Into<NamedNode>) -> Self {
        Self::MissingProperty {
            shape: shape.into(),
            property: property.into(),
        }
    }

    pub(crate) fn invalid_property_value(
        shape: impl Into<Term>,
        property: impl Into<NamedNode>,
        expected: impl Into<String>,
        actual: impl Into<Term>,
    ) -> Self {
        Self::InvalidPropertyValue {
            shape: shape.into(),
            property: property.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn invalid_rdf_list(shape: impl Into<Term>, message: impl Into<String>) -> Self {
        Self::InvalidRdfList {
            shape: shape.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid_regex(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            message: message.into(),
        }
    }
}

/// A transaction was rejected because the resulting data does not conform to the shapes.
#[derive(Debug, thiserror::Error)]
#[error("The transaction violates {} SHACL constraint(s)", .report.violation_count())]
pub struct ValidationFailed {
    report: ValidationReport,
}

impl ValidationFailed {
    pub(crate) fn new(report: ValidationReport) -> Self {
        Self { report }
    }

    /// The non-conforming report.
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    /// Takes the non-conforming report.
    pub fn into_report(self) -> ValidationReport {
        self.report
    }
}
