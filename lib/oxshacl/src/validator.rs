//! Validation of transactions against loaded shapes.

use crate::connections::{ConnectionsGroup, StatementSource};
use crate::error::{ShaclError, ValidationFailed};
use crate::plan::PlanNode;
use crate::planner::{self, Planner, Shard};
use crate::report::{ValidationReport, ValidationResult};
use crate::settings::ValidationSettings;
use crate::shape::Shapes;
use oxrdf::Graph;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Only the violations the transaction may have introduced.
    Transactional,
    /// All the violations of the data.
    Full,
}

/// Validates the transactions of a store against a set of shapes.
///
/// ```
/// use oxrdf::{Graph, GraphName, Literal, NamedNode, Quad, Triple};
/// use oxrdfio::{RdfFormat, RdfParser};
/// use oxshacl::{MemoryStore, ShaclValidator};
///
/// let shapes = RdfParser::from_format(RdfFormat::Turtle)
///     .for_slice(
///         br#"@prefix sh: <http://www.w3.org/ns/shacl#> .
///         @prefix ex: <http://example.com/> .
///         ex:S a sh:NodeShape ; sh:targetSubjectsOf ex:age ;
///             sh:property [ sh:path ex:age ; sh:maxCount 1 ] ."#,
///     )
///     .map(|q| q.map(Triple::from))
///     .collect::<Result<Graph, _>>()?;
/// let validator = ShaclValidator::from_graph(&shapes)?;
///
/// let mut store = MemoryStore::new();
/// let alice = NamedNode::new("http://example.com/alice")?;
/// let age = NamedNode::new("http://example.com/age")?;
/// let mut transaction = store.transaction();
/// transaction.insert(Quad::new(alice.clone(), age.clone(), Literal::from(30), GraphName::DefaultGraph));
/// transaction.insert(Quad::new(alice, age, Literal::from(31), GraphName::DefaultGraph));
/// let error = transaction.commit(&validator).unwrap_err();
/// assert_eq!(error.validation_report().map(|r| r.violation_count()), Some(1));
/// assert!(store.is_empty());
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone)]
pub struct ShaclValidator {
    shapes: Shapes,
    settings: ValidationSettings,
}

impl ShaclValidator {
    pub fn new(shapes: Shapes) -> Self {
        Self {
            shapes,
            settings: ValidationSettings::default(),
        }
    }

    /// Loads the shapes of a shapes graph.
    pub fn from_graph(shapes_graph: &Graph) -> Result<Self, ShaclError> {
        Ok(Self::new(Shapes::from_graph(shapes_graph)?))
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ValidationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn shapes(&self) -> &Shapes {
        &self.shapes
    }

    pub fn settings(&self) -> &ValidationSettings {
        &self.settings
    }

    /// The violations introduced by the changes of a transaction.
    ///
    /// Violations already in the data before the transaction and not related to its changes
    /// are not reported.
    pub fn validate_transaction(
        &self,
        source: &dyn StatementSource,
    ) -> Result<ValidationReport, ShaclError> {
        if !source.has_added() && !source.has_removed() {
            return Ok(ValidationReport::new());
        }
        self.run(source, Mode::Transactional)
    }

    /// All the violations of the state the transaction would commit.
    pub fn validate_full(&self, source: &dyn StatementSource) -> Result<ValidationReport, ShaclError> {
        self.run(source, Mode::Full)
    }

    /// Validates a transaction about to be committed.
    ///
    /// Fails with [`ShaclError::Validation`] if it introduces a violation.
    /// Always succeeds with an empty report if validation is disabled.
    pub fn validate_commit(
        &self,
        source: &dyn StatementSource,
    ) -> Result<ValidationReport, ShaclError> {
        if !self.settings.validation_enabled {
            return Ok(ValidationReport::new());
        }
        let report = self.validate_transaction(source)?;
        if report.conforms() {
            Ok(report)
        } else {
            Err(ValidationFailed::new(report).into())
        }
    }

    fn run(&self, source: &dyn StatementSource, mode: Mode) -> Result<ValidationReport, ShaclError> {
        let start = Instant::now();
        let connections = ConnectionsGroup::new(source, &self.settings);
        let planner = Planner::new(&self.shapes, &connections);
        let shards = planner::shards(&self.shapes)?;
        let results = if self.settings.parallel_validation
            && source.supports_concurrent_reads()
            && shards.len() > 1
        {
            shards
                .par_iter()
                .map(|shard| self.run_shard(planner, shard, mode))
                .collect::<Vec<_>>()
        } else {
            shards
                .iter()
                .map(|shard| self.run_shard(planner, shard, mode))
                .collect::<Vec<_>>()
        };
        let mut report = ValidationReport::new();
        let mut reported = FxHashSet::default();
        for shard_results in results {
            for result in shard_results? {
                if !reported.insert(result.clone()) {
                    continue;
                }
                if self.settings.log_validation_violations {
                    tracing::warn!(
                        focus_node = %result.focus_node,
                        shape = %result.source_shape,
                        component = %result.source_constraint_component,
                        severity = %result.result_severity,
                        "{result}"
                    );
                }
                report.add_result(result);
            }
        }
        if self.settings.performance_logging {
            tracing::info!(
                transactional = mode == Mode::Transactional,
                shards = shards.len(),
                results = report.results().len(),
                conforms = report.conforms(),
                elapsed = ?start.elapsed(),
                "validated"
            );
        }
        Ok(report)
    }

    fn run_shard(
        &self,
        planner: Planner<'_>,
        shard: &Shard,
        mode: Mode,
    ) -> Result<Vec<ValidationResult>, ShaclError> {
        let plan = match mode {
            Mode::Transactional => planner.transactional_plan(shard)?,
            Mode::Full => planner.full_plan(shard)?,
        };
        if self.settings.log_validation_plans {
            let shape = self.shapes.shape(shard.shape());
            tracing::debug!(
                shape = %shape.id,
                component = %shape.components[shard.component()].source_constraint_component(),
                chain_length = shard.chain().segments().len(),
                approach = ?planner.approach(shard),
                depth = plan.depth(),
                "validation plan"
            );
        }
        let mut results = Vec::new();
        for tuple in plan {
            results.extend(tuple?.into_results());
        }
        Ok(results)
    }
}
