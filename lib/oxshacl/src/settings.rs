//! Validation run configuration.

/// Forces the way constraints are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ApproachOverride {
    /// Each constraint uses its preferred approach.
    #[default]
    Auto,
    /// Always build transactional plans, looking only at the data touched by the transaction.
    Transactional,
    /// Always validate with one SPARQL query per constraint over the whole data.
    SparqlBased,
}

/// Settings of a validation run.
///
/// ```
/// use oxshacl::ValidationSettings;
///
/// let settings = ValidationSettings::default()
///     .with_parallel_validation(false)
///     .with_log_validation_violations(true);
/// assert!(settings.validation_enabled);
/// assert!(!settings.parallel_validation);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[expect(clippy::struct_excessive_bools)]
pub struct ValidationSettings {
    /// When disabled, commits are never rejected.
    pub validation_enabled: bool,
    /// Validates independent constraints on several threads if the store allows it.
    pub parallel_validation: bool,
    /// Shares the target and path scans between the constraints of a validation run.
    pub cache_select_nodes: bool,
    /// Expands class targets and `sh:class` with the `rdfs:subClassOf` hierarchy of the data.
    pub rdfs_sub_class_reasoning: bool,
    pub log_validation_plans: bool,
    pub log_validation_violations: bool,
    pub log_validation_execution: bool,
    pub performance_logging: bool,
    pub approach: ApproachOverride,
    /// Number of focus nodes sent in each query of a bulked join.
    pub bulk_join_batch_size: usize,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            validation_enabled: true,
            parallel_validation: true,
            cache_select_nodes: true,
            rdfs_sub_class_reasoning: true,
            log_validation_plans: false,
            log_validation_violations: false,
            log_validation_execution: false,
            performance_logging: false,
            approach: ApproachOverride::Auto,
            bulk_join_batch_size: 512,
        }
    }
}

impl ValidationSettings {
    #[must_use]
    pub fn with_validation_enabled(mut self, enabled: bool) -> Self {
        self.validation_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_parallel_validation(mut self, parallel: bool) -> Self {
        self.parallel_validation = parallel;
        self
    }

    #[must_use]
    pub fn with_cache_select_nodes(mut self, cache: bool) -> Self {
        self.cache_select_nodes = cache;
        self
    }

    #[must_use]
    pub fn with_rdfs_sub_class_reasoning(mut self, reasoning: bool) -> Self {
        self.rdfs_sub_class_reasoning = reasoning;
        self
    }

    /// Logs the plan of each constraint and the generated SPARQL queries at the `debug` level.
    #[must_use]
    pub fn with_log_validation_plans(mut self, log: bool) -> Self {
        self.log_validation_plans = log;
        self
    }

    /// Logs every violation at the `warn` level.
    #[must_use]
    pub fn with_log_validation_violations(mut self, log: bool) -> Self {
        self.log_validation_violations = log;
        self
    }

    /// Logs every tuple flowing through the plans at the `trace` level.
    #[must_use]
    pub fn with_log_validation_execution(mut self, log: bool) -> Self {
        self.log_validation_execution = log;
        self
    }

    /// Logs the duration of each validation at the `info` level.
    #[must_use]
    pub fn with_performance_logging(mut self, log: bool) -> Self {
        self.performance_logging = log;
        self
    }

    #[must_use]
    pub fn with_approach(mut self, approach: ApproachOverride) -> Self {
        self.approach = approach;
        self
    }

    #[must_use]
    pub fn with_bulk_join_batch_size(mut self, size: usize) -> Self {
        self.bulk_join_batch_size = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let settings = ValidationSettings::default()
            .with_validation_enabled(false)
            .with_approach(ApproachOverride::SparqlBased)
            .with_bulk_join_batch_size(0);
        assert!(!settings.validation_enabled);
        assert_eq!(settings.approach, ApproachOverride::SparqlBased);
        assert_eq!(settings.bulk_join_batch_size, 1);
        assert!(settings.cache_select_nodes);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde() {
        let settings = ValidationSettings::default().with_performance_logging(true);
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(
            serde_json::from_str::<ValidationSettings>(&json).unwrap(),
            settings
        );
        let partial: ValidationSettings =
            serde_json::from_str(r#"{"approach":"Transactional"}"#).unwrap();
        assert_eq!(partial.approach, ApproachOverride::Transactional);
        assert!(partial.validation_enabled);
    }
}
