use crate::diagnostics::ConfigWarning;
use crate::{AnalysisConfig, LoggingConfig};

impl AnalysisConfig {
    /// Semantic checks that deserialization cannot express. Reports every problem found.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut out = Vec::new();
        if self.engine.lub_depth_limit == 0 {
            out.push(ConfigWarning::InvalidValue {
                toml_path: "engine.lub_depth_limit".to_owned(),
                message: "must be >= 1".to_owned(),
            });
        }
        if self.scheduler.max_rounds == 0 {
            out.push(ConfigWarning::InvalidValue {
                toml_path: "scheduler.max_rounds".to_owned(),
                message: "must be >= 1".to_owned(),
            });
        }
        validate_logging(&self.logging, &mut out);
        out
    }
}

fn validate_logging(logging: &LoggingConfig, out: &mut Vec<ConfigWarning>) {
    let normalized = LoggingConfig::normalize_level_directives(&logging.level);
    if !logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.push(ConfigWarning::LoggingLevelInvalid {
            value: logging.level.clone(),
            normalized,
        });
    }
}
