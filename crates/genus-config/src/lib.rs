//! Configuration for a genus analysis run, loaded from `genus.toml`.
//!
//! ```toml
//! [engine]
//! lub_depth_limit = 4
//! unchecked_warnings = true
//!
//! [scheduler]
//! max_rounds = 8
//!
//! [logging]
//! level = "info"
//! json = false
//! ```
//!
//! Every table and key is optional. Unknown keys do not fail loading; they are collected in
//! [`ConfigDiagnostics`].

use std::path::Path;
use std::sync::Once;

use genus_typeck::SchedulerOptions;
use genus_types::EngineOptions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod diagnostics;
mod schema;
mod validation;

pub use diagnostics::{ConfigDiagnostics, ConfigWarning};
pub use schema::json_schema;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Type engine limits.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Re-running of checks that wait for constant values.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum nesting of recursively computed least upper bounds before a type argument
    /// degrades to `?`.
    #[serde(default = "EngineConfig::default_lub_depth_limit")]
    #[schemars(range(min = 1))]
    pub lub_depth_limit: usize,

    /// Warn about member accesses through raw receivers whose types were erased.
    #[serde(default = "EngineConfig::default_unchecked_warnings")]
    pub unchecked_warnings: bool,
}

impl EngineConfig {
    fn default_lub_depth_limit() -> usize {
        EngineOptions::default().lub_depth_limit
    }

    fn default_unchecked_warnings() -> bool {
        EngineOptions::default().unchecked_warnings
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lub_depth_limit: Self::default_lub_depth_limit(),
            unchecked_warnings: Self::default_unchecked_warnings(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Rounds of re-running deferred checks before they are reported as never ready.
    #[serde(default = "SchedulerConfig::default_max_rounds")]
    #[schemars(range(min = 1))]
    pub max_rounds: usize,
}

impl SchedulerConfig {
    fn default_max_rounds() -> usize {
        SchedulerOptions::default().max_rounds
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_rounds: Self::default_max_rounds(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// A level (`info`, `debug`, ...) or a full `EnvFilter` directive string such as
    /// `warn,genus.types=trace`.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit one JSON object per event.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    /// Canonical directive text for `level`: bare level names are case-insensitive and
    /// `warning` means `warn`; anything else passes through as a directive string.
    pub(crate) fn normalize_level_directives(input: &str) -> String {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        match lower.as_str() {
            "" => Self::default_level(),
            "warning" => "warn".to_owned(),
            level if LEVELS.contains(&level) => level.to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    /// The effective filter: the configured level, with `RUST_LOG` appended when it is set.
    ///
    /// Unparseable input degrades to `RUST_LOG` alone, then to `info`.
    pub fn env_filter(&self) -> EnvFilter {
        let configured = Self::normalize_level_directives(&self.level);
        let from_env = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let mut candidates = Vec::with_capacity(3);
        if let Some(env) = &from_env {
            candidates.push(format!("{configured},{env}"));
            candidates.push(env.clone());
        }
        candidates.push(configured);
        candidates
            .into_iter()
            .find_map(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The `Display` form quotes a snippet of the input; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl AnalysisConfig {
    /// Load a config file from TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_diagnostics(path).map(|(config, _)| config)
    }

    /// Load a config file and report unknown keys and out-of-range values.
    pub fn load_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(target: "genus.config", path = %path.display(), "loading config");
        Self::from_toml_str_with_diagnostics(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Self::from_toml_str_with_diagnostics(text).map(|(config, _)| config)
    }

    pub fn from_toml_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<AnalysisConfig>(text)?;
        for key in &unknown_keys {
            tracing::warn!(target: "genus.config", key = %key, "unknown config key");
        }
        let diagnostics = ConfigDiagnostics {
            unknown_keys,
            warnings: config.validate(),
        };
        Ok((config, diagnostics))
    }

    /// Options for a [`genus_types::TyContext`]. Out-of-range values are clamped.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            lub_depth_limit: self.engine.lub_depth_limit.max(1),
            unchecked_warnings: self.engine.unchecked_warnings,
        }
    }

    /// Options for a [`genus_typeck::Driver`]. Out-of-range values are clamped.
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            max_rounds: self.scheduler.max_rounds.max(1),
        }
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a global `tracing` subscriber writing to stderr.
///
/// Safe to call more than once; only the first call (in the whole process) has an effect, and a
/// subscriber installed by someone else is left in place.
pub fn init_tracing(config: &LoggingConfig) {
    TRACING_INIT.call_once(|| {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(config.env_filter())
            .with_writer(std::io::stderr);
        let installed = if config.json {
            builder.json().try_init().is_ok()
        } else {
            builder.try_init().is_ok()
        };
        if installed {
            tracing::debug!(target: "genus.config", json = config.json, "tracing initialized");
        }
    });
}
