use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::AnalysisConfig;

/// JSON schema for `genus.toml`, for editor integration and CI validation.
///
/// Unlike loading, the schema rejects unknown keys.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(AnalysisConfig)
}
