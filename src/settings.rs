use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CategorizationError, Result};

const ENV_PREFIX: &str = "CATEGORIZATION";

/// Tunables of a categorization, read from an optional settings file and
/// `CATEGORIZATION_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether the working view starts out sorted.
    #[serde(default)]
    pub sorted: bool,
    /// A batch whose deltas outnumber this share of the view is reported as
    /// a reset.
    #[serde(default = "default_reset_ratio")]
    pub reset_ratio: f64,
    /// Tracing filter installed by the binary.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_reset_ratio() -> f64 {
    0.5
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sorted: false,
            reset_ratio: default_reset_ratio(),
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Loads settings from `path` (any format the config crate recognises
    /// by extension, the file may be missing) with environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings: Settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
    pub fn validate(&self) -> Result<()> {
        if !self.reset_ratio.is_finite() || self.reset_ratio < 0.0 {
            return Err(CategorizationError::Config(format!(
                "reset_ratio must be a non-negative number, got {}",
                self.reset_ratio
            )));
        }
        Ok(())
    }
    /// Whether a batch that produced `deltas` over a view of `rows` rows
    /// should be reported as a reset instead.
    pub(crate) fn collapses(&self, deltas: usize, rows: usize) -> bool {
        deltas > 1 && deltas as f64 > self.reset_ratio * rows.max(1) as f64
    }
}
