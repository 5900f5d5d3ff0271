//! Engine configuration supplied by the host page.
//!
//! Every field is optional in the JSON; missing fields take the values in
//! [`crate::consts`].

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::Color;
use crate::consts::{DEFAULT_LAYER_SIZE, HISTORY_LIMIT, MAX_LAYERS, SELECTION_NET_THRESHOLD};

/// Error returned by [`EngineConfig::from_json`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid engine config `{field}`: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard cap on the number of layers; inserts beyond it are dropped.
    pub max_layers: usize,
    /// Width and height of a shape inserted from the toolbar.
    pub default_layer_size: f64,
    /// Manhattan distance a press must travel before it becomes a marquee.
    pub selection_net_threshold: f64,
    /// Maximum number of undo entries retained.
    pub history_limit: usize,
    /// Fill used before the user picks a color.
    pub default_color: Color,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_layers: MAX_LAYERS,
            default_layer_size: DEFAULT_LAYER_SIZE,
            selection_net_threshold: SELECTION_NET_THRESHOLD,
            history_limit: HISTORY_LIMIT,
            default_color: Color::BLACK,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when a value is out of range.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate().inspect_err(|e| warn!(error = %e, "rejected engine config"))?;
        Ok(config)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_layers == 0 {
            return Err(ConfigError::Invalid { field: "max_layers", reason: "must be greater than zero" });
        }
        if !(self.default_layer_size.is_finite() && self.default_layer_size > 0.0) {
            return Err(ConfigError::Invalid { field: "default_layer_size", reason: "must be a positive number" });
        }
        if !(self.selection_net_threshold.is_finite() && self.selection_net_threshold >= 0.0) {
            return Err(ConfigError::Invalid { field: "selection_net_threshold", reason: "must not be negative" });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid { field: "history_limit", reason: "must be greater than zero" });
        }
        Ok(())
    }
}
