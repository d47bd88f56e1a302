//! Player configuration

use crate::{Catalog, Error, Result};
use serde::{Deserialize, Serialize};

/// Player configuration
///
/// The engine always pauses at the end of a clip; that is not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Catalog index selected when the view is created
    pub initial_selection: usize,
    /// Log every published state at info level
    pub log_state_changes: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            initial_selection: 0,
            log_state_changes: true,
        }
    }
}

impl PlayerConfig {
    /// Parse a configuration, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check the configuration against the catalog it will drive
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if self.initial_selection >= catalog.len() {
            return Err(Error::InvalidConfig(format!(
                "initial_selection {} out of range for {} items",
                self.initial_selection,
                catalog.len()
            )));
        }
        Ok(())
    }
}
