//! Persisted Parameter State
//!
//! The saved form of a [`ParameterStore`]: a flat map from parameter key to
//! value, serialized as JSON. Hosts treat the bytes as opaque.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::params::{ParamId, ParameterStore, PARAMETERS};

/// Current state format version
pub const STATE_VERSION: u32 = 1;

/// Serialized parameter tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterState {
    pub version: u32,
    /// Parameter key -> value
    #[serde(default)]
    pub parameters: BTreeMap<String, f32>,
}

impl Default for ParameterState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            parameters: BTreeMap::new(),
        }
    }
}

impl ParameterState {
    /// Read every parameter of `store`
    pub fn capture(store: &ParameterStore) -> Self {
        let parameters = PARAMETERS
            .iter()
            .map(|info| (info.key.to_string(), store.get(info.id)))
            .collect();

        Self {
            version: STATE_VERSION,
            parameters,
        }
    }

    /// Replace the contents of `store` with this state
    ///
    /// Parameters missing from the state return to their default; unknown
    /// keys are skipped with a warning so newer files still load.
    pub fn apply(&self, store: &ParameterStore) -> EngineResult<()> {
        if self.version > STATE_VERSION {
            return Err(EngineError::UnsupportedStateVersion {
                found: self.version,
                supported: STATE_VERSION,
            });
        }

        store.reset_to_defaults();
        for (key, &value) in &self.parameters {
            match ParamId::from_key(key) {
                Some(id) => {
                    store.set(id, value)?;
                }
                None => warn!("Skipping unknown parameter in state: {}", key),
            }
        }

        info!("Parameter state restored ({} values)", self.parameters.len());
        Ok(())
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bytes(&self) -> EngineResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
