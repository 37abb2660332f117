// src/config/overrides.rs

//! Command-line overrides for a resolved config.
//!
//! An override document is a JSON object merged into the resolved tree:
//! objects merge key by key, anything else replaces the existing value.
//!
//! ```text
//! --json '{"train": {"batch_size": 2}, "dataset": {"num_workers": 0}}'
//! ```

use tracing::debug;

use crate::errors::{ExpcfgError, Result};
use crate::resolve::{ResolvedConfig, Value};

impl ResolvedConfig {
    /// Return a new config with `json` merged in. `self` is consumed, so
    /// there is never a config that is half overridden.
    pub fn with_overrides(self, json: &str) -> Result<ResolvedConfig> {
        let parsed: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ExpcfgError::Override(format!("not valid JSON: {e}")))?;
        let serde_json::Value::Object(_) = parsed else {
            return Err(ExpcfgError::Override(
                "override document must be a JSON object".to_string(),
            ));
        };

        let mut root = self.into_value();
        merge_into(&mut root, Value::from_json(&parsed));
        Ok(ResolvedConfig::new(root))
    }
}

/// Merge `patch` into `target`: mapping into mapping recurses, anything
/// else replaces.
pub fn merge_into(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Mapping(base), Value::Mapping(patch)) => {
            for (key, value) in patch.iter() {
                match base.get_mut(key) {
                    Some(existing) => merge_into(existing, value.clone()),
                    None => {
                        debug!(key, "override adds new key");
                        base.insert(key, value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}
