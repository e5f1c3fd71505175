//! Parameter files for saving and loading profile bindings.
//!
//! A parameter file is JSON:
//!
//! ```json
//! { "profile": "kubernetes", "parameters": { "machineNum": 3, "k8s": true } }
//! ```
//!
//! Values may be typed JSON or strings; they are coerced to the declared
//! parameter type when bound.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::params::{BoundParameters, ParameterValue};
use crate::types::ProfileKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamsFile {
    /// Profile the bindings were written for; the command line wins if both are set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileKind>,
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl ParamsFile {
    /// Snapshot of the effective values of a binding
    pub fn from_bound(bound: &BoundParameters) -> Self {
        let parameters = bound
            .values()
            .iter()
            .map(|(name, value)| {
                let json = match value {
                    ParameterValue::Boolean(b) => serde_json::Value::Bool(*b),
                    ParameterValue::Integer(i) => serde_json::Value::from(*i),
                    ParameterValue::String(s) => serde_json::Value::String(s.clone()),
                };
                (name.clone(), json)
            })
            .collect();
        Self {
            profile: Some(bound.profile()),
            parameters,
        }
    }

    /// Save parameters to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize parameters to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write parameters to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load parameters from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read parameters from {:?}", path.as_ref()))?;

        let file: Self =
            serde_json::from_str(&content).context("Failed to parse parameters JSON")?;

        Ok(file)
    }

    /// Apply `name=value` overrides from the command line
    pub fn with_overrides(mut self, overrides: &[(String, String)]) -> Self {
        for (name, value) in overrides {
            self.parameters
                .insert(name.clone(), serde_json::Value::String(value.clone()));
        }
        self
    }
}
