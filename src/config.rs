use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MutationError, Result};

/// Configuration for every mutator the engine can build.
///
/// Loaded from JSON; every field has a default, unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct MutatorConfig {
    pub status_code: StatusCodeConfig,
    pub headers: HeadersConfig,
    pub body: BodyConfig,
}

impl MutatorConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MutationError::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| MutationError::Config(format!("{}: {e}", path.display())))
    }

    /// Check weights, probabilities and ranges by building every enabled mutator.
    pub fn validate(&self) -> Result<()> {
        crate::engine::HttpMutatorEngine::new(self).map(|_| ())
    }
}

/// Operator weights keyed by operator name.
///
/// Operators missing from the map keep their catalog weight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Weights(pub BTreeMap<String, f32>);

impl Weights {
    pub fn with(mut self, operator: &str, weight: f32) -> Self {
        self.0.insert(operator.to_string(), weight);
        self
    }

    /// Merge the configured weights over a mutator's catalog.
    ///
    /// Unknown operator names and negative or non-finite weights are errors.
    pub fn resolve(
        &self,
        mutator: &str,
        catalog: &[(&'static str, f32)],
    ) -> Result<Vec<(&'static str, f32)>> {
        for name in self.0.keys() {
            if !catalog.iter().any(|(known, _)| known == name) {
                return Err(MutationError::Config(format!(
                    "unknown operator `{name}` for mutator `{mutator}`"
                )));
            }
        }

        catalog
            .iter()
            .map(|(name, default)| {
                let weight = self.0.get(*name).copied().unwrap_or(*default);
                if !weight.is_finite() || weight < 0.0 {
                    return Err(MutationError::Config(format!(
                        "weight of {mutator}/{name} must be a finite number >= 0, got {weight}"
                    )));
                }
                Ok((*name, weight))
            })
            .collect()
    }
}

/// Inclusive `[min, max]` range of how many elements to add or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub(crate) fn validate(&self, what: &str) -> Result<()> {
        if self.min > self.max {
            return Err(MutationError::Config(format!(
                "{what}: min ({}) is greater than max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

pub(crate) fn validate_probability(what: &str, probability: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(MutationError::Config(format!(
            "{what}: probability must be within [0, 1], got {probability}"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct StatusCodeConfig {
    pub enabled: bool,
    pub probability: f64,
    pub weights: Weights,
}

impl Default for StatusCodeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
            weights: Weights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct HeadersConfig {
    pub enabled: bool,
    pub media_type: HeaderComponentConfig,
    pub charset: HeaderComponentConfig,
    pub location: HeaderComponentConfig,
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            media_type: HeaderComponentConfig::default(),
            charset: HeaderComponentConfig::default(),
            location: HeaderComponentConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct HeaderComponentConfig {
    pub enabled: bool,
    pub probability: f64,
    pub weights: Weights,
}

impl Default for HeaderComponentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
            weights: Weights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct BodyConfig {
    pub enabled: bool,
    /// Per-node chance, scaled by the mutator probability, used by multiple-order mode.
    pub multiple_order_probability: f64,
    pub string: StringConfig,
    pub integer: IntegerConfig,
    pub float: FloatConfig,
    pub boolean: ScalarConfig,
    pub null: ScalarConfig,
    pub object: ContainerConfig,
    pub array: ContainerConfig,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            multiple_order_probability: 0.1,
            string: StringConfig::default(),
            integer: IntegerConfig::default(),
            float: FloatConfig::default(),
            boolean: ScalarConfig::default(),
            null: ScalarConfig::default(),
            object: ContainerConfig::default(),
            array: ContainerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct StringConfig {
    pub enabled: bool,
    pub probability: f64,
    pub min_length: usize,
    pub max_length: usize,
    /// Replacement strings use printable ASCII instead of letters/digits.
    pub include_ascii: bool,
    pub include_letters: bool,
    pub include_numbers: bool,
    pub lowercase: String,
    pub uppercase: String,
    pub weights: Weights,
}

impl Default for StringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
            min_length: 1,
            max_length: 20,
            include_ascii: false,
            include_letters: true,
            include_numbers: true,
            lowercase: "lowercase".to_string(),
            uppercase: "UPPERCASE".to_string(),
            weights: Weights::default(),
        }
    }
}

/// Integer replacement bounds, inclusive `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct IntegerConfig {
    pub enabled: bool,
    pub probability: f64,
    pub min: i64,
    pub max: i64,
    pub weights: Weights,
}

impl Default for IntegerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
            min: -1_000_000,
            max: 1_000_000,
            weights: Weights::default(),
        }
    }
}

/// Float replacement bounds, half-open `[min, max)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct FloatConfig {
    pub enabled: bool,
    pub probability: f64,
    pub min: f64,
    pub max: f64,
    pub weights: Weights,
}

impl Default for FloatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
            min: -1_000_000.0,
            max: 1_000_000.0,
            weights: Weights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ScalarConfig {
    pub enabled: bool,
    pub probability: f64,
    pub weights: Weights,
}

impl Default for ScalarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
            weights: Weights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ContainerConfig {
    pub enabled: bool,
    pub probability: f64,
    pub added: CountRange,
    pub removed: CountRange,
    pub weights: Weights,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 1.0,
            added: CountRange::new(1, 3),
            removed: CountRange::new(1, 2),
            weights: Weights::default(),
        }
    }
}
