//! Body mutation: per-kind operator catalogs and the document walker.

pub mod array;
pub mod common;
pub mod number;
pub mod object;
pub mod scalar;
pub mod string;
pub mod walker;

use serde::Serialize;
use serde_json::Value;

use crate::config::BodyConfig;
use crate::error::Result;
use crate::operator::{NodeMutator, TypeMutator};

use self::array::{ArrayOperator, array_mutator};
use self::common::ValueFactory;
use self::number::{FloatOperator, IntegerOperator, float_mutator, integer_mutator};
use self::object::{ObjectOperator, object_mutator};
use self::scalar::{BooleanOperator, NullOperator, boolean_mutator, null_mutator};
use self::string::{StringOperator, string_mutator};

/// Kind tag of a JSON node, used to dispatch to its type mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    String,
    Integer,
    Float,
    Boolean,
    Null,
    Object,
    Array,
}

impl NodeKind {
    pub const ALL: [NodeKind; 7] = [
        NodeKind::String,
        NodeKind::Integer,
        NodeKind::Float,
        NodeKind::Boolean,
        NodeKind::Null,
        NodeKind::Object,
        NodeKind::Array,
    ];

    /// Numbers representable as `i64`/`u64` are integers, everything else is a float.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => NodeKind::String,
            Value::Number(n) if n.is_i64() || n.is_u64() => NodeKind::Integer,
            Value::Number(_) => NodeKind::Float,
            Value::Bool(_) => NodeKind::Boolean,
            Value::Null => NodeKind::Null,
            Value::Object(_) => NodeKind::Object,
            Value::Array(_) => NodeKind::Array,
        }
    }

    /// Name used for the mutator of this kind.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::String => "string",
            NodeKind::Integer => "integer",
            NodeKind::Float => "float",
            NodeKind::Boolean => "boolean",
            NodeKind::Null => "null",
            NodeKind::Object => "object",
            NodeKind::Array => "array",
        }
    }
}

/// The type mutators of one body configuration. `None` means the kind is disabled.
#[derive(Debug, Clone)]
pub struct BodyMutators {
    string: Option<TypeMutator<StringOperator>>,
    integer: Option<TypeMutator<IntegerOperator>>,
    float: Option<TypeMutator<FloatOperator>>,
    boolean: Option<TypeMutator<BooleanOperator>>,
    null: Option<TypeMutator<NullOperator>>,
    object: Option<TypeMutator<ObjectOperator>>,
    array: Option<TypeMutator<ArrayOperator>>,
    multiple_order_probability: f64,
}

impl BodyMutators {
    /// Build every enabled mutator, validating weights, probabilities and ranges.
    pub fn from_config(config: &BodyConfig) -> Result<Self> {
        crate::config::validate_probability(
            "body.multipleOrderProbability",
            config.multiple_order_probability,
        )?;

        let factory = ValueFactory::from_config(config);

        Ok(Self {
            string: enabled(config.string.enabled, || {
                string_mutator(&config.string, factory)
            })?,
            integer: enabled(config.integer.enabled, || {
                integer_mutator(&config.integer, factory)
            })?,
            float: enabled(config.float.enabled, || float_mutator(&config.float, factory))?,
            boolean: enabled(config.boolean.enabled, || {
                boolean_mutator(&config.boolean, factory)
            })?,
            null: enabled(config.null.enabled, || null_mutator(&config.null, factory))?,
            object: enabled(config.object.enabled, || {
                object_mutator(&config.object, factory)
            })?,
            array: enabled(config.array.enabled, || array_mutator(&config.array, factory))?,
            multiple_order_probability: config.multiple_order_probability,
        })
    }

    /// Type dispatcher: the mutator for `kind`, if that kind is enabled.
    pub fn get(&self, kind: NodeKind) -> Option<&dyn NodeMutator> {
        match kind {
            NodeKind::String => self.string.as_ref().map(|m| m as &dyn NodeMutator),
            NodeKind::Integer => self.integer.as_ref().map(|m| m as &dyn NodeMutator),
            NodeKind::Float => self.float.as_ref().map(|m| m as &dyn NodeMutator),
            NodeKind::Boolean => self.boolean.as_ref().map(|m| m as &dyn NodeMutator),
            NodeKind::Null => self.null.as_ref().map(|m| m as &dyn NodeMutator),
            NodeKind::Object => self.object.as_ref().map(|m| m as &dyn NodeMutator),
            NodeKind::Array => self.array.as_ref().map(|m| m as &dyn NodeMutator),
        }
    }

    /// Mutator for the kind of `value`.
    pub fn for_value(&self, value: &Value) -> Option<&dyn NodeMutator> {
        self.get(NodeKind::of(value))
    }

    pub fn multiple_order_probability(&self) -> f64 {
        self.multiple_order_probability
    }

    /// Enabled mutators in kind order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn NodeMutator> {
        NodeKind::ALL.into_iter().filter_map(|kind| self.get(kind))
    }
}

fn enabled<T>(on: bool, build: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
    if on { build().map(Some) } else { Ok(None) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn node_kind_of_distinguishes_integers_and_floats() {
        assert_eq!(NodeKind::of(&json!(1)), NodeKind::Integer);
        assert_eq!(NodeKind::of(&json!(u64::MAX)), NodeKind::Integer);
        assert_eq!(NodeKind::of(&json!(1.5)), NodeKind::Float);
        assert_eq!(NodeKind::of(&json!("x")), NodeKind::String);
        assert_eq!(NodeKind::of(&json!(null)), NodeKind::Null);
        assert_eq!(NodeKind::of(&json!({})), NodeKind::Object);
        assert_eq!(NodeKind::of(&json!([])), NodeKind::Array);
    }

    #[test]
    fn disabled_kind_has_no_mutator() {
        let mut config = BodyConfig::default();
        config.boolean.enabled = false;

        let mutators = BodyMutators::from_config(&config).unwrap();
        assert!(mutators.get(NodeKind::Boolean).is_none());
        assert_eq!(mutators.get(NodeKind::String).unwrap().name(), "string");
        assert_eq!(mutators.iter().count(), 6);
    }

    #[test]
    fn dispatch_matches_node_kind() {
        let mutators = BodyMutators::from_config(&BodyConfig::default()).unwrap();
        for kind in NodeKind::ALL {
            assert_eq!(mutators.get(kind).unwrap().name(), kind.name());
        }
    }

    #[test]
    fn invalid_multiple_order_probability_is_rejected() {
        let config = BodyConfig {
            multiple_order_probability: -0.5,
            ..BodyConfig::default()
        };
        assert!(BodyMutators::from_config(&config).is_err());
    }
}
