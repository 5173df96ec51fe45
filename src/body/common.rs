use serde_json::{Map, Value};

use crate::body::NodeKind;
use crate::config::BodyConfig;
use crate::random::MutationContext;

/// Builds random JSON values of a requested kind, within the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueFactory {
    pub min_length: usize,
    pub max_length: usize,
    pub int_min: i64,
    pub int_max: i64,
    pub float_min: f64,
    pub float_max: f64,
}

impl ValueFactory {
    pub fn from_config(config: &BodyConfig) -> Self {
        Self {
            min_length: config.string.min_length,
            max_length: config.string.max_length,
            int_min: config.integer.min,
            int_max: config.integer.max,
            float_min: config.float.min,
            float_max: config.float.max,
        }
    }

    pub fn string(&self, ctx: &mut MutationContext) -> Value {
        let len = ctx.count(self.min_length, self.max_length);
        Value::String(ctx.alphanumeric(len))
    }

    pub fn scalar(&self, ctx: &mut MutationContext) -> Value {
        const SCALARS: [NodeKind; 4] = [
            NodeKind::String,
            NodeKind::Integer,
            NodeKind::Float,
            NodeKind::Boolean,
        ];
        let kind = SCALARS[ctx.index(SCALARS.len())];
        self.value(kind, ctx)
    }

    /// A random value of `kind`. Containers get a single scalar entry.
    pub fn value(&self, kind: NodeKind, ctx: &mut MutationContext) -> Value {
        match kind {
            NodeKind::String => self.string(ctx),
            NodeKind::Integer => Value::from(ctx.int_inclusive(self.int_min, self.int_max)),
            NodeKind::Float => float_value(ctx.float_range(self.float_min, self.float_max)),
            NodeKind::Boolean => Value::Bool(ctx.boolean()),
            NodeKind::Null => Value::Null,
            NodeKind::Object => {
                let mut map = Map::new();
                let key = ctx.alphanumeric(self.max_length.clamp(1, 8));
                map.insert(key, self.scalar(ctx));
                Value::Object(map)
            }
            NodeKind::Array => Value::Array(vec![self.scalar(ctx)]),
        }
    }
}

/// JSON float, `null` for values JSON cannot represent.
pub fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

/// Replaces a value with a value of another, non-null kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeType {
    pub from: NodeKind,
    pub factory: ValueFactory,
}

impl ChangeType {
    pub fn new(from: NodeKind, factory: ValueFactory) -> Self {
        Self { from, factory }
    }

    pub fn apply(&self, ctx: &mut MutationContext) -> Value {
        const TARGETS: [NodeKind; 6] = [
            NodeKind::String,
            NodeKind::Integer,
            NodeKind::Float,
            NodeKind::Boolean,
            NodeKind::Object,
            NodeKind::Array,
        ];

        let choices: Vec<NodeKind> = TARGETS
            .iter()
            .copied()
            .filter(|k| *k != self.from)
            .collect();
        let target = choices[ctx.index(choices.len())];
        self.factory.value(target, ctx)
    }
}
