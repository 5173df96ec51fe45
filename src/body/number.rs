use serde_json::Value;

use crate::body::NodeKind;
use crate::body::common::{ChangeType, ValueFactory, float_value};
use crate::config::{FloatConfig, IntegerConfig};
use crate::error::{MutationError, Result};
use crate::operator::{Operator, TypeMutator, names};
use crate::random::MutationContext;

/// Redraws allowed when a replacement lands on the original value.
const MAX_REDRAWS: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum IntegerOperator {
    /// Random integer in `[min, max]`.
    Replace { min: i64, max: i64 },
    Null,
    ChangeType(ChangeType),
}

impl Operator for IntegerOperator {
    type Input = i128;

    fn name(&self) -> &'static str {
        match self {
            IntegerOperator::Replace { .. } => names::REPLACE,
            IntegerOperator::Null => names::NULL,
            IntegerOperator::ChangeType(_) => names::CHANGE_TYPE,
        }
    }

    fn apply(&self, input: i128, ctx: &mut MutationContext) -> Result<Value> {
        match self {
            IntegerOperator::Replace { min, max } => {
                let mut out = ctx.int_inclusive(*min, *max);
                for _ in 0..MAX_REDRAWS {
                    if i128::from(out) != input {
                        break;
                    }
                    out = ctx.int_inclusive(*min, *max);
                }
                Ok(Value::from(out))
            }
            IntegerOperator::Null => Ok(Value::Null),
            IntegerOperator::ChangeType(op) => Ok(op.apply(ctx)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FloatOperator {
    /// Random float in `[min, max)`.
    Replace { min: f64, max: f64 },
    Null,
    ChangeType(ChangeType),
}

impl Operator for FloatOperator {
    type Input = f64;

    fn name(&self) -> &'static str {
        match self {
            FloatOperator::Replace { .. } => names::REPLACE,
            FloatOperator::Null => names::NULL,
            FloatOperator::ChangeType(_) => names::CHANGE_TYPE,
        }
    }

    fn apply(&self, input: f64, ctx: &mut MutationContext) -> Result<Value> {
        match self {
            FloatOperator::Replace { min, max } => {
                let mut out = ctx.float_range(*min, *max);
                for _ in 0..MAX_REDRAWS {
                    if out != input {
                        break;
                    }
                    out = ctx.float_range(*min, *max);
                }
                Ok(float_value(out))
            }
            FloatOperator::Null => Ok(Value::Null),
            FloatOperator::ChangeType(op) => Ok(op.apply(ctx)),
        }
    }
}

pub fn integer_mutator(
    config: &IntegerConfig,
    factory: ValueFactory,
) -> Result<TypeMutator<IntegerOperator>> {
    if config.min > config.max {
        return Err(MutationError::Config(format!(
            "body.integer: min ({}) is greater than max ({})",
            config.min, config.max
        )));
    }

    TypeMutator::new(
        "integer",
        config.probability,
        &config.weights,
        vec![
            (
                0.7,
                IntegerOperator::Replace {
                    min: config.min,
                    max: config.max,
                },
            ),
            (0.1, IntegerOperator::Null),
            (
                0.2,
                IntegerOperator::ChangeType(ChangeType::new(NodeKind::Integer, factory)),
            ),
        ],
    )
}

pub fn float_mutator(
    config: &FloatConfig,
    factory: ValueFactory,
) -> Result<TypeMutator<FloatOperator>> {
    if !config.min.is_finite() || !config.max.is_finite() || config.min > config.max {
        return Err(MutationError::Config(format!(
            "body.float: bounds must be finite with min <= max, got [{}, {})",
            config.min, config.max
        )));
    }

    TypeMutator::new(
        "float",
        config.probability,
        &config.weights,
        vec![
            (
                0.7,
                FloatOperator::Replace {
                    min: config.min,
                    max: config.max,
                },
            ),
            (0.1, FloatOperator::Null),
            (
                0.2,
                FloatOperator::ChangeType(ChangeType::new(NodeKind::Float, factory)),
            ),
        ],
    )
}
