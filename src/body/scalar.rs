use serde_json::Value;

use crate::body::NodeKind;
use crate::body::common::{ChangeType, ValueFactory};
use crate::config::ScalarConfig;
use crate::error::Result;
use crate::operator::{Operator, TypeMutator, names};
use crate::random::MutationContext;

#[derive(Debug, Clone, PartialEq)]
pub enum BooleanOperator {
    /// Logical negation.
    Mutate,
    Null,
    ChangeType(ChangeType),
}

impl Operator for BooleanOperator {
    type Input = bool;

    fn name(&self) -> &'static str {
        match self {
            BooleanOperator::Mutate => names::MUTATE,
            BooleanOperator::Null => names::NULL,
            BooleanOperator::ChangeType(_) => names::CHANGE_TYPE,
        }
    }

    fn apply(&self, input: bool, ctx: &mut MutationContext) -> Result<Value> {
        Ok(match self {
            BooleanOperator::Mutate => Value::Bool(!input),
            BooleanOperator::Null => Value::Null,
            BooleanOperator::ChangeType(op) => op.apply(ctx),
        })
    }
}

/// `null` nodes can only become a value of some other kind.
#[derive(Debug, Clone, PartialEq)]
pub enum NullOperator {
    ChangeType(ChangeType),
}

impl Operator for NullOperator {
    type Input = ();

    fn name(&self) -> &'static str {
        match self {
            NullOperator::ChangeType(_) => names::CHANGE_TYPE,
        }
    }

    fn apply(&self, _input: (), ctx: &mut MutationContext) -> Result<Value> {
        match self {
            NullOperator::ChangeType(op) => Ok(op.apply(ctx)),
        }
    }
}

pub fn boolean_mutator(
    config: &ScalarConfig,
    factory: ValueFactory,
) -> Result<TypeMutator<BooleanOperator>> {
    TypeMutator::new(
        "boolean",
        config.probability,
        &config.weights,
        vec![
            (0.8, BooleanOperator::Mutate),
            (0.1, BooleanOperator::Null),
            (
                0.1,
                BooleanOperator::ChangeType(ChangeType::new(NodeKind::Boolean, factory)),
            ),
        ],
    )
}

pub fn null_mutator(
    config: &ScalarConfig,
    factory: ValueFactory,
) -> Result<TypeMutator<NullOperator>> {
    TypeMutator::new(
        "null",
        config.probability,
        &config.weights,
        vec![(
            1.0,
            NullOperator::ChangeType(ChangeType::new(NodeKind::Null, factory)),
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BodyConfig;

    #[test]
    fn boolean_mutate_inverts() {
        let mut ctx = MutationContext::seeded(0);
        assert_eq!(
            BooleanOperator::Mutate.apply(true, &mut ctx).unwrap(),
            Value::Bool(false)
        );
        assert_eq!(
            BooleanOperator::Mutate.apply(false, &mut ctx).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn null_change_type_produces_non_null() {
        let config = BodyConfig::default();
        let mutator = null_mutator(&config.null, ValueFactory::from_config(&config)).unwrap();
        let mut ctx = MutationContext::seeded(17);
        for _ in 0..100 {
            let out = mutator
                .apply_named(names::CHANGE_TYPE, Value::Null, &mut ctx)
                .unwrap();
            assert!(!out.is_null());
        }
        assert_eq!(ctx.stats().get("null", names::CHANGE_TYPE), 100);
    }
}
