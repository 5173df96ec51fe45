use serde_json::Value;

use crate::body::NodeKind;
use crate::body::common::{ChangeType, ValueFactory};
use crate::config::{ContainerConfig, CountRange};
use crate::error::Result;
use crate::operator::{Operator, TypeMutator, names};
use crate::random::MutationContext;

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayOperator {
    /// Remove between `min` and `max` elements, clamped to the array length.
    RemoveElement(CountRange),
    /// Insert between `min` and `max` elements shaped like an existing one.
    AddElement {
        range: CountRange,
        factory: ValueFactory,
    },
    /// Replace with `[]`.
    Empty,
    /// Reorder the elements.
    DisorderElements,
    Null,
    ChangeType(ChangeType),
}

impl Operator for ArrayOperator {
    type Input = Vec<Value>;

    fn name(&self) -> &'static str {
        match self {
            ArrayOperator::RemoveElement(_) => names::REMOVE_ELEMENT,
            ArrayOperator::AddElement { .. } => names::ADD_ELEMENT,
            ArrayOperator::Empty => names::EMPTY,
            ArrayOperator::DisorderElements => names::DISORDER_ELEMENTS,
            ArrayOperator::Null => names::NULL,
            ArrayOperator::ChangeType(_) => names::CHANGE_TYPE,
        }
    }

    fn apply(&self, input: Vec<Value>, ctx: &mut MutationContext) -> Result<Value> {
        let mut items = input;

        match self {
            ArrayOperator::RemoveElement(range) => {
                let n = ctx.count(range.min, range.max).min(items.len());
                for _ in 0..n {
                    let idx = ctx.index(items.len());
                    items.remove(idx);
                }
            }
            ArrayOperator::AddElement { range, factory } => {
                let n = ctx.count(range.min, range.max);
                for _ in 0..n {
                    let value = if items.is_empty() {
                        factory.scalar(ctx)
                    } else {
                        let template = NodeKind::of(&items[ctx.index(items.len())]);
                        factory.value(template, ctx)
                    };
                    let at = ctx.index(items.len() + 1);
                    items.insert(at, value);
                }
            }
            ArrayOperator::Empty => items.clear(),
            ArrayOperator::DisorderElements => {
                let original = items.clone();
                ctx.shuffle(&mut items);
                if items == original && items.len() > 1 {
                    items.rotate_left(1);
                }
            }
            ArrayOperator::Null => return Ok(Value::Null),
            ArrayOperator::ChangeType(op) => return Ok(op.apply(ctx)),
        }

        Ok(Value::Array(items))
    }
}

pub fn array_mutator(
    config: &ContainerConfig,
    factory: ValueFactory,
) -> Result<TypeMutator<ArrayOperator>> {
    config.added.validate("body.array.added")?;
    config.removed.validate("body.array.removed")?;

    TypeMutator::new(
        "array",
        config.probability,
        &config.weights,
        vec![
            (0.3, ArrayOperator::RemoveElement(config.removed)),
            (
                0.3,
                ArrayOperator::AddElement {
                    range: config.added,
                    factory,
                },
            ),
            (0.1, ArrayOperator::Empty),
            (0.1, ArrayOperator::DisorderElements),
            (0.1, ArrayOperator::Null),
            (
                0.1,
                ArrayOperator::ChangeType(ChangeType::new(NodeKind::Array, factory)),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BodyConfig;
    use serde_json::json;

    #[test]
    fn empty_on_empty_array_is_a_no_op() {
        let mut ctx = MutationContext::seeded(0);
        assert_eq!(ArrayOperator::Empty.apply(vec![], &mut ctx).unwrap(), json!([]));
        assert_eq!(
            ArrayOperator::Empty.apply(vec![json!(1)], &mut ctx).unwrap(),
            json!([])
        );
    }

    #[test]
    fn removal_is_clamped_to_length() {
        let op = ArrayOperator::RemoveElement(CountRange::new(3, 5));
        let mut ctx = MutationContext::seeded(2);
        let out = op.apply(vec![json!(1), json!(2)], &mut ctx).unwrap();
        assert_eq!(out, json!([]));

        let out = op.apply(vec![], &mut ctx).unwrap();
        assert_eq!(out, json!([]));
    }

    #[test]
    fn added_elements_follow_existing_kinds() {
        let factory = ValueFactory::from_config(&BodyConfig::default());
        let op = ArrayOperator::AddElement {
            range: CountRange::new(3, 3),
            factory,
        };
        let mut ctx = MutationContext::seeded(5);
        let out = op.apply(vec![json!("a"), json!("b")], &mut ctx).unwrap();
        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert!(items.iter().all(Value::is_string));
    }

    #[test]
    fn disorder_changes_order_but_not_content() {
        let mut ctx = MutationContext::seeded(9);
        let input = vec![json!(1), json!(2), json!(3)];
        for _ in 0..50 {
            let out = ArrayOperator::DisorderElements
                .apply(input.clone(), &mut ctx)
                .unwrap();
            let mut items: Vec<i64> = out
                .as_array()
                .unwrap()
                .iter()
                .map(|v| v.as_i64().unwrap())
                .collect();
            assert_ne!(items, vec![1, 2, 3]);
            items.sort();
            assert_eq!(items, vec![1, 2, 3]);
        }
    }
}
