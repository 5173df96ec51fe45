use serde_json::{Map, Value};

use crate::body::NodeKind;
use crate::body::common::{ChangeType, ValueFactory};
use crate::config::{ContainerConfig, CountRange};
use crate::error::Result;
use crate::operator::{Operator, TypeMutator, names};
use crate::random::MutationContext;

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectOperator {
    /// Remove between `min` and `max` properties, never more than exist.
    RemoveElement(CountRange),
    /// Like `RemoveElement`, restricted to properties whose value is an object.
    RemoveObjectElement(CountRange),
    /// Add between `min` and `max` properties under fresh random names.
    AddElement {
        range: CountRange,
        factory: ValueFactory,
    },
    Null,
    ChangeType(ChangeType),
}

impl Operator for ObjectOperator {
    type Input = Map<String, Value>;

    fn name(&self) -> &'static str {
        match self {
            ObjectOperator::RemoveElement(_) => names::REMOVE_ELEMENT,
            ObjectOperator::RemoveObjectElement(_) => names::REMOVE_OBJECT_ELEMENT,
            ObjectOperator::AddElement { .. } => names::ADD_ELEMENT,
            ObjectOperator::Null => names::NULL,
            ObjectOperator::ChangeType(_) => names::CHANGE_TYPE,
        }
    }

    fn apply(&self, input: Map<String, Value>, ctx: &mut MutationContext) -> Result<Value> {
        let out = match self {
            ObjectOperator::RemoveElement(range) => remove_where(input, *range, ctx, |_| true),
            ObjectOperator::RemoveObjectElement(range) => {
                remove_where(input, *range, ctx, Value::is_object)
            }
            ObjectOperator::AddElement { range, factory } => {
                let mut map = input;
                let n = ctx.count(range.min, range.max);
                for _ in 0..n {
                    let key = fresh_key(&map, ctx);
                    let value = factory.scalar(ctx);
                    map.insert(key, value);
                }
                map
            }
            ObjectOperator::Null => return Ok(Value::Null),
            ObjectOperator::ChangeType(op) => return Ok(op.apply(ctx)),
        };

        Ok(Value::Object(out))
    }
}

/// Remove a random subset of the properties matching `eligible`, keeping the
/// order of the survivors.
fn remove_where(
    map: Map<String, Value>,
    range: CountRange,
    ctx: &mut MutationContext,
    eligible: impl Fn(&Value) -> bool,
) -> Map<String, Value> {
    let mut candidates: Vec<usize> = map
        .values()
        .enumerate()
        .filter(|(_, v)| eligible(v))
        .map(|(i, _)| i)
        .collect();

    let n = ctx.count(range.min, range.max).min(candidates.len());
    ctx.shuffle(&mut candidates);
    let dropped = &candidates[..n];

    map.into_iter()
        .enumerate()
        .filter(|(i, _)| !dropped.contains(i))
        .map(|(_, entry)| entry)
        .collect()
}

fn fresh_key(map: &Map<String, Value>, ctx: &mut MutationContext) -> String {
    let mut key = ctx.alphanumeric(8);
    while map.contains_key(&key) {
        key = ctx.alphanumeric(8);
    }
    key
}

pub fn object_mutator(
    config: &ContainerConfig,
    factory: ValueFactory,
) -> Result<TypeMutator<ObjectOperator>> {
    config.added.validate("body.object.added")?;
    config.removed.validate("body.object.removed")?;

    TypeMutator::new(
        "object",
        config.probability,
        &config.weights,
        vec![
            (0.3, ObjectOperator::RemoveElement(config.removed)),
            (0.2, ObjectOperator::RemoveObjectElement(config.removed)),
            (
                0.3,
                ObjectOperator::AddElement {
                    range: config.added,
                    factory,
                },
            ),
            (0.1, ObjectOperator::Null),
            (
                0.1,
                ObjectOperator::ChangeType(ChangeType::new(NodeKind::Object, factory)),
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BodyConfig;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(m) => m,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn remove_one_keeps_exactly_two_keys() {
        let op = ObjectOperator::RemoveElement(CountRange::new(1, 1));
        let mut ctx = MutationContext::seeded(12);
        let mut removed = std::collections::BTreeSet::new();

        for _ in 0..60 {
            let out = op
                .apply(map(json!({"a": 1, "b": 2, "c": 3})), &mut ctx)
                .unwrap();
            let keys: Vec<&str> = out.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys.len(), 2);
            for k in ["a", "b", "c"] {
                if !keys.contains(&k) {
                    removed.insert(k);
                }
            }
        }

        assert_eq!(removed.len(), 3, "every key should be removable");
    }

    #[test]
    fn removal_is_clamped_and_keeps_order() {
        let op = ObjectOperator::RemoveElement(CountRange::new(5, 5));
        let mut ctx = MutationContext::seeded(1);
        let out = op.apply(map(json!({"a": 1, "b": 2})), &mut ctx).unwrap();
        assert_eq!(out, json!({}));

        let op = ObjectOperator::RemoveElement(CountRange::new(1, 1));
        let out = op
            .apply(map(json!({"x": 1, "y": 2, "z": 3})), &mut ctx)
            .unwrap();
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn remove_object_element_only_touches_objects() {
        let op = ObjectOperator::RemoveObjectElement(CountRange::new(1, 2));
        let mut ctx = MutationContext::seeded(4);
        let out = op
            .apply(map(json!({"id": 1, "meta": {"a": 1}, "name": "n"})), &mut ctx)
            .unwrap();
        assert_eq!(out, json!({"id": 1, "name": "n"}));

        let untouched = op.apply(map(json!({"id": 1})), &mut ctx).unwrap();
        assert_eq!(untouched, json!({"id": 1}));
    }

    #[test]
    fn add_element_adds_fresh_keys() {
        let factory = ValueFactory::from_config(&BodyConfig::default());
        let op = ObjectOperator::AddElement {
            range: CountRange::new(2, 2),
            factory,
        };
        let mut ctx = MutationContext::seeded(8);
        let out = op.apply(map(json!({"id": 7})), &mut ctx).unwrap();
        let obj = out.as_object().unwrap();
        assert_eq!(obj.len(), 3);
        assert_eq!(obj.get("id"), Some(&json!(7)));
    }
}
