use log::{debug, warn};
use serde_json::{Map, Value};

use crate::config::{Weights, validate_probability};
use crate::error::{MutationError, Result};
use crate::random::MutationContext;

/// Stable operator names, shared with configuration keys.
pub mod names {
    pub const REPLACE: &str = "replace";
    pub const MUTATE: &str = "mutate";
    pub const CHANGE_TYPE: &str = "changeType";
    pub const NULL: &str = "null";
    pub const BOUNDARY: &str = "boundary";
    pub const ADD_ELEMENT: &str = "addElement";
    pub const REMOVE_ELEMENT: &str = "removeElement";
    pub const REMOVE_OBJECT_ELEMENT: &str = "removeObjectElement";
    pub const EMPTY: &str = "empty";
    pub const DISORDER_ELEMENTS: &str = "disorderElements";
    pub const ADD_SPECIAL_CHARACTERS: &str = "addSpecialCharacters";
    pub const REPLACE_WITH_20X: &str = "replaceWith20x";
    pub const REPLACE_WITH_40X: &str = "replaceWith40x";
    pub const REPLACE_WITH_50X: &str = "replaceWith50x";
}

/// A single named transformation for one category of values.
pub trait Operator {
    /// Value the operator accepts, extracted from the JSON node.
    type Input: FromValue;

    fn name(&self) -> &'static str;

    fn apply(&self, input: Self::Input, ctx: &mut MutationContext) -> Result<Value>;
}

/// Typed extraction of an operator input from a JSON value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_i64()
    }
}

/// Any JSON integer, including `u64` values above `i64::MAX`.
impl FromValue for i128 {
    fn from_value(value: Value) -> Option<Self> {
        value
            .as_i64()
            .map(i128::from)
            .or_else(|| value.as_u64().map(i128::from))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        value.as_f64()
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Option<Self> {
        value.is_null().then_some(())
    }
}

impl FromValue for Map<String, Value> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }
}

/// Absent components (header parts) are modelled as `null`.
impl FromValue for Option<String> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            Value::String(s) => Some(Some(s)),
            _ => None,
        }
    }
}

/// Where in a document an operator is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// The whole document of a field (for example the entire body).
    Root,
    /// Any nested property or array element.
    Element,
}

impl Level {
    /// `null` and `changeType` only make sense for elements, not whole documents.
    pub fn allows(self, operator: &str) -> bool {
        match self {
            Level::Root => operator != names::NULL && operator != names::CHANGE_TYPE,
            Level::Element => true,
        }
    }
}

/// An operator registered with its relative weight.
#[derive(Debug, Clone)]
pub struct Weighted<O> {
    pub weight: f32,
    pub operator: O,
}

/// The operators and activation probability for one kind of value.
#[derive(Debug, Clone)]
pub struct TypeMutator<O> {
    name: &'static str,
    probability: f64,
    operators: Vec<Weighted<O>>,
}

impl<O: Operator> TypeMutator<O> {
    /// Build a mutator from catalog entries `(default weight, operator)` and
    /// the configured weight overrides.
    pub fn new(
        name: &'static str,
        probability: f64,
        weights: &Weights,
        catalog: Vec<(f32, O)>,
    ) -> Result<Self> {
        validate_probability(name, probability)?;

        let defaults: Vec<(&'static str, f32)> = catalog
            .iter()
            .map(|(weight, op)| (op.name(), *weight))
            .collect();
        let resolved = weights.resolve(name, &defaults)?;

        let operators = catalog
            .into_iter()
            .zip(resolved)
            .map(|((_, operator), (_, weight))| Weighted { weight, operator })
            .collect();

        Ok(Self {
            name,
            probability,
            operators,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn operators(&self) -> &[Weighted<O>] {
        &self.operators
    }

    /// Drop an operator from this mutator (presence gating).
    pub fn remove(&mut self, operator: &str) {
        self.operators.retain(|w| w.operator.name() != operator);
    }

    /// Apply the operator called `operator` to `value`, recording its use.
    pub fn apply_named(
        &self,
        operator: &str,
        value: Value,
        ctx: &mut MutationContext,
    ) -> Result<Value> {
        let op = self
            .operators
            .iter()
            .map(|w| &w.operator)
            .find(|op| op.name() == operator)
            .ok_or_else(|| {
                MutationError::Config(format!(
                    "mutator `{}` has no operator `{operator}`",
                    self.name
                ))
            })?;

        self.invoke(op, value, ctx)
    }

    fn invoke(&self, op: &O, value: Value, ctx: &mut MutationContext) -> Result<Value> {
        let input = O::Input::from_value(value).ok_or_else(|| {
            MutationError::unsupported(self.name, op.name(), "value kind does not match mutator")
        })?;

        ctx.record(self.name, op.name());
        op.apply(input, ctx)
    }

    /// Weight-proportional choice among the operators allowed at `level`.
    pub fn choose(&self, level: Level, ctx: &mut MutationContext) -> Option<&O> {
        self.choose_excluding(level, &[], ctx)
    }

    /// Like [`TypeMutator::choose`], skipping the operators named in `excluded`.
    ///
    /// Zero-weight operators stay out of the draw unless every operator
    /// allowed at `level` has weight zero.
    pub fn choose_excluding(
        &self,
        level: Level,
        excluded: &[&str],
        ctx: &mut MutationContext,
    ) -> Option<&O> {
        let allowed: Vec<&Weighted<O>> = self
            .operators
            .iter()
            .filter(|w| level.allows(w.operator.name()))
            .collect();
        let all_zero = allowed.iter().all(|w| w.weight <= 0.0);

        let remaining: Vec<&Weighted<O>> = allowed
            .into_iter()
            .filter(|w| all_zero || w.weight > 0.0)
            .filter(|w| !excluded.contains(&w.operator.name()))
            .collect();
        let weights: Vec<f32> = remaining.iter().map(|w| w.weight).collect();

        let idx = ctx.weighted(&weights)?;
        Some(&remaining[idx].operator)
    }
}

/// Object-safe view of a [`TypeMutator`], used by walkers to treat every
/// value kind uniformly.
pub trait NodeMutator {
    fn name(&self) -> &'static str;

    fn probability(&self) -> f64;

    /// Operator names allowed at `level`, in registration order.
    fn operator_names(&self, level: Level) -> Vec<&'static str>;

    /// `(operator, weight)` pairs in registration order.
    fn weights(&self) -> Vec<(&'static str, f32)>;

    fn apply(&self, operator: &str, value: Value, ctx: &mut MutationContext) -> Result<Value>;

    /// Pick operators by weight until one changes `value`. Returns the
    /// operator name, or `None` when every allowed operator left it as is.
    fn apply_weighted(
        &self,
        value: Value,
        level: Level,
        ctx: &mut MutationContext,
    ) -> Result<Option<(&'static str, Value)>>;
}

impl<O: Operator> NodeMutator for TypeMutator<O> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn probability(&self) -> f64 {
        self.probability
    }

    fn operator_names(&self, level: Level) -> Vec<&'static str> {
        self.operators
            .iter()
            .map(|w| w.operator.name())
            .filter(|name| level.allows(name))
            .collect()
    }

    fn weights(&self) -> Vec<(&'static str, f32)> {
        self.operators
            .iter()
            .map(|w| (w.operator.name(), w.weight))
            .collect()
    }

    fn apply(&self, operator: &str, value: Value, ctx: &mut MutationContext) -> Result<Value> {
        self.apply_named(operator, value, ctx)
    }

    fn apply_weighted(
        &self,
        value: Value,
        level: Level,
        ctx: &mut MutationContext,
    ) -> Result<Option<(&'static str, Value)>> {
        let mut tried: Vec<&'static str> = Vec::new();

        while let Some(op) = self.choose_excluding(level, &tried, ctx) {
            let name = op.name();
            match self.invoke(op, value.clone(), ctx) {
                Ok(mutated) if mutated != value => return Ok(Some((name, mutated))),
                Ok(_) => debug!("{}/{name} left the value unchanged", self.name),
                Err(e) if e.is_per_mutant() => warn!("{}/{name} skipped: {e}", self.name),
                Err(e) => return Err(e),
            }
            tried.push(name);
        }

        Ok(None)
    }
}
