use log::{debug, warn};
use serde_json::Value;

use crate::body::BodyMutators;
use crate::error::Result;
use crate::operator::{Level, NodeMutator};
use crate::pointer;
use crate::random::MutationContext;

/// One mutated body together with the node that was changed.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMutant {
    /// JSON pointer of the changed node, relative to the body (`""` is the body itself).
    pub pointer: String,
    pub mutator: &'static str,
    pub operator: &'static str,
    pub body: Value,
}

/// Single-order bookkeeping: the running candidate counter and the chosen position.
///
/// Lives for exactly one walk; mutators never see it.
#[derive(Debug, Clone, Copy)]
struct TraversalState {
    position: usize,
    target: usize,
}

/// Recursive walker over a JSON body.
#[derive(Debug, Clone, Copy)]
pub struct BodyWalker<'a> {
    mutators: &'a BodyMutators,
}

impl<'a> BodyWalker<'a> {
    pub fn new(mutators: &'a BodyMutators) -> Self {
        Self { mutators }
    }

    /// Exhaustive mode: every enabled operator on every node, one body copy each.
    ///
    /// `emit` receives one group per node, in depth-first pre-order, the body
    /// itself first. Nodes whose operators all missed their probability draw
    /// emit nothing.
    pub fn exhaustive(
        &self,
        body: &Value,
        ctx: &mut MutationContext,
        emit: &mut dyn FnMut(&str, Vec<BodyMutant>) -> Result<()>,
    ) -> Result<()> {
        self.visit(body, body, String::new(), Level::Root, ctx, emit)
    }

    fn visit(
        &self,
        document: &Value,
        node: &Value,
        path: String,
        level: Level,
        ctx: &mut MutationContext,
        emit: &mut dyn FnMut(&str, Vec<BodyMutant>) -> Result<()>,
    ) -> Result<()> {
        if let Some(mutator) = self.mutators.for_value(node) {
            let mutants = node_mutants(mutator, document, node, &path, level, ctx)?;
            if !mutants.is_empty() {
                debug!("body node {path:?}: {} mutants", mutants.len());
                emit(&path, mutants)?;
            }
        }

        for (token, child) in children(node) {
            let child_path = pointer::child(&path, &token);
            self.visit(document, child, child_path, Level::Element, ctx, emit)?;
        }

        Ok(())
    }

    /// Number of single-order candidates in `body`, the body itself included.
    pub fn candidates(&self, body: &Value) -> usize {
        self.count(body, Level::Root)
    }

    fn count(&self, node: &Value, level: Level) -> usize {
        let own = usize::from(self.is_candidate(node, level));
        own + children(node)
            .into_iter()
            .map(|(_, child)| self.count(child, Level::Element))
            .sum::<usize>()
    }

    fn is_candidate(&self, node: &Value, level: Level) -> bool {
        self.mutators
            .for_value(node)
            .is_some_and(|m| !m.operator_names(level).is_empty())
    }

    /// Single-order mode: one weighted mutation on one uniformly chosen node.
    ///
    /// Returns `None` when the body has no candidate node.
    pub fn single(&self, body: &Value, ctx: &mut MutationContext) -> Result<Option<BodyMutant>> {
        let total = self.candidates(body);
        if total == 0 {
            return Ok(None);
        }

        let target = ctx.index(total);
        self.mutate_position(body, target, ctx)
    }

    /// Mutate the candidate at `target` (as numbered by a depth-first walk).
    pub fn mutate_position(
        &self,
        body: &Value,
        target: usize,
        ctx: &mut MutationContext,
    ) -> Result<Option<BodyMutant>> {
        let mut state = TraversalState {
            position: 0,
            target,
        };

        let Some((path, node, level)) = self.locate(body, String::new(), Level::Root, &mut state)
        else {
            return Ok(None);
        };
        let Some(mutator) = self.mutators.for_value(node) else {
            return Ok(None);
        };

        let Some((operator, value)) = weighted(mutator, node.clone(), level, &path, ctx)? else {
            return Ok(None);
        };

        Ok(pointer::replace_at(body, &path, value).map(|mutated| BodyMutant {
            pointer: path,
            mutator: mutator.name(),
            operator,
            body: mutated,
        }))
    }

    fn locate<'v>(
        &self,
        node: &'v Value,
        path: String,
        level: Level,
        state: &mut TraversalState,
    ) -> Option<(String, &'v Value, Level)> {
        if self.is_candidate(node, level) {
            if state.position == state.target {
                return Some((path, node, level));
            }
            state.position += 1;
        }

        for (token, child) in children(node) {
            let child_path = pointer::child(&path, &token);
            if let Some(found) = self.locate(child, child_path, Level::Element, state) {
                return Some(found);
            }
        }

        None
    }

    /// Multiple-order mode: each node is mutated independently with chance
    /// `probability * multiple_order_probability`, containers before their
    /// children.
    ///
    /// Returns the mutated body and the number of nodes changed, or `None`
    /// when no node was selected.
    pub fn multiple(
        &self,
        body: &Value,
        ctx: &mut MutationContext,
    ) -> Result<Option<(Value, usize)>> {
        let mut working = body.clone();
        let mut applied = 0;
        self.mutate_each(&mut working, "", Level::Root, ctx, &mut applied)?;

        Ok((applied > 0).then_some((working, applied)))
    }

    fn mutate_each(
        &self,
        node: &mut Value,
        path: &str,
        level: Level,
        ctx: &mut MutationContext,
        applied: &mut usize,
    ) -> Result<()> {
        if let Some(mutator) = self.mutators.for_value(node) {
            let chance = mutator.probability() * self.mutators.multiple_order_probability();
            if ctx.chance(chance) {
                if let Some((_, value)) = weighted(mutator, node.clone(), level, path, ctx)? {
                    *node = value;
                    *applied += 1;
                }
            }
        }

        match node {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let child_path = pointer::child(path, key);
                    self.mutate_each(child, &child_path, Level::Element, ctx, applied)?;
                }
            }
            Value::Array(items) => {
                for (idx, child) in items.iter_mut().enumerate() {
                    let child_path = pointer::child(path, &idx.to_string());
                    self.mutate_each(child, &child_path, Level::Element, ctx, applied)?;
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn children(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

/// Every operator allowed at `level`, each gated by the mutator probability.
fn node_mutants(
    mutator: &dyn NodeMutator,
    document: &Value,
    node: &Value,
    path: &str,
    level: Level,
    ctx: &mut MutationContext,
) -> Result<Vec<BodyMutant>> {
    let mut out = Vec::new();

    for operator in mutator.operator_names(level) {
        if !ctx.chance(mutator.probability()) {
            continue;
        }

        let value = match mutator.apply(operator, node.clone(), ctx) {
            Ok(value) => value,
            Err(e) if e.is_per_mutant() => {
                warn!("skipping body mutant at {path:?}: {e}");
                continue;
            }
            Err(e) => return Err(e),
        };

        if let Some(body) = pointer::replace_at(document, path, value) {
            out.push(BodyMutant {
                pointer: path.to_string(),
                mutator: mutator.name(),
                operator,
                body,
            });
        }
    }

    Ok(out)
}

fn weighted(
    mutator: &dyn NodeMutator,
    value: Value,
    level: Level,
    path: &str,
    ctx: &mut MutationContext,
) -> Result<Option<(&'static str, Value)>> {
    match mutator.apply_weighted(value, level, ctx) {
        Ok(result) => Ok(result),
        Err(e) if e.is_per_mutant() => {
            warn!("skipping body mutant at {path:?}: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
