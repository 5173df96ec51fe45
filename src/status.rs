use serde_json::Value;

use crate::config::StatusCodeConfig;
use crate::error::Result;
use crate::operator::{Operator, TypeMutator, names};
use crate::random::MutationContext;

const SUCCESS_CODES: [i64; 4] = [200, 201, 202, 204];
const CLIENT_ERROR_CODES: [i64; 5] = [400, 401, 403, 404, 409];
const SERVER_ERROR_CODES: [i64; 4] = [500, 501, 502, 503];

/// Replaces the status code with another code of a given class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCodeOperator {
    ReplaceWith20x,
    ReplaceWith40x,
    ReplaceWith50x,
}

impl StatusCodeOperator {
    pub fn pool(self) -> &'static [i64] {
        match self {
            StatusCodeOperator::ReplaceWith20x => &SUCCESS_CODES,
            StatusCodeOperator::ReplaceWith40x => &CLIENT_ERROR_CODES,
            StatusCodeOperator::ReplaceWith50x => &SERVER_ERROR_CODES,
        }
    }
}

impl Operator for StatusCodeOperator {
    type Input = i64;

    fn name(&self) -> &'static str {
        match self {
            StatusCodeOperator::ReplaceWith20x => names::REPLACE_WITH_20X,
            StatusCodeOperator::ReplaceWith40x => names::REPLACE_WITH_40X,
            StatusCodeOperator::ReplaceWith50x => names::REPLACE_WITH_50X,
        }
    }

    /// Draw from the pool, never returning `input`.
    fn apply(&self, input: i64, ctx: &mut MutationContext) -> Result<Value> {
        let choices: Vec<i64> = self
            .pool()
            .iter()
            .copied()
            .filter(|code| *code != input)
            .collect();
        Ok(Value::from(choices[ctx.index(choices.len())]))
    }
}

pub fn status_code_mutator(config: &StatusCodeConfig) -> Result<TypeMutator<StatusCodeOperator>> {
    TypeMutator::new(
        "statusCode",
        config.probability,
        &config.weights,
        vec![
            (1.0, StatusCodeOperator::ReplaceWith20x),
            (1.0, StatusCodeOperator::ReplaceWith40x),
            (1.0, StatusCodeOperator::ReplaceWith50x),
        ],
    )
}
