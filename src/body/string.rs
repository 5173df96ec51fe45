use serde_json::Value;

use crate::body::NodeKind;
use crate::body::common::{ChangeType, ValueFactory};
use crate::config::StringConfig;
use crate::error::Result;
use crate::operator::{Operator, TypeMutator, names};
use crate::random::MutationContext;

const SPECIAL_CHARACTERS: [&str; 10] = ["/", "*", ",", "´", "´*", "/*", "/,", "*,", "´/", "´,"];

/// Operators for JSON strings.
#[derive(Debug, Clone, PartialEq)]
pub enum StringOperator {
    /// Replace with a random string of length `[min_length, max_length]`.
    Replace {
        min_length: usize,
        max_length: usize,
        ascii: bool,
        letters: bool,
        digits: bool,
    },
    /// Insert one of a set of special character sequences.
    AddSpecialCharacters,
    /// Remove, insert or replace a single character.
    Mutate,
    /// Empty, min-length, max-length, lowercase or uppercase string.
    Boundary {
        min_length: usize,
        max_length: usize,
        lowercase: String,
        uppercase: String,
    },
    Null,
    ChangeType(ChangeType),
}

impl Operator for StringOperator {
    type Input = String;

    fn name(&self) -> &'static str {
        match self {
            StringOperator::Replace { .. } => names::REPLACE,
            StringOperator::AddSpecialCharacters => names::ADD_SPECIAL_CHARACTERS,
            StringOperator::Mutate => names::MUTATE,
            StringOperator::Boundary { .. } => names::BOUNDARY,
            StringOperator::Null => names::NULL,
            StringOperator::ChangeType(_) => names::CHANGE_TYPE,
        }
    }

    fn apply(&self, input: String, ctx: &mut MutationContext) -> Result<Value> {
        let out = match self {
            StringOperator::Replace {
                min_length,
                max_length,
                ascii,
                letters,
                digits,
            } => {
                let len = ctx.count(*min_length, *max_length);
                if *ascii {
                    ctx.printable_ascii(len)
                } else {
                    ctx.string_of(len, *letters, *digits)
                }
            }
            StringOperator::AddSpecialCharacters => add_special_characters(&input, ctx),
            StringOperator::Mutate => mutate_one_char(&input, ctx),
            StringOperator::Boundary {
                min_length,
                max_length,
                lowercase,
                uppercase,
            } => {
                let draw = ctx.unit();
                if draw <= 1.0 / 5.0 {
                    String::new()
                } else if draw <= 2.0 / 5.0 {
                    ctx.alphanumeric(*min_length)
                } else if draw <= 3.0 / 5.0 {
                    ctx.alphanumeric(*max_length)
                } else if draw <= 4.0 / 5.0 {
                    lowercase.clone()
                } else {
                    uppercase.clone()
                }
            }
            StringOperator::Null => return Ok(Value::Null),
            StringOperator::ChangeType(op) => return Ok(op.apply(ctx)),
        };

        Ok(Value::String(out))
    }
}

/// The empty string is returned unchanged.
fn add_special_characters(input: &str, ctx: &mut MutationContext) -> String {
    let mut chars: Vec<char> = input.chars().collect();
    if chars.is_empty() {
        return String::new();
    }

    let pos = ctx.index(chars.len() + 1);
    let special = SPECIAL_CHARACTERS[ctx.index(SPECIAL_CHARACTERS.len())];
    chars.splice(pos..pos, special.chars());
    chars.into_iter().collect()
}

/// On an empty string only insertion is possible.
fn mutate_one_char(input: &str, ctx: &mut MutationContext) -> String {
    let mut chars: Vec<char> = input.chars().collect();
    if chars.is_empty() {
        return ctx.alphanumeric(1);
    }

    let pos = ctx.index(chars.len());
    let draw = ctx.unit();

    if draw <= 1.0 / 3.0 {
        chars.remove(pos);
    } else if draw <= 2.0 / 3.0 {
        let c = random_char(ctx);
        chars.insert(pos, c);
    } else {
        let mut c = random_char(ctx);
        while c == chars[pos] {
            c = random_char(ctx);
        }
        chars[pos] = c;
    }

    chars.into_iter().collect()
}

fn random_char(ctx: &mut MutationContext) -> char {
    ctx.alphanumeric(1).chars().next().unwrap_or('x')
}

pub fn string_mutator(
    config: &StringConfig,
    factory: ValueFactory,
) -> Result<TypeMutator<StringOperator>> {
    crate::config::CountRange::new(config.min_length, config.max_length)
        .validate("body.string length")?;

    TypeMutator::new(
        "string",
        config.probability,
        &config.weights,
        vec![
            (
                0.1,
                StringOperator::Replace {
                    min_length: config.min_length,
                    max_length: config.max_length,
                    ascii: config.include_ascii,
                    letters: config.include_letters,
                    digits: config.include_numbers,
                },
            ),
            (0.1, StringOperator::AddSpecialCharacters),
            (0.3, StringOperator::Mutate),
            (
                0.2,
                StringOperator::Boundary {
                    min_length: config.min_length,
                    max_length: config.max_length,
                    lowercase: config.lowercase.clone(),
                    uppercase: config.uppercase.clone(),
                },
            ),
            (0.1, StringOperator::Null),
            (
                0.2,
                StringOperator::ChangeType(ChangeType::new(NodeKind::String, factory)),
            ),
        ],
    )
}
