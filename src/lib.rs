//! Mutation of HTTP responses (status code, headers and JSON body) for
//! mutation testing of API clients.
//!
//! The [`HttpMutatorEngine`] turns one response document into a stream of
//! [`MutantGroup`]s; [`pipeline::mutate_jsonl`] drives a whole batch through a
//! strategy, writers and reporters.

pub mod body;
pub mod config;
pub mod engine;
pub mod error;
pub mod headers;
pub mod mutant;
pub mod operator;
pub mod pipeline;
pub mod pointer;
pub mod random;
pub mod reporter;
pub mod stats;
pub mod status;
pub mod strategy;
pub mod writer;

pub use config::MutatorConfig;
pub use engine::{GenerationSummary, HttpMutatorEngine, Mode};
pub use error::{MutationError, Result};
pub use mutant::{Field, Mutant, MutantGroup, MutationOperator};
pub use random::MutationContext;
