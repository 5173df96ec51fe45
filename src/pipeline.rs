use std::io::BufRead;

use log::{info, warn};
use serde::Serialize;

use crate::engine::{HttpMutatorEngine, Mode};
use crate::error::{MutationError, Result};
use crate::random::MutationContext;
use crate::reporter::MutantReporter;
use crate::stats::OperatorUsageStats;
use crate::strategy::MutantStrategy;
use crate::writer::MutantWriter;

/// Totals for one batch of responses.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Responses that were mutated.
    pub responses: u64,

    /// Non-blank lines that were not valid response documents.
    pub skipped: u64,

    /// Mutant groups produced by the engine.
    pub groups: u64,

    /// Mutants produced by the engine.
    pub generated: u64,

    /// Mutants kept by the strategy and written.
    pub selected: u64,

    /// Operator invocations, keyed `mutator/operator`.
    pub usage: OperatorUsageStats,
}

/// The consumers every generated group flows through.
pub struct Pipeline<'a> {
    pub strategy: &'a mut dyn MutantStrategy,
    pub writers: Vec<&'a mut dyn MutantWriter>,
    pub reporters: Vec<&'a mut dyn MutantReporter>,
}

/// Mutate one response per non-blank line of `reader`.
///
/// A response's id is its 0-based line number. Unparseable or invalid lines
/// are logged and counted. A writer failure aborts the batch.
pub fn mutate_jsonl<R: BufRead>(
    reader: R,
    engine: &HttpMutatorEngine,
    mode: Mode,
    ctx: &mut MutationContext,
    pipeline: Pipeline<'_>,
) -> Result<BatchSummary> {
    let Pipeline {
        strategy,
        mut writers,
        mut reporters,
    } = pipeline;
    let mut summary = BatchSummary::default();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let original_id = line_no as u64;
        let mut selected = 0;

        let result = engine.generate_str(&line, mode, ctx, |group| {
            for mutant in strategy.select(group) {
                for writer in writers.iter_mut() {
                    writer.write(original_id, &mutant)?;
                }
                for reporter in reporters.iter_mut() {
                    reporter.on_mutant(original_id, &mutant);
                }
                selected += 1;
            }
            Ok(())
        });

        match result {
            Ok(generated) => {
                summary.responses += 1;
                summary.groups += generated.groups as u64;
                summary.generated += generated.mutants as u64;
                summary.selected += selected;
            }
            Err(e @ (MutationError::Parse(_) | MutationError::Validation(_))) => {
                warn!("skipping line {}: {e}", line_no + 1);
                summary.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    for writer in writers.iter_mut() {
        writer.close().map_err(MutationError::Sink)?;
    }
    for reporter in reporters.iter_mut() {
        reporter.on_finished();
    }

    summary.usage = ctx.stats().clone();
    info!(
        "{} responses, {} skipped, {} mutants generated, {} selected",
        summary.responses, summary.skipped, summary.generated, summary.selected
    );
    Ok(summary)
}
