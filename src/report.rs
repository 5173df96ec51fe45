use serde::Serialize;

use http_mutant::HttpMutatorEngine;
use http_mutant::headers::HeaderComponent;
use http_mutant::mutant::Field;
use http_mutant::operator::NodeMutator;
use http_mutant::pipeline::BatchSummary;

/// One enabled mutator with its operator weights.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogEntry {
    pub field: Field,
    pub mutator: &'static str,
    pub probability: f64,
    pub operators: Vec<OperatorWeight>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OperatorWeight {
    pub name: &'static str,
    pub weight: f32,
}

fn entry(field: Field, mutator: &dyn NodeMutator) -> CatalogEntry {
    CatalogEntry {
        field,
        mutator: mutator.name(),
        probability: mutator.probability(),
        operators: mutator
            .weights()
            .into_iter()
            .map(|(name, weight)| OperatorWeight { name, weight })
            .collect(),
    }
}

/// Every enabled mutator of `engine`, status code first, then headers, then body kinds.
pub fn catalog(engine: &HttpMutatorEngine) -> Vec<CatalogEntry> {
    let mut out = Vec::new();

    if let Some(status) = engine.status() {
        out.push(entry(Field::StatusCode, status));
    }

    for component in HeaderComponent::ALL {
        if let Some(mutator) = engine.headers().get(component) {
            out.push(entry(Field::Headers, mutator));
        }
    }

    if let Some(body) = engine.body() {
        out.extend(body.iter().map(|m| entry(Field::Body, m)));
    }

    out
}

/// Human-readable catalog listing.
pub fn format_catalog(entries: &[CatalogEntry]) -> String {
    let mut lines = Vec::new();

    for e in entries {
        lines.push(format!(
            "{field}/{mutator} (probability {p})",
            field = e.field.key(),
            mutator = e.mutator,
            p = e.probability
        ));
        for op in &e.operators {
            lines.push(format!("  {:<22} {}", op.name, op.weight));
        }
    }

    lines.join("\n")
}

/// Human-readable summary of a `mutate` run.
pub fn format_summary(summary: &BatchSummary) -> String {
    let mut lines = vec![
        "--- mutation summary ---".to_string(),
        format!("responses:          {}", summary.responses),
        format!("skipped lines:      {}", summary.skipped),
        format!("mutant groups:      {}", summary.groups),
        format!("mutants generated:  {}", summary.generated),
        format!("mutants selected:   {}", summary.selected),
    ];

    if !summary.usage.is_empty() {
        lines.push("--- operator usage ---".to_string());
        lines.extend(
            summary
                .usage
                .iter()
                .map(|(key, count)| format!("{key}: {count}")),
        );
    }

    lines.join("\n")
}
