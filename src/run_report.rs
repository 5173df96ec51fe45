use std::path::PathBuf;

use serde::Serialize;

use http_mutant::Mode;
use http_mutant::pipeline::BatchSummary;
use http_mutant::reporter::UsageReporter;

/// Options a `mutate` run was started with.
#[derive(Debug, Clone, Serialize)]
pub struct RunSettings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub mode: Mode,
    pub strategy: &'static str,
    pub seed: u64,
}

/// Machine-readable report for a `mutate` run.
///
/// In `--json` mode we print this to stdout as pretty JSON.
#[derive(Debug, Serialize)]
pub struct GenerationReport {
    /// Tool name, stable across versions.
    pub tool: &'static str,

    /// Current crate version.
    pub version: &'static str,

    pub settings: RunSettings,

    /// Batch totals, including operator usage.
    pub summary: BatchSummary,

    /// Selected mutants per operator and field.
    pub selected: UsageReporter,

    /// Shard files written, in order.
    pub shards: Vec<PathBuf>,

    /// Optional high-level error message (for example an unreadable input file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationReport {
    pub fn success(
        settings: RunSettings,
        summary: BatchSummary,
        selected: UsageReporter,
        shards: Vec<PathBuf>,
    ) -> Self {
        Self {
            tool: "http-mutant",
            version: env!("CARGO_PKG_VERSION"),
            settings,
            summary,
            selected,
            shards,
            error: None,
        }
    }

    pub fn failure(settings: RunSettings, error: String) -> Self {
        Self {
            tool: "http-mutant",
            version: env!("CARGO_PKG_VERSION"),
            settings,
            summary: BatchSummary::default(),
            selected: UsageReporter::default(),
            shards: Vec::new(),
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RunSettings {
        RunSettings {
            input: PathBuf::from("responses.jsonl"),
            output: PathBuf::from("out"),
            mode: Mode::Single,
            strategy: "all",
            seed: 42,
        }
    }

    #[test]
    fn failure_report_carries_error() {
        let report = GenerationReport::failure(settings(), "boom".to_string());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["tool"], "http-mutant");
        assert_eq!(value["error"], "boom");
        assert_eq!(value["settings"]["mode"], "single");
        assert_eq!(value["summary"]["responses"], 0);
    }

    #[test]
    fn success_report_has_no_error_key() {
        let report = GenerationReport::success(
            settings(),
            BatchSummary::default(),
            UsageReporter::default(),
            vec![PathBuf::from("out/mutants-00000.jsonl")],
        );
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["shards"][0], "out/mutants-00000.jsonl");
    }
}
