use thiserror::Error;

/// Errors produced while building mutators or generating mutants.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Input could not be parsed as JSON.
    #[error("failed to parse response document: {0}")]
    Parse(#[from] serde_json::Error),

    /// Input is JSON but does not have the expected response shape.
    #[error("invalid response document: {0}")]
    Validation(String),

    /// An operator was applied to a value outside its domain.
    #[error("unsupported element for {mutator}/{operator}: {reason}")]
    UnsupportedElement {
        mutator: &'static str,
        operator: &'static str,
        reason: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The consumer of mutant groups asked generation to stop.
    #[error("mutant sink failed: {0}")]
    Sink(#[source] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MutationError>;

impl MutationError {
    pub(crate) fn unsupported(
        mutator: &'static str,
        operator: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnsupportedElement {
            mutator,
            operator,
            reason: reason.into(),
        }
    }

    /// True for errors that only invalidate a single mutant.
    pub fn is_per_mutant(&self) -> bool {
        matches!(self, Self::UnsupportedElement { .. })
    }
}
