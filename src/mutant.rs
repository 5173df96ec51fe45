use serde::Serialize;
use serde_json::Value;

/// Top-level part of an HTTP response that a mutant changes.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    #[serde(rename = "Status Code")]
    StatusCode,
    Headers,
    Body,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::StatusCode, Field::Headers, Field::Body];

    /// Key of this field in a response document.
    pub fn key(self) -> &'static str {
        match self {
            Field::StatusCode => "Status Code",
            Field::Headers => "Headers",
            Field::Body => "Body",
        }
    }

    /// Origin path of a mutation of the whole field, for example `/Body`.
    pub fn root_path(self) -> String {
        format!("/{}", self.key())
    }
}

/// Identifier for a specific mutation operator.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MutationOperator {
    /// Mutator the operator belongs to (for example `string` or `statusCode`).
    pub mutator: &'static str,

    /// Stable operator name (for example `replace`).
    pub name: &'static str,
}

impl MutationOperator {
    pub fn new(mutator: &'static str, name: &'static str) -> Self {
        Self { mutator, name }
    }

    /// `mutator/name`, the key used by usage counters.
    pub fn key(&self) -> String {
        format!("{}/{}", self.mutator, self.name)
    }
}

/// One mutated HTTP response.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Mutant {
    /// The full mutated response document.
    pub document: Value,

    /// Slash-delimited path of the changed element, for example `/Body/data/id`.
    pub origin_path: String,

    pub field: Field,

    /// Operator applied to create this mutant.
    pub operator: MutationOperator,
}

/// Mutants derived from one originating element.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MutantGroup {
    pub field: Field,

    /// Origin path shared by every mutant of the group.
    pub origin_path: String,

    pub mutants: Vec<Mutant>,
}

impl MutantGroup {
    pub fn new(field: Field, origin_path: String) -> Self {
        Self {
            field,
            origin_path,
            mutants: Vec::new(),
        }
    }

    pub fn push(&mut self, document: Value, operator: MutationOperator) {
        self.mutants.push(Mutant {
            document,
            origin_path: self.origin_path.clone(),
            field: self.field,
            operator,
        });
    }

    pub fn len(&self) -> usize {
        self.mutants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutants.is_empty()
    }
}
