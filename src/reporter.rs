use std::collections::BTreeMap;

use serde::Serialize;

use crate::mutant::Mutant;

/// Observes every selected mutant, then a final `finished` signal.
pub trait MutantReporter {
    fn on_mutant(&mut self, original_id: u64, mutant: &Mutant);

    fn on_finished(&mut self);
}

/// Counts selected mutants per `mutator/operator` and per field.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct UsageReporter {
    pub selected: u64,
    pub by_operator: BTreeMap<String, u64>,
    pub by_field: BTreeMap<String, u64>,
    pub finished: bool,
}

impl MutantReporter for UsageReporter {
    fn on_mutant(&mut self, _original_id: u64, mutant: &Mutant) {
        self.selected += 1;
        *self.by_operator.entry(mutant.operator.key()).or_insert(0) += 1;
        *self
            .by_field
            .entry(mutant.field.key().to_string())
            .or_insert(0) += 1;
    }

    fn on_finished(&mut self) {
        self.finished = true;
        log::info!("{} mutants selected", self.selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutant::{Field, MutationOperator};
    use serde_json::json;

    #[test]
    fn counts_by_operator_and_field() {
        let mut reporter = UsageReporter::default();
        let mutant = |field: Field, mutator, name| Mutant {
            document: json!({}),
            origin_path: field.root_path(),
            field,
            operator: MutationOperator::new(mutator, name),
        };

        reporter.on_mutant(0, &mutant(Field::Body, "string", "replace"));
        reporter.on_mutant(0, &mutant(Field::Body, "string", "replace"));
        reporter.on_mutant(1, &mutant(Field::StatusCode, "statusCode", "replaceWith50x"));
        reporter.on_finished();

        insta::assert_json_snapshot!(reporter, @r#"
        {
          "selected": 3,
          "by_operator": {
            "statusCode/replaceWith50x": 1,
            "string/replace": 2
          },
          "by_field": {
            "Body": 2,
            "Status Code": 1
          },
          "finished": true
        }
        "#);
    }
}
