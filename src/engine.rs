use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::body::BodyMutators;
use crate::body::walker::BodyWalker;
use crate::config::MutatorConfig;
use crate::error::{MutationError, Result};
use crate::headers::{HeaderMutators, HeaderTarget};
use crate::mutant::{Field, MutantGroup, MutationOperator};
use crate::operator::{Level, NodeMutator, TypeMutator};
use crate::random::MutationContext;
use crate::status::{StatusCodeOperator, status_code_mutator};

/// How mutants are derived from one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every enabled operator at every location, one mutant each.
    Exhaustive,
    /// One weighted mutation at one uniformly chosen location.
    Single,
    /// Many body nodes mutated at once, one mutant per response.
    Multiple,
}

/// Counts for one `generate` call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GenerationSummary {
    pub groups: usize,
    pub mutants: usize,
}

/// A validated view of a response document.
#[derive(Debug, Clone, Copy)]
struct Response<'a> {
    status: i64,
    headers: &'a Map<String, Value>,
    body: &'a Value,
}

impl<'a> Response<'a> {
    fn validate(document: &'a Value) -> Result<Self> {
        let fields = document
            .as_object()
            .ok_or_else(|| MutationError::Validation("response must be a JSON object".into()))?;

        let status = fields
            .get(Field::StatusCode.key())
            .ok_or_else(|| MutationError::Validation("missing `Status Code`".into()))?
            .as_i64()
            .ok_or_else(|| MutationError::Validation("`Status Code` must be an integer".into()))?;

        let headers = fields
            .get(Field::Headers.key())
            .ok_or_else(|| MutationError::Validation("missing `Headers`".into()))?
            .as_object()
            .ok_or_else(|| MutationError::Validation("`Headers` must be an object".into()))?;

        if let Some((name, _)) = headers.iter().find(|(_, v)| !v.is_string()) {
            return Err(MutationError::Validation(format!(
                "header `{name}` must be a string"
            )));
        }

        let body = fields
            .get(Field::Body.key())
            .ok_or_else(|| MutationError::Validation("missing `Body`".into()))?;

        Ok(Self {
            status,
            headers,
            body,
        })
    }
}

/// Copy of `document` with one top-level field replaced.
fn with_field(document: &Value, field: Field, value: Value) -> Value {
    let mut out = document.clone();
    if let Some(fields) = out.as_object_mut() {
        fields.insert(field.key().to_string(), value);
    }
    out
}

/// Composes status-code, header and body mutation into one stream of mutant groups.
///
/// Mutators are built once from the configuration; the engine holds no
/// per-run state, so one engine can serve any number of `generate` calls.
#[derive(Debug, Clone)]
pub struct HttpMutatorEngine {
    status: Option<TypeMutator<StatusCodeOperator>>,
    headers: HeaderMutators,
    body: Option<BodyMutators>,
}

impl HttpMutatorEngine {
    pub fn new(config: &MutatorConfig) -> Result<Self> {
        let status = if config.status_code.enabled {
            Some(status_code_mutator(&config.status_code)?)
        } else {
            None
        };

        let body = if config.body.enabled {
            Some(BodyMutators::from_config(&config.body)?)
        } else {
            None
        };

        Ok(Self {
            status,
            headers: HeaderMutators::from_config(&config.headers)?,
            body,
        })
    }

    pub fn status(&self) -> Option<&TypeMutator<StatusCodeOperator>> {
        self.status.as_ref()
    }

    pub fn headers(&self) -> &HeaderMutators {
        &self.headers
    }

    pub fn body(&self) -> Option<&BodyMutators> {
        self.body.as_ref()
    }

    /// Parse `text` as a response document and generate its mutants.
    pub fn generate_str<F>(
        &self,
        text: &str,
        mode: Mode,
        ctx: &mut MutationContext,
        sink: F,
    ) -> Result<GenerationSummary>
    where
        F: FnMut(MutantGroup) -> anyhow::Result<()>,
    {
        let document: Value = serde_json::from_str(text)?;
        self.generate(&document, mode, ctx, sink)
    }

    /// Generate the mutants of `response`, pushing each group into `sink`.
    ///
    /// `response` is never modified. A sink error stops generation and is
    /// returned as [`MutationError::Sink`].
    pub fn generate<F>(
        &self,
        response: &Value,
        mode: Mode,
        ctx: &mut MutationContext,
        mut sink: F,
    ) -> Result<GenerationSummary>
    where
        F: FnMut(MutantGroup) -> anyhow::Result<()>,
    {
        let parsed = Response::validate(response)?;
        let mut summary = GenerationSummary::default();

        let mut emit = |group: MutantGroup| -> Result<()> {
            if group.is_empty() {
                return Ok(());
            }
            debug!(
                "{} mutants from {} ({:?})",
                group.len(),
                group.origin_path,
                group.field
            );
            summary.groups += 1;
            summary.mutants += group.len();
            sink(group).map_err(MutationError::Sink)
        };

        match mode {
            Mode::Exhaustive => self.exhaustive(response, parsed, ctx, &mut emit)?,
            Mode::Single => self.single(response, parsed, ctx, &mut emit)?,
            Mode::Multiple => self.multiple(response, parsed, ctx, &mut emit)?,
        }

        Ok(summary)
    }

    fn exhaustive(
        &self,
        document: &Value,
        response: Response<'_>,
        ctx: &mut MutationContext,
        emit: &mut dyn FnMut(MutantGroup) -> Result<()>,
    ) -> Result<()> {
        if let Some(status) = &self.status {
            let mut group = MutantGroup::new(Field::StatusCode, Field::StatusCode.root_path());
            for operator in status.operator_names(Level::Element) {
                if !ctx.chance(status.probability()) {
                    continue;
                }
                match status.apply_named(operator, Value::from(response.status), ctx) {
                    Ok(code) => group.push(
                        with_field(document, Field::StatusCode, code),
                        MutationOperator::new(status.name(), operator),
                    ),
                    Err(e) if e.is_per_mutant() => warn!("skipping status mutant: {e}"),
                    Err(e) => return Err(e),
                }
            }
            if !group.is_empty() {
                emit(group)?;
            }
        }

        for target in self.headers.targets(response.headers) {
            let mut group = MutantGroup::new(Field::Headers, target.origin_path());
            let mutator = target.mutator();
            for operator in target.operator_names() {
                if !ctx.chance(mutator.probability()) {
                    continue;
                }
                match target.apply(response.headers, operator, ctx) {
                    Ok(headers) => group.push(
                        with_field(document, Field::Headers, Value::Object(headers)),
                        MutationOperator::new(mutator.name(), operator),
                    ),
                    Err(e) if e.is_per_mutant() => {
                        warn!("skipping header mutant at {}: {e}", group.origin_path)
                    }
                    Err(e) => return Err(e),
                }
            }
            if !group.is_empty() {
                emit(group)?;
            }
        }

        if let Some(body) = &self.body {
            let root = Field::Body.root_path();
            BodyWalker::new(body).exhaustive(response.body, ctx, &mut |pointer, mutants| {
                let mut group = MutantGroup::new(Field::Body, format!("{root}{pointer}"));
                for m in mutants {
                    group.push(
                        with_field(document, Field::Body, m.body),
                        MutationOperator::new(m.mutator, m.operator),
                    );
                }
                emit(group)
            })?;
        }

        Ok(())
    }

    fn single(
        &self,
        document: &Value,
        response: Response<'_>,
        ctx: &mut MutationContext,
        emit: &mut dyn FnMut(MutantGroup) -> Result<()>,
    ) -> Result<()> {
        enum Slot<'t> {
            Status,
            Header(&'t HeaderTarget),
            Body(usize),
        }

        let targets = self.headers.targets(response.headers);
        let mut slots: Vec<Slot<'_>> = Vec::new();

        if self
            .status
            .as_ref()
            .is_some_and(|s| !s.operator_names(Level::Element).is_empty())
        {
            slots.push(Slot::Status);
        }
        slots.extend(
            targets
                .iter()
                .filter(|t| !t.operator_names().is_empty())
                .map(Slot::Header),
        );
        if let Some(body) = &self.body {
            let positions = BodyWalker::new(body).candidates(response.body);
            slots.extend((0..positions).map(Slot::Body));
        }

        if slots.is_empty() {
            debug!("no enabled mutation candidates in response");
            return Ok(());
        }

        match &slots[ctx.index(slots.len())] {
            Slot::Status => {
                let Some(status) = &self.status else {
                    return Ok(());
                };
                let applied =
                    status.apply_weighted(Value::from(response.status), Level::Element, ctx);
                if let Some((operator, code)) = skip_unsupported(applied, "/Status Code")? {
                    let mut group =
                        MutantGroup::new(Field::StatusCode, Field::StatusCode.root_path());
                    group.push(
                        with_field(document, Field::StatusCode, code),
                        MutationOperator::new(status.name(), operator),
                    );
                    emit(group)?;
                }
            }
            Slot::Header(target) => {
                let origin = target.origin_path();
                let applied = target.apply_weighted(response.headers, ctx);
                if let Some((operator, headers)) = skip_unsupported(applied, &origin)? {
                    let mut group = MutantGroup::new(Field::Headers, origin);
                    group.push(
                        with_field(document, Field::Headers, Value::Object(headers)),
                        MutationOperator::new(target.mutator().name(), operator),
                    );
                    emit(group)?;
                }
            }
            Slot::Body(position) => {
                let Some(body) = &self.body else {
                    return Ok(());
                };
                if let Some(m) = BodyWalker::new(body).mutate_position(response.body, *position, ctx)?
                {
                    let mut group = MutantGroup::new(
                        Field::Body,
                        format!("{}{}", Field::Body.root_path(), m.pointer),
                    );
                    group.push(
                        with_field(document, Field::Body, m.body),
                        MutationOperator::new(m.mutator, m.operator),
                    );
                    emit(group)?;
                }
            }
        }

        Ok(())
    }

    fn multiple(
        &self,
        document: &Value,
        response: Response<'_>,
        ctx: &mut MutationContext,
        emit: &mut dyn FnMut(MutantGroup) -> Result<()>,
    ) -> Result<()> {
        let Some(body) = &self.body else {
            return Ok(());
        };

        if let Some((mutated, applied)) = BodyWalker::new(body).multiple(response.body, ctx)? {
            debug!("multiple-order mutation changed {applied} body nodes");
            let mut group = MutantGroup::new(Field::Body, Field::Body.root_path());
            group.push(
                with_field(document, Field::Body, mutated),
                MutationOperator::new("body", "multipleOrder"),
            );
            emit(group)?;
        }

        Ok(())
    }
}

fn skip_unsupported<T>(result: Result<Option<T>>, origin: &str) -> Result<Option<T>> {
    match result {
        Err(e) if e.is_per_mutant() => {
            warn!("skipping mutant at {origin}: {e}");
            Ok(None)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response() -> Value {
        json!({
            "Status Code": 200,
            "Headers": {"Content-Type": "application/json; charset=UTF-8"},
            "Body": {"id": 1, "name": "n"}
        })
    }

    fn collect(engine: &HttpMutatorEngine, doc: &Value, mode: Mode, seed: u64) -> Vec<MutantGroup> {
        let mut ctx = MutationContext::seeded(seed);
        let mut groups = Vec::new();
        engine
            .generate(doc, mode, &mut ctx, |g| {
                groups.push(g);
                Ok(())
            })
            .unwrap();
        groups
    }

    #[test]
    fn exhaustive_orders_fields_status_headers_body() {
        let engine = HttpMutatorEngine::new(&MutatorConfig::default()).unwrap();
        let groups = collect(&engine, &response(), Mode::Exhaustive, 1);

        let origins: Vec<&str> = groups.iter().map(|g| g.origin_path.as_str()).collect();
        assert_eq!(
            origins,
            vec![
                "/Status Code",
                "/Headers/Content-Type",
                "/Headers/Content-Type",
                "/Body",
                "/Body/id",
                "/Body/name"
            ]
        );

        let counts: Vec<usize> = groups.iter().map(MutantGroup::len).collect();
        assert_eq!(counts, vec![3, 2, 2, 3, 3, 6]);
    }

    #[test]
    fn validation_errors_produce_no_mutants() {
        let engine = HttpMutatorEngine::new(&MutatorConfig::default()).unwrap();
        let mut ctx = MutationContext::seeded(0);

        for bad in [
            json!([]),
            json!({"Headers": {}, "Body": null}),
            json!({"Status Code": "200", "Headers": {}, "Body": null}),
            json!({"Status Code": 200, "Headers": {"X": 1}, "Body": null}),
            json!({"Status Code": 200, "Headers": {}}),
        ] {
            let mut calls = 0;
            let err = engine
                .generate(&bad, Mode::Exhaustive, &mut ctx, |_| {
                    calls += 1;
                    Ok(())
                })
                .unwrap_err();
            assert!(matches!(err, MutationError::Validation(_)), "{bad}: {err:?}");
            assert_eq!(calls, 0);
        }
    }

    #[test]
    fn unparseable_text_is_a_parse_error() {
        let engine = HttpMutatorEngine::new(&MutatorConfig::default()).unwrap();
        let mut ctx = MutationContext::seeded(0);
        let err = engine
            .generate_str("{not json", Mode::Single, &mut ctx, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, MutationError::Parse(_)));
    }

    #[test]
    fn sink_error_stops_generation() {
        let engine = HttpMutatorEngine::new(&MutatorConfig::default()).unwrap();
        let mut ctx = MutationContext::seeded(0);
        let mut calls = 0;
        let err = engine
            .generate(&response(), Mode::Exhaustive, &mut ctx, |_| {
                calls += 1;
                anyhow::bail!("disk full")
            })
            .unwrap_err();
        assert!(matches!(err, MutationError::Sink(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn single_mode_emits_at_most_one_mutant() {
        let engine = HttpMutatorEngine::new(&MutatorConfig::default()).unwrap();
        for seed in 0..30 {
            let groups = collect(&engine, &response(), Mode::Single, seed);
            let total: usize = groups.iter().map(MutantGroup::len).sum();
            assert!(total <= 1);
        }
    }

    #[test]
    fn disabled_fields_are_not_mutated() {
        let config = MutatorConfig::from_json_str(
            r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false } }"#,
        )
        .unwrap();
        let engine = HttpMutatorEngine::new(&config).unwrap();
        let groups = collect(&engine, &response(), Mode::Exhaustive, 2);
        assert!(groups.iter().all(|g| g.field == Field::Body));
    }

    #[test]
    fn status_probability_gates_exhaustive_mutants() {
        let config = MutatorConfig::from_json_str(
            r#"{ "statusCode": { "probability": 0.0 }, "headers": { "enabled": false },
                 "body": { "enabled": false } }"#,
        )
        .unwrap();
        let engine = HttpMutatorEngine::new(&config).unwrap();
        assert_eq!(engine.status().unwrap().probability(), 0.0);
        assert!(collect(&engine, &response(), Mode::Exhaustive, 5).is_empty());

        let bad = MutatorConfig::from_json_str(r#"{ "statusCode": { "probability": 2.0 } }"#)
            .unwrap();
        assert!(matches!(
            HttpMutatorEngine::new(&bad),
            Err(MutationError::Config(_))
        ));
    }

    #[test]
    fn multiple_mode_labels_whole_body() {
        let config = MutatorConfig::from_json_str(r#"{ "body": { "multipleOrderProbability": 1.0 } }"#)
            .unwrap();
        let engine = HttpMutatorEngine::new(&config).unwrap();
        let groups = collect(&engine, &response(), Mode::Multiple, 8);

        assert_eq!(groups.len(), 1);
        let mutant = &groups[0].mutants[0];
        assert_eq!(mutant.origin_path, "/Body");
        assert_eq!(mutant.operator, MutationOperator::new("body", "multipleOrder"));
        assert_eq!(mutant.document["Status Code"], json!(200));
    }
}
