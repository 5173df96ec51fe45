use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::config::{HeaderComponentConfig, HeadersConfig};
use crate::error::{MutationError, Result};
use crate::operator::{Level, NodeMutator, Operator, TypeMutator, names};
use crate::pointer;
use crate::random::MutationContext;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const LOCATION: &str = "Location";

const MEDIA_TYPE_PREFIXES: [&str; 8] = [
    "application/",
    "audio/",
    "image/",
    "message/",
    "model/",
    "multipart/",
    "text/",
    "video/",
];

const MEDIA_TYPES: [&str; 8] = [
    "application/json",
    "application/xml",
    "application/octet-stream",
    "application/x-www-form-urlencoded",
    "multipart/form-data",
    "text/plain",
    "text/html",
    "image/png",
];

const CHARSETS: [&str; 5] = ["UTF-8", "UTF-16", "ISO-8859-1", "US-ASCII", "windows-1252"];

/// A `Content-Type` value split into media type, charset and remaining parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentType {
    pub media_type: Option<String>,
    pub charset: Option<String>,
    /// Other `;`-separated parts, verbatim.
    pub params: Vec<String>,
}

impl ContentType {
    pub fn parse(raw: &str) -> Self {
        let mut out = ContentType::default();

        for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let lower = part.to_ascii_lowercase();
            if let Some(value) = lower.strip_prefix("charset=") {
                let value = &part[part.len() - value.len()..];
                out.charset = Some(value.trim_matches('"').to_string());
            } else if out.media_type.is_none()
                && MEDIA_TYPE_PREFIXES.iter().any(|p| lower.starts_with(p))
            {
                out.media_type = Some(part.to_string());
            } else {
                out.params.push(part.to_string());
            }
        }

        out
    }

    /// `media; charset=x; k=v`; the empty string when nothing is left.
    pub fn render(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(media) = &self.media_type {
            parts.push(media.clone());
        }
        if let Some(charset) = &self.charset {
            parts.push(format!("charset={charset}"));
        }
        parts.extend(self.params.iter().cloned());
        parts.join("; ")
    }
}

/// The header parts that have their own mutator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderComponent {
    MediaType,
    Charset,
    Location,
}

impl HeaderComponent {
    pub const ALL: [HeaderComponent; 3] = [
        HeaderComponent::MediaType,
        HeaderComponent::Charset,
        HeaderComponent::Location,
    ];

    pub fn mutator_name(self) -> &'static str {
        match self {
            HeaderComponent::MediaType => "mediaType",
            HeaderComponent::Charset => "charset",
            HeaderComponent::Location => "location",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            HeaderComponent::MediaType | HeaderComponent::Charset => CONTENT_TYPE,
            HeaderComponent::Location => LOCATION,
        }
    }

    /// Current value of this component in a raw header value.
    fn read(self, raw: &str) -> Option<String> {
        match self {
            HeaderComponent::MediaType => ContentType::parse(raw).media_type,
            HeaderComponent::Charset => ContentType::parse(raw).charset,
            HeaderComponent::Location => Some(raw.to_string()),
        }
    }

    /// Header value with this component set to `value` (`None` removes it).
    /// `None` overall means the header should be dropped.
    fn write(self, raw: &str, value: Option<String>) -> Option<String> {
        let rendered = match self {
            HeaderComponent::MediaType => {
                let mut ct = ContentType::parse(raw);
                ct.media_type = value;
                ct.render()
            }
            HeaderComponent::Charset => {
                let mut ct = ContentType::parse(raw);
                ct.charset = value;
                ct.render()
            }
            HeaderComponent::Location => value.unwrap_or_default(),
        };

        (!rendered.is_empty()).then_some(rendered)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOperator {
    /// Another well-known media type.
    ReplaceMediaType,
    /// Another well-known charset.
    ReplaceCharset,
    /// Append a numeric path segment to the URI.
    MutateLocation,
    /// Remove the component.
    Null,
}

impl Operator for HeaderOperator {
    type Input = Option<String>;

    fn name(&self) -> &'static str {
        match self {
            HeaderOperator::ReplaceMediaType | HeaderOperator::ReplaceCharset => names::REPLACE,
            HeaderOperator::MutateLocation => names::MUTATE,
            HeaderOperator::Null => names::NULL,
        }
    }

    fn apply(&self, input: Option<String>, ctx: &mut MutationContext) -> Result<Value> {
        match self {
            HeaderOperator::ReplaceMediaType => {
                Ok(Value::String(pick_other(&MEDIA_TYPES, input.as_deref(), ctx)))
            }
            HeaderOperator::ReplaceCharset => {
                Ok(Value::String(pick_other(&CHARSETS, input.as_deref(), ctx)))
            }
            HeaderOperator::MutateLocation => {
                let Some(uri) = input else {
                    return Err(MutationError::unsupported(
                        "location",
                        names::MUTATE,
                        "Location header is absent",
                    ));
                };
                let segment = ctx.string_of(4, false, true);
                append_path_segment(&uri, &segment).map(Value::String)
            }
            HeaderOperator::Null => Ok(Value::Null),
        }
    }
}

fn pick_other(pool: &[&str], current: Option<&str>, ctx: &mut MutationContext) -> String {
    let choices: Vec<&str> = pool
        .iter()
        .copied()
        .filter(|c| current.is_none_or(|cur| !cur.eq_ignore_ascii_case(c)))
        .collect();
    choices[ctx.index(choices.len())].to_string()
}

/// Relative references are resolved against a placeholder origin and written
/// back without it.
fn append_path_segment(uri: &str, segment: &str) -> Result<String> {
    let unsupported =
        |reason: String| MutationError::unsupported("location", names::MUTATE, reason);

    let (mut url, relative) = match Url::parse(uri) {
        Ok(url) => (url, false),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = Url::parse("http://localhost/")
                .map_err(|e| unsupported(format!("invalid base URI: {e}")))?;
            let url = base
                .join(uri)
                .map_err(|e| unsupported(format!("unparseable URI {uri:?}: {e}")))?;
            (url, true)
        }
        Err(e) => return Err(unsupported(format!("unparseable URI {uri:?}: {e}"))),
    };

    url.path_segments_mut()
        .map_err(|()| unsupported(format!("URI {uri:?} cannot carry a path")))?
        .pop_if_empty()
        .push(segment);

    if relative {
        Ok(url[url::Position::BeforePath..].to_string())
    } else {
        Ok(url.to_string())
    }
}

/// Header mutators built from configuration. `None` means disabled.
#[derive(Debug, Clone)]
pub struct HeaderMutators {
    media_type: Option<TypeMutator<HeaderOperator>>,
    charset: Option<TypeMutator<HeaderOperator>>,
    location: Option<TypeMutator<HeaderOperator>>,
}

impl HeaderMutators {
    pub fn from_config(config: &HeadersConfig) -> Result<Self> {
        let build = |component: HeaderComponent,
                     section: &HeaderComponentConfig,
                     catalog: Vec<(f32, HeaderOperator)>|
         -> Result<Option<TypeMutator<HeaderOperator>>> {
            if !config.enabled || !section.enabled {
                return Ok(None);
            }
            TypeMutator::new(
                component.mutator_name(),
                section.probability,
                &section.weights,
                catalog,
            )
            .map(Some)
        };

        Ok(Self {
            media_type: build(
                HeaderComponent::MediaType,
                &config.media_type,
                vec![(0.5, HeaderOperator::ReplaceMediaType), (0.5, HeaderOperator::Null)],
            )?,
            charset: build(
                HeaderComponent::Charset,
                &config.charset,
                vec![(0.5, HeaderOperator::ReplaceCharset), (0.5, HeaderOperator::Null)],
            )?,
            location: build(
                HeaderComponent::Location,
                &config.location,
                vec![(0.5, HeaderOperator::MutateLocation), (0.5, HeaderOperator::Null)],
            )?,
        })
    }

    pub fn get(&self, component: HeaderComponent) -> Option<&TypeMutator<HeaderOperator>> {
        match component {
            HeaderComponent::MediaType => self.media_type.as_ref(),
            HeaderComponent::Charset => self.charset.as_ref(),
            HeaderComponent::Location => self.location.as_ref(),
        }
    }

    /// The component mutators that apply to one response's headers.
    ///
    /// A component is targeted only when its header exists; its `null`
    /// operator is kept only when the component itself is present.
    pub fn targets(&self, headers: &Map<String, Value>) -> Vec<HeaderTarget> {
        let mut out = Vec::new();

        for component in HeaderComponent::ALL {
            let Some(mutator) = self.get(component) else {
                continue;
            };
            let Some((name, raw)) = find_header(headers, component.header()) else {
                continue;
            };

            let current = component.read(raw);
            let mut mutator = mutator.clone();
            if current.is_none() {
                mutator.remove(names::NULL);
            }

            out.push(HeaderTarget {
                component,
                header: name.to_string(),
                current,
                mutator,
            });
        }

        out
    }
}

fn find_header<'h>(headers: &'h Map<String, Value>, wanted: &str) -> Option<(&'h str, &'h str)> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .and_then(|(name, value)| value.as_str().map(|v| (name.as_str(), v)))
}

/// One header component of one response, with its presence-gated mutator.
#[derive(Debug, Clone)]
pub struct HeaderTarget {
    pub component: HeaderComponent,
    /// Header name as spelled in the response.
    pub header: String,
    current: Option<String>,
    mutator: TypeMutator<HeaderOperator>,
}

impl HeaderTarget {
    pub fn origin_path(&self) -> String {
        pointer::child("/Headers", &self.header)
    }

    pub fn mutator(&self) -> &TypeMutator<HeaderOperator> {
        &self.mutator
    }

    pub fn operator_names(&self) -> Vec<&'static str> {
        self.mutator.operator_names(Level::Element)
    }

    /// Headers with `operator` applied to this component.
    pub fn apply(
        &self,
        headers: &Map<String, Value>,
        operator: &str,
        ctx: &mut MutationContext,
    ) -> Result<Map<String, Value>> {
        let value = self.mutator.apply_named(operator, self.current_value(), ctx)?;
        Ok(self.rewrite(headers, value))
    }

    /// Headers with one weighted operator applied, and that operator's name.
    pub fn apply_weighted(
        &self,
        headers: &Map<String, Value>,
        ctx: &mut MutationContext,
    ) -> Result<Option<(&'static str, Map<String, Value>)>> {
        let Some((operator, value)) =
            self.mutator
                .apply_weighted(self.current_value(), Level::Element, ctx)?
        else {
            return Ok(None);
        };
        Ok(Some((operator, self.rewrite(headers, value))))
    }

    fn current_value(&self) -> Value {
        self.current.clone().map(Value::String).unwrap_or(Value::Null)
    }

    fn rewrite(&self, headers: &Map<String, Value>, value: Value) -> Map<String, Value> {
        let raw = headers
            .get(&self.header)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let component = match value {
            Value::String(s) => Some(s),
            _ => None,
        };

        match self.component.write(raw, component) {
            Some(updated) => {
                let mut out = headers.clone();
                out.insert(self.header.clone(), Value::String(updated));
                out
            }
            None => headers
                .iter()
                .filter(|(name, _)| **name != self.header)
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn content_type_parse_and_render() {
        let ct = ContentType::parse("application/json; charset=UTF-8; boundary=x");
        assert_eq!(ct.media_type.as_deref(), Some("application/json"));
        assert_eq!(ct.charset.as_deref(), Some("UTF-8"));
        assert_eq!(ct.params, vec!["boundary=x".to_string()]);
        assert_eq!(ct.render(), "application/json; charset=UTF-8; boundary=x");

        let only_charset = ContentType::parse("Charset=\"latin1\"");
        assert_eq!(only_charset.media_type, None);
        assert_eq!(only_charset.charset.as_deref(), Some("latin1"));
    }

    #[test]
    fn null_is_gated_on_component_presence() {
        let mutators = HeaderMutators::from_config(&HeadersConfig::default()).unwrap();
        let targets = mutators.targets(&headers(json!({"content-type": "application/json"})));

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].component, HeaderComponent::MediaType);
        assert_eq!(targets[0].operator_names(), vec!["replace", "null"]);
        assert_eq!(targets[1].component, HeaderComponent::Charset);
        assert_eq!(targets[1].operator_names(), vec!["replace"]);
        assert_eq!(targets[0].origin_path(), "/Headers/content-type");
    }

    #[test]
    fn removing_last_component_drops_header() {
        let mutators = HeaderMutators::from_config(&HeadersConfig::default()).unwrap();
        let original = headers(json!({"Content-Type": "text/plain", "X-Id": "1"}));
        let targets = mutators.targets(&original);
        let mut ctx = MutationContext::seeded(0);

        let out = targets[0].apply(&original, names::NULL, &mut ctx).unwrap();
        assert_eq!(Value::Object(out), json!({"X-Id": "1"}));
    }

    #[test]
    fn charset_replace_rebuilds_header() {
        let mutators = HeaderMutators::from_config(&HeadersConfig::default()).unwrap();
        let original = headers(json!({"Content-Type": "application/json; charset=UTF-8"}));
        let targets = mutators.targets(&original);
        let mut ctx = MutationContext::seeded(5);

        let out = targets[1].apply(&original, names::REPLACE, &mut ctx).unwrap();
        let value = out["Content-Type"].as_str().unwrap();
        assert!(value.starts_with("application/json; charset="));
        assert_ne!(value, "application/json; charset=UTF-8");
    }

    #[test]
    fn location_mutate_appends_segment() {
        assert_eq!(
            append_path_segment("https://api.test/users/1", "42").unwrap(),
            "https://api.test/users/1/42"
        );
        assert_eq!(
            append_path_segment("https://api.test/users/", "42").unwrap(),
            "https://api.test/users/42"
        );
        assert_eq!(append_path_segment("/users/1?x=1", "7").unwrap(), "/users/1/7?x=1");
    }

    #[test]
    fn unusable_location_is_unsupported() {
        let err = append_path_segment("mailto:someone@example.com", "1").unwrap_err();
        assert!(err.is_per_mutant());
    }

    #[test]
    fn disabled_headers_have_no_targets() {
        let config = HeadersConfig {
            enabled: false,
            ..HeadersConfig::default()
        };
        let mutators = HeaderMutators::from_config(&config).unwrap();
        let original = headers(json!({"Location": "/a", "Content-Type": "text/plain"}));
        assert!(mutators.targets(&original).is_empty());
    }
}
