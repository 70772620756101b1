//! OTLP/HTTP JSON export structures

use serde::Serialize;

use super::tracer::{FinishedSpan, TagValue};

/// OTLP `SPAN_KIND_INTERNAL`
const SPAN_KIND_INTERNAL: i32 = 1;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTraceServiceRequest {
    pub resource_spans: Vec<ResourceSpans>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpans {
    pub resource: Resource,
    pub scope_spans: Vec<ScopeSpans>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeSpans {
    pub scope: InstrumentationScope,
    pub spans: Vec<Span>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationScope {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub name: String,
    pub kind: i32,
    pub start_time_unix_nano: String,
    pub end_time_unix_nano: String,
    pub attributes: Vec<KeyValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnyValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub int_value: Option<String>, // OTLP sends as string
    #[serde(skip_serializing_if = "Option::is_none")]
    pub double_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
}

impl From<&TagValue> for AnyValue {
    fn from(value: &TagValue) -> Self {
        match value {
            TagValue::String(s) => AnyValue {
                string_value: Some(s.clone()),
                ..Default::default()
            },
            TagValue::Int(i) => AnyValue {
                int_value: Some(i.to_string()),
                ..Default::default()
            },
            TagValue::Float(f) => AnyValue {
                double_value: Some(*f),
                ..Default::default()
            },
            TagValue::Bool(b) => AnyValue {
                bool_value: Some(*b),
                ..Default::default()
            },
        }
    }
}

impl KeyValue {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AnyValue {
                string_value: Some(value.into()),
                ..Default::default()
            },
        }
    }
}

impl From<&FinishedSpan> for Span {
    fn from(span: &FinishedSpan) -> Self {
        Self {
            trace_id: span.context.trace_id.clone(),
            span_id: span.context.span_id.clone(),
            parent_span_id: span.parent.as_ref().map(|p| p.span_id.clone()),
            name: span.name.clone(),
            kind: SPAN_KIND_INTERNAL,
            start_time_unix_nano: unix_nanos(span.start_time),
            end_time_unix_nano: unix_nanos(span.end_time),
            attributes: span
                .tags
                .iter()
                .map(|(key, value)| KeyValue {
                    key: key.clone(),
                    value: value.into(),
                })
                .collect(),
        }
    }
}

fn unix_nanos(time: chrono::DateTime<chrono::Utc>) -> String {
    time.timestamp_nanos_opt().unwrap_or_default().to_string()
}

impl ExportTraceServiceRequest {
    /// Wrap a batch of spans under a single resource and scope
    pub fn new(service_name: &str, spans: &[FinishedSpan]) -> Self {
        Self {
            resource_spans: vec![ResourceSpans {
                resource: Resource {
                    attributes: vec![KeyValue::string("service.name", service_name)],
                },
                scope_spans: vec![ScopeSpans {
                    scope: InstrumentationScope {
                        name: env!("CARGO_PKG_NAME").to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                    spans: spans.iter().map(Span::from).collect(),
                }],
            }],
        }
    }
}
