//! Span capability consumed by the ingester

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag value attached to a span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::String(s) => write!(f, "{}", s),
            TagValue::Int(i) => write!(f, "{}", i),
            TagValue::Float(v) => write!(f, "{}", v),
            TagValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::String(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::String(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Float(value)
    }
}

/// String-keyed span tags, ordered for stable output
pub type Tags = BTreeMap<String, TagValue>;

/// Opaque identity of an emitted span
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanContext {
    /// 32 hex character trace ID
    pub trace_id: String,
    /// 16 hex character span ID
    pub span_id: String,
}

impl SpanContext {
    /// Context for a new root span
    pub fn new_root() -> Self {
        Self {
            trace_id: generate_trace_id(),
            span_id: generate_span_id(),
        }
    }

    /// Context for a new span in the same trace as `parent`
    pub fn new_child(parent: &SpanContext) -> Self {
        Self {
            trace_id: parent.trace_id.clone(),
            span_id: generate_span_id(),
        }
    }
}

/// Options for opening a span retroactively
#[derive(Debug, Clone)]
pub struct SpanOptions {
    pub start_time: DateTime<Utc>,
    pub parent: Option<SpanContext>,
    pub tags: Tags,
}

impl SpanOptions {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            parent: None,
            tags: Tags::new(),
        }
    }

    pub fn with_parent(mut self, parent: &SpanContext) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Tracing backend capability.
///
/// Spans are opened with an explicit start time and closed later with an
/// explicit end time; nothing is measured from the wall clock.
pub trait Tracer: Send + Sync {
    fn start_span(&self, name: &str, options: SpanOptions) -> Result<SpanContext, TracerError>;

    fn finish_span(&self, context: &SpanContext, end_time: DateTime<Utc>)
        -> Result<(), TracerError>;
}

/// A span that has been opened and closed
#[derive(Debug, Clone, PartialEq)]
pub struct FinishedSpan {
    pub context: SpanContext,
    pub parent: Option<SpanContext>,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub tags: Tags,
}

impl FinishedSpan {
    pub fn duration_ms(&self) -> i64 {
        (self.end_time - self.start_time).num_milliseconds()
    }
}

#[derive(Debug, Clone)]
struct OpenSpan {
    parent: Option<SpanContext>,
    name: String,
    start_time: DateTime<Utc>,
    tags: Tags,
}

/// Spans opened but not yet finished, keyed by span ID
#[derive(Debug, Default)]
pub struct PendingSpans {
    spans: DashMap<String, (SpanContext, OpenSpan)>,
}

impl PendingSpans {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a context for a new span and remember it until it is closed
    pub fn open(&self, name: &str, options: SpanOptions) -> SpanContext {
        let context = match &options.parent {
            Some(parent) => SpanContext::new_child(parent),
            None => SpanContext::new_root(),
        };

        let span = OpenSpan {
            parent: options.parent,
            name: name.to_string(),
            start_time: options.start_time,
            tags: options.tags,
        };
        self.spans
            .insert(context.span_id.clone(), (context.clone(), span));

        context
    }

    /// Close a span previously returned by [`PendingSpans::open`]
    pub fn close(
        &self,
        context: &SpanContext,
        end_time: DateTime<Utc>,
    ) -> Result<FinishedSpan, TracerError> {
        let (_, (context, span)) = self
            .spans
            .remove(&context.span_id)
            .ok_or_else(|| TracerError::UnknownSpan(context.span_id.clone()))?;

        Ok(FinishedSpan {
            context,
            parent: span.parent,
            name: span.name,
            start_time: span.start_time,
            end_time,
            tags: span.tags,
        })
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Generate a new random trace ID (32 hex chars)
pub fn generate_trace_id() -> String {
    format!("{:032x}", rand::random::<u128>().max(1))
}

/// Generate a new random span ID (16 hex chars)
pub fn generate_span_id() -> String {
    format!("{:016x}", rand::random::<u64>().max(1))
}

#[derive(Debug, thiserror::Error)]
pub enum TracerError {
    #[error("Span '{0}' is not open")]
    UnknownSpan(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Tracer is shut down")]
    Closed,
}
