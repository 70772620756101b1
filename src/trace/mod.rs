//! Span emission for reconstructed CI traces
//!
//! The ingester only talks to the [`Tracer`] capability: open a span with an
//! explicit start time and tags, optionally under a parent, then finish it
//! with an explicit end time. Backends:
//!
//! - `otlp`: batches finished spans and exports them over OTLP/HTTP JSON
//!   (any collector accepting OTLP, e.g. Jaeger or the OTel Collector)
//! - `log`: writes one structured log event per finished span
//!
//! [`RecordingTracer`] keeps spans in memory and backs the test suite.

mod backend;
mod log;
mod model;
mod otlp;
mod recording;
mod tracer;

pub use backend::{BackendKind, TracerBackend, TracerConfig};
pub use log::LogTracer;
pub use model::ExportTraceServiceRequest;
pub use otlp::{OtlpConfig, OtlpTracer};
pub use recording::{RecordingTracer, SpanEvent};
pub use tracer::{
    generate_span_id, generate_trace_id, FinishedSpan, PendingSpans, SpanContext, SpanOptions,
    TagValue, Tags, Tracer, TracerError,
};
