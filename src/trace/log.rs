//! Tracer writing finished spans to the application log

use chrono::{DateTime, Utc};

use super::tracer::{FinishedSpan, PendingSpans, SpanContext, SpanOptions, Tracer, TracerError};

/// Emits one log event per finished span
#[derive(Debug, Default)]
pub struct LogTracer {
    pending: PendingSpans,
}

impl LogTracer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tracer for LogTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> Result<SpanContext, TracerError> {
        Ok(self.pending.open(name, options))
    }

    fn finish_span(
        &self,
        context: &SpanContext,
        end_time: DateTime<Utc>,
    ) -> Result<(), TracerError> {
        let span = self.pending.close(context, end_time)?;
        log_span(&span);
        Ok(())
    }
}

fn log_span(span: &FinishedSpan) {
    let tags = span
        .tags
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ");

    tracing::info!(
        target: "ci_tracer::spans",
        trace_id = %span.context.trace_id,
        span_id = %span.context.span_id,
        parent_span_id = %span.parent.as_ref().map(|p| p.span_id.as_str()).unwrap_or(""),
        span_name = %span.name,
        start = %span.start_time.to_rfc3339(),
        end = %span.end_time.to_rfc3339(),
        duration_ms = span.duration_ms(),
        tags = %tags,
        "span finished"
    );
}
