//! In-memory tracer that records every span it is handed

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::tracer::{FinishedSpan, PendingSpans, SpanContext, SpanOptions, Tracer, TracerError};

/// Lifecycle event observed by a [`RecordingTracer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanEvent {
    Started(SpanContext),
    Finished(SpanContext),
}

/// Tracer keeping spans in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pending: PendingSpans,
    finished: Mutex<Vec<FinishedSpan>>,
    events: Mutex<Vec<SpanEvent>>,
    rejected_resources: Mutex<Vec<String>>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to open spans whose `resource.name` tag equals `resource`
    pub fn reject_resource(&self, resource: impl Into<String>) {
        self.rejected_resources.lock().push(resource.into());
    }

    /// Finished spans in the order they were closed
    pub fn finished_spans(&self) -> Vec<FinishedSpan> {
        self.finished.lock().clone()
    }

    /// Start and finish events in the order they happened
    pub fn events(&self) -> Vec<SpanEvent> {
        self.events.lock().clone()
    }

    /// Number of spans opened and never finished
    pub fn open_count(&self) -> usize {
        self.pending.len()
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> Result<SpanContext, TracerError> {
        let resource = options
            .tags
            .get("resource.name")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        if let Some(resource) = resource {
            if self.rejected_resources.lock().contains(&resource) {
                return Err(TracerError::Export(format!(
                    "span for '{}' rejected",
                    resource
                )));
            }
        }

        let context = self.pending.open(name, options);
        self.events.lock().push(SpanEvent::Started(context.clone()));
        Ok(context)
    }

    fn finish_span(
        &self,
        context: &SpanContext,
        end_time: DateTime<Utc>,
    ) -> Result<(), TracerError> {
        let span = self.pending.close(context, end_time)?;
        self.events.lock().push(SpanEvent::Finished(context.clone()));
        self.finished.lock().push(span);
        Ok(())
    }
}
