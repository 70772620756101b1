//! ci-tracer: CI pipelines as distributed traces
//!
//! Receives GitLab pipeline webhooks and rebuilds each pipeline as a trace:
//! one root span for the pipeline and one child span per job, with start and
//! end times taken from the hook rather than the clock. Spans go to an OTLP
//! collector (Jaeger, OTel Collector, ...) or to the log.
//!
//! # Features
//!
//! - **Retroactive spans**: timing comes from `created_at`/`started_at`/`finished_at`
//! - **Searchable tags**: project, ref, sha, user, merge request, stage, runner
//! - **Per-job isolation**: one malformed job never drops the rest of the pipeline
//! - **Multiple instances**: one endpoint per configured GitLab instance
//!
//! # Example
//!
//! ```no_run
//! use ci_tracer::gitlab::decode_pipeline_hook;
//! use ci_tracer::ingest::PipelineIngester;
//! use ci_tracer::instances::Instance;
//! use ci_tracer::trace::{RecordingTracer, Tracer};
//! use std::sync::Arc;
//!
//! let tracer = Arc::new(RecordingTracer::new());
//! let ingester = PipelineIngester::new(Arc::clone(&tracer) as Arc<dyn Tracer>);
//!
//! let body = std::fs::read("pipeline_hook.json").unwrap();
//! let event = decode_pipeline_hook(&body).unwrap();
//! let summary = ingester.ingest_pipeline(&event, &Instance::new("gitlab-com")).unwrap();
//! println!("Traced {} jobs", summary.jobs_traced);
//! ```

pub mod api;
pub mod config;
pub mod gitlab;
pub mod ingest;
pub mod instances;
pub mod trace;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use gitlab::{decode_pipeline_hook, DecodeError, JobRecord, PipelineEvent};
pub use ingest::{IngestError, IngestSummary, JobError, PipelineIngester};
pub use instances::{Instance, InstanceRegistry};
pub use trace::{SpanContext, SpanOptions, Tracer, TracerError};
