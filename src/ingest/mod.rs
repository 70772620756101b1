//! Pipeline trace reconstruction
//!
//! Turns a decoded pipeline hook into a span tree:
//!
//! ```text
//! gitlab-pipeline  created_at ────────────────────────── finished_at
//!   gitlab-job          started_at ──── finished_at
//!   gitlab-job                      started_at ─── finished_at
//! ```
//!
//! Jobs without both `started_at` and `finished_at` are not traced yet;
//! GitLab sends the hook again once they are done.

mod builder;
mod error;
mod tags;

pub use builder::{IngestSummary, JobFailure, JobOutcome, PipelineIngester, JOB_SPAN, PIPELINE_SPAN};
pub use error::{IngestError, JobError};
pub use tags::{job_tags, pipeline_tags};
