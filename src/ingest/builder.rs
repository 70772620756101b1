use serde::Serialize;
use std::sync::Arc;

use super::error::{IngestError, JobError};
use super::tags::{job_tags, pipeline_tags};
use crate::gitlab::{parse_timestamp, JobRecord, PipelineEvent};
use crate::instances::Instance;
use crate::trace::{SpanContext, SpanOptions, Tracer};

/// Name of the root span of a pipeline trace
pub const PIPELINE_SPAN: &str = "gitlab-pipeline";

/// Name of a job span
pub const JOB_SPAN: &str = "gitlab-job";

/// What happened to a single job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// A span was emitted
    Traced,
    /// The job has not started or not finished yet
    Skipped,
}

/// A job that could not be traced
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub job_id: i64,
    pub error: String,
}

/// Result of a pipeline ingest
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestSummary {
    pub pipeline_id: i64,
    pub jobs_traced: usize,
    pub jobs_skipped: usize,
    pub job_errors: Vec<JobFailure>,
}

/// Rebuilds a pipeline trace from a webhook event.
///
/// Spans are created retroactively: every start and end time comes from the
/// event, none from the clock.
pub struct PipelineIngester {
    tracer: Arc<dyn Tracer>,
}

impl PipelineIngester {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self { tracer }
    }

    /// Emit one pipeline span with one child span per finished job.
    ///
    /// Job failures are collected in the summary and never stop the loop; the
    /// pipeline span is finished once every job was attempted.
    pub fn ingest_pipeline(
        &self,
        event: &PipelineEvent,
        instance: &Instance,
    ) -> Result<IngestSummary, IngestError> {
        let attrs = &event.object_attributes;

        let start = parse_timestamp(&attrs.created_at).map_err(|source| {
            IngestError::TimestampParse {
                field: "created_at",
                source,
            }
        })?;
        let end = parse_timestamp(&attrs.finished_at).map_err(|source| {
            IngestError::TimestampParse {
                field: "finished_at",
                source,
            }
        })?;

        let pipeline_span = self.tracer.start_span(
            PIPELINE_SPAN,
            SpanOptions::new(start).with_tags(pipeline_tags(event, instance)),
        )?;

        let mut summary = IngestSummary {
            pipeline_id: attrs.id,
            ..Default::default()
        };

        for job in &event.builds {
            match self.process_job(job, &pipeline_span, instance) {
                Ok(JobOutcome::Traced) => summary.jobs_traced += 1,
                Ok(JobOutcome::Skipped) => summary.jobs_skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        instance = %instance.name,
                        pipeline_id = attrs.id,
                        job_id = e.job_id(),
                        error = %e,
                        "Skipping job"
                    );
                    summary.job_errors.push(JobFailure {
                        job_id: e.job_id(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.tracer.finish_span(&pipeline_span, end)?;

        tracing::info!(
            instance = %instance.name,
            pipeline_id = attrs.id,
            jobs_traced = summary.jobs_traced,
            jobs_skipped = summary.jobs_skipped,
            job_errors = summary.job_errors.len(),
            "Ingested pipeline"
        );

        Ok(summary)
    }

    /// Emit the span of one job under `parent`
    pub fn process_job(
        &self,
        job: &JobRecord,
        parent: &SpanContext,
        instance: &Instance,
    ) -> Result<JobOutcome, JobError> {
        let (started_at, finished_at) = match (&job.started_at, &job.finished_at) {
            (Some(started_at), Some(finished_at)) => (started_at, finished_at),
            _ => return Ok(JobOutcome::Skipped),
        };

        let start = parse_timestamp(started_at).map_err(|source| JobError::TimestampParse {
            job_id: job.id,
            field: "started_at",
            source,
        })?;
        let end = parse_timestamp(finished_at).map_err(|source| JobError::TimestampParse {
            job_id: job.id,
            field: "finished_at",
            source,
        })?;

        let options = SpanOptions::new(start)
            .with_parent(parent)
            .with_tags(job_tags(job, instance));

        let span = self
            .tracer
            .start_span(JOB_SPAN, options)
            .map_err(|source| JobError::SpanEmission {
                job_id: job.id,
                source,
            })?;
        self.tracer
            .finish_span(&span, end)
            .map_err(|source| JobError::SpanEmission {
                job_id: job.id,
                source,
            })?;

        Ok(JobOutcome::Traced)
    }
}
