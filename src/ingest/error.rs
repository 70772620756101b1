use crate::gitlab::TimestampError;
use crate::trace::TracerError;

/// Failure of a whole pipeline ingest; no trace (or an incomplete root) was emitted
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Could not parse pipeline {field}: {source}")]
    TimestampParse {
        field: &'static str,
        source: TimestampError,
    },

    #[error("Could not emit pipeline span: {0}")]
    SpanEmission(#[from] TracerError),
}

/// Failure local to one job; the rest of the pipeline is still traced
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Could not parse {field} of job {job_id}: {source}")]
    TimestampParse {
        job_id: i64,
        field: &'static str,
        source: TimestampError,
    },

    #[error("Could not emit span for job {job_id}: {source}")]
    SpanEmission { job_id: i64, source: TracerError },
}

impl JobError {
    pub fn job_id(&self) -> i64 {
        match self {
            JobError::TimestampParse { job_id, .. } | JobError::SpanEmission { job_id, .. } => {
                *job_id
            }
        }
    }
}
