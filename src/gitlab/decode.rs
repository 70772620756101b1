//! Webhook body decoding

use super::model::PipelineEvent;

/// Decode a `Pipeline Hook` body.
///
/// Only structural JSON validity is checked; timestamps and statuses are left
/// to the ingester.
pub fn decode_pipeline_hook(body: &[u8]) -> Result<PipelineEvent, DecodeError> {
    serde_json::from_slice(body).map_err(DecodeError::from)
}

/// Malformed webhook body
#[derive(Debug, thiserror::Error)]
#[error("Could not decode pipeline hook at line {line}, column {column}: {message}")]
pub struct DecodeError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        Self {
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
        }
    }
}
