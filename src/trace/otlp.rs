//! OTLP/HTTP exporter
//!
//! Finished spans are handed to a background worker over a channel, batched
//! by size or interval and POSTed as JSON to `{endpoint}/v1/traces`. Failed
//! exports are logged and dropped.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

use super::model::ExportTraceServiceRequest;
use super::tracer::{FinishedSpan, PendingSpans, SpanContext, SpanOptions, Tracer, TracerError};

/// OTLP exporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtlpConfig {
    /// Collector base URL, `/v1/traces` is appended
    pub endpoint: String,
    pub service_name: String,
    pub batch_size: usize,
    pub flush_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for OtlpConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:4318".to_string(),
            service_name: "ci-tracer".to_string(),
            batch_size: 512,
            flush_interval_ms: 1000,
            timeout_secs: 10,
        }
    }
}

impl OtlpConfig {
    pub fn traces_url(&self) -> String {
        format!("{}/v1/traces", self.endpoint.trim_end_matches('/'))
    }
}

/// Tracer exporting finished spans over OTLP/HTTP
pub struct OtlpTracer {
    pending: PendingSpans,
    sender: Mutex<Option<mpsc::UnboundedSender<FinishedSpan>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl OtlpTracer {
    /// Start the export worker. Must be called within a tokio runtime.
    pub fn start(config: OtlpConfig) -> Result<Self, TracerError> {
        let exporter = OtlpExporter::new(config)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(exporter.run(receiver));

        Ok(Self {
            pending: PendingSpans::new(),
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stop accepting spans and wait for the worker to flush what it holds
    pub async fn shutdown(&self) {
        self.sender.lock().take();

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("OTLP export worker failed: {}", e);
            }
        }

        if !self.pending.is_empty() {
            tracing::warn!(
                "{} spans were still open at shutdown and are dropped",
                self.pending.len()
            );
        }
    }
}

impl Tracer for OtlpTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> Result<SpanContext, TracerError> {
        if self.sender.lock().is_none() {
            return Err(TracerError::Closed);
        }
        Ok(self.pending.open(name, options))
    }

    fn finish_span(
        &self,
        context: &SpanContext,
        end_time: DateTime<Utc>,
    ) -> Result<(), TracerError> {
        let span = self.pending.close(context, end_time)?;

        let guard = self.sender.lock();
        let sender = guard.as_ref().ok_or(TracerError::Closed)?;
        sender.send(span).map_err(|_| TracerError::Closed)
    }
}

/// Background worker posting span batches to the collector
struct OtlpExporter {
    client: reqwest::Client,
    config: OtlpConfig,
}

impl OtlpExporter {
    fn new(config: OtlpConfig) -> Result<Self, TracerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TracerError::Export(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn run(self, mut receiver: mpsc::UnboundedReceiver<FinishedSpan>) {
        tracing::info!(
            "OTLP exporter started: endpoint={}, batch_size={}",
            self.config.traces_url(),
            self.config.batch_size
        );

        let batch_size = self.config.batch_size.max(1);
        let mut interval = time::interval(Duration::from_millis(self.config.flush_interval_ms.max(1)));
        let mut batch: Vec<FinishedSpan> = Vec::with_capacity(batch_size);

        loop {
            tokio::select! {
                received = receiver.recv() => match received {
                    Some(span) => {
                        batch.push(span);
                        if batch.len() >= batch_size {
                            self.flush(&mut batch).await;
                        }
                    }
                    None => {
                        self.flush(&mut batch).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    self.flush(&mut batch).await;
                }
            }
        }

        tracing::info!("OTLP exporter stopped");
    }

    async fn flush(&self, batch: &mut Vec<FinishedSpan>) {
        if batch.is_empty() {
            return;
        }

        let spans = std::mem::take(batch);
        if let Err(e) = self.export(&spans).await {
            tracing::warn!("Dropped {} spans: {}", spans.len(), e);
        } else {
            tracing::debug!("Exported {} spans", spans.len());
        }
    }

    async fn export(&self, spans: &[FinishedSpan]) -> Result<(), TracerError> {
        let request = ExportTraceServiceRequest::new(&self.config.service_name, spans);

        let response = self
            .client
            .post(self.config.traces_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| TracerError::Export(format!("Failed to send spans: {}", e)))?;

        if !response.status().is_success() {
            return Err(TracerError::Export(format!(
                "Collector returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
