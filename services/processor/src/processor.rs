//! Batch processing of change-feed records.

use crate::change_event::{AttributeValue, ChangeRecord};
use crate::downstream::{Downstream, DownstreamPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Batch-invocation result returned to the orchestration layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: BatchBody,
}

/// Summary of one processed batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchBody {
    /// Human-readable summary with the processed count
    pub message: String,
    /// Successfully forwarded payloads, in input order
    pub processed_data: Vec<DownstreamPayload>,
}

/// Stateless processor for change-feed batches
pub struct BatchProcessor {
    downstream: Arc<dyn Downstream>,
}

impl BatchProcessor {
    /// Create a new batch processor
    pub fn new(downstream: Arc<dyn Downstream>) -> Self {
        Self { downstream }
    }

    /// Process one batch of change records sequentially, in input order.
    ///
    /// Records that lack the expected shape, are not insertions, or are
    /// missing the required fields are skipped with a warning. A failure
    /// while handling a single record is logged and skipped; it never
    /// aborts the rest of the batch.
    #[instrument(skip(self, records), fields(batch_size = records.len()))]
    pub async fn process_batch(&self, records: &[Value]) -> BatchResponse {
        let mut processed: Vec<DownstreamPayload> = Vec::new();

        for raw in records {
            let record: ChangeRecord = match serde_json::from_value(raw.clone()) {
                Ok(record) => record,
                Err(e) => {
                    warn!(record = %raw, error = %e, "Skipping malformed record");
                    metrics::counter!("processor.records.skipped").increment(1);
                    continue;
                }
            };

            let Some(new_image) = record.new_image() else {
                warn!(record = %raw, "Skipping malformed record");
                metrics::counter!("processor.records.skipped").increment(1);
                continue;
            };

            if !record.is_insert() {
                metrics::counter!("processor.records.skipped").increment(1);
                continue;
            }

            let user_id = new_image.get("UserID").and_then(AttributeValue::as_s);
            let file_path = new_image.get("FilePath").and_then(AttributeValue::as_s);

            let (Some(user_id), Some(file_path)) = (user_id, file_path) else {
                warn!(record = %raw, "Record is missing UserID or FilePath");
                metrics::counter!("processor.records.skipped").increment(1);
                continue;
            };

            let payload = DownstreamPayload {
                user_id: user_id.to_string(),
                file_path: file_path.to_string(),
            };

            match self.downstream.deliver(&payload).await {
                Ok(()) => {
                    metrics::counter!("processor.records.processed").increment(1);
                    processed.push(payload);
                }
                Err(e) => {
                    error!(record = %raw, error = %e, "Error processing record");
                    metrics::counter!("processor.records.failed").increment(1);
                }
            }
        }

        info!(processed = processed.len(), "Batch processing complete");

        BatchResponse {
            status_code: 200,
            body: BatchBody {
                message: format!("Successfully processed {} records.", processed.len()),
                processed_data: processed,
            },
        }
    }
}
