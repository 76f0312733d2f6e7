//! Pluggable delivery of processed records to the downstream system.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(test)]
use mockall::automock;

/// Payload forwarded for every newly-inserted upload record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownstreamPayload {
    pub user_id: String,
    pub file_path: String,
}

/// Destination for processed change records. The concrete protocol is
/// deployment-specific; implementations promise delivery of one payload
/// per call and surface failures to the caller.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Downstream: Send + Sync {
    async fn deliver(&self, payload: &DownstreamPayload) -> Result<()>;
}

/// Stand-in downstream that logs each payload instead of calling a real
/// system
pub struct LogDownstream;

#[async_trait]
impl Downstream for LogDownstream {
    async fn deliver(&self, payload: &DownstreamPayload) -> Result<()> {
        info!(
            user_id = %payload.user_id,
            file_path = %payload.file_path,
            "Processed data for downstream system"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_serialization_shape() {
        let payload = DownstreamPayload {
            user_id: "u1".to_string(),
            file_path: "A01/u1/20240101000000000/f.txt".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["file_path"], "A01/u1/20240101000000000/f.txt");
    }

    #[tokio::test]
    async fn test_log_downstream_always_delivers() {
        let downstream = LogDownstream;
        let payload = DownstreamPayload {
            user_id: "u1".to_string(),
            file_path: "A01/u1/20240101000000000/f.txt".to_string(),
        };
        assert!(downstream.deliver(&payload).await.is_ok());
    }
}
