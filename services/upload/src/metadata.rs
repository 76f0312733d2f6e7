use crate::config::DynamoDbConfig;
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Builder as DynamoConfigBuilder;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Metadata row recorded for every stored upload.
///
/// The row is created exactly once, at upload time, and never updated or
/// deleted by this service. `DownloadCount` and `IsDeleted` belong to
/// consumers further down the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    /// Primary key: `{destination_system_id}/{user_id}/{timestamp}/{file_name}`
    pub file_path: String,
    /// Identity-provider subject identifier, never empty
    pub user_id: String,
    /// Caller-supplied comment, empty when omitted
    pub comment: String,
    /// ISO-8601 UTC timestamp set at write time
    pub registration_date: String,
    /// Initialized to 0
    pub download_count: i64,
    /// Fixed per deployment
    pub destination_system_id: String,
    /// Initialized to false
    pub is_deleted: bool,
}

impl UploadRecord {
    /// Build the record for a fresh upload
    pub fn new(
        file_path: String,
        user_id: String,
        comment: Option<String>,
        destination_system_id: String,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            file_path,
            user_id,
            comment: comment.unwrap_or_default(),
            registration_date: registered_at.to_rfc3339_opts(SecondsFormat::Micros, false),
            download_count: 0,
            destination_system_id,
            is_deleted: false,
        }
    }

    /// Item map in the store's field-tagged attribute encoding
    pub fn to_item(&self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (
                "FilePath".to_string(),
                AttributeValue::S(self.file_path.clone()),
            ),
            (
                "UserID".to_string(),
                AttributeValue::S(self.user_id.clone()),
            ),
            (
                "Comment".to_string(),
                AttributeValue::S(self.comment.clone()),
            ),
            (
                "RegistrationDate".to_string(),
                AttributeValue::S(self.registration_date.clone()),
            ),
            (
                "DownloadCount".to_string(),
                AttributeValue::N(self.download_count.to_string()),
            ),
            (
                "DestinationSystemID".to_string(),
                AttributeValue::S(self.destination_system_id.clone()),
            ),
            (
                "IsDeleted".to_string(),
                AttributeValue::Bool(self.is_deleted),
            ),
        ])
    }
}

/// DynamoDB-backed metadata store for upload records
pub struct MetadataStore {
    client: DynamoClient,
    table: String,
}

impl MetadataStore {
    /// Create a new metadata store
    pub async fn new(config: &DynamoDbConfig) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut dynamo_config_builder = DynamoConfigBuilder::from(&aws_config);

        // Configure custom endpoint for LocalStack/DynamoDB Local
        if let Some(ref endpoint_url) = config.endpoint_url {
            dynamo_config_builder = dynamo_config_builder.endpoint_url(endpoint_url);
        }

        let dynamo_config = dynamo_config_builder.build();
        let client = DynamoClient::from_conf(dynamo_config);

        info!(table = %config.table, region = %config.region, "Metadata store initialized");

        Ok(Self {
            client,
            table: config.table.clone(),
        })
    }

    /// Register an upload record
    #[instrument(skip(self, record), fields(file_path = %record.file_path, user_id = %record.user_id))]
    pub async fn register(&self, record: &UploadRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(record.to_item()))
            .send()
            .await
            .context("Failed to register metadata in DynamoDB")?;

        debug!(file_path = %record.file_path, "Upload record registered");
        Ok(())
    }

    /// Get the table name
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_record() -> UploadRecord {
        UploadRecord::new(
            "A01/u1/20240101000000000/f.txt".to_string(),
            "u1".to_string(),
            Some("quarterly report".to_string()),
            "A01".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_new_record_initial_state() {
        let record = test_record();
        assert_eq!(record.download_count, 0);
        assert!(!record.is_deleted);
        assert_eq!(record.comment, "quarterly report");
    }

    #[test]
    fn test_missing_comment_defaults_to_empty() {
        let record = UploadRecord::new(
            "A01/u1/20240101000000000/f.txt".to_string(),
            "u1".to_string(),
            None,
            "A01".to_string(),
            Utc::now(),
        );
        assert_eq!(record.comment, "");
    }

    #[test]
    fn test_registration_date_is_iso8601_utc() {
        let record = test_record();
        assert_eq!(record.registration_date, "2024-01-01T00:00:00.000000+00:00");
    }

    #[test]
    fn test_item_attribute_encoding() {
        let item = test_record().to_item();

        assert_eq!(
            item.get("FilePath"),
            Some(&AttributeValue::S(
                "A01/u1/20240101000000000/f.txt".to_string()
            ))
        );
        assert_eq!(item.get("UserID"), Some(&AttributeValue::S("u1".to_string())));
        assert_eq!(
            item.get("DownloadCount"),
            Some(&AttributeValue::N("0".to_string()))
        );
        assert_eq!(
            item.get("DestinationSystemID"),
            Some(&AttributeValue::S("A01".to_string()))
        );
        assert_eq!(item.get("IsDeleted"), Some(&AttributeValue::Bool(false)));
        assert_eq!(item.len(), 7);
    }
}
