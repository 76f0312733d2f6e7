use crate::config::S3Config;
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

/// S3-backed blob storage for uploaded files
pub struct BlobStore {
    client: S3Client,
    bucket: String,
}

impl BlobStore {
    /// Create a new blob store
    pub async fn new(config: &S3Config) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let s3_config = s3_config_builder.build();
        let client = S3Client::from_conf(s3_config);

        info!(
            bucket = %config.bucket,
            region = %config.region,
            "Blob store initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }

    /// Generate the storage key for an upload.
    /// Format: `{destination_system_id}/{user_id}/{timestamp}/{file_name}`
    /// with the timestamp at millisecond precision (`YYYYMMDDHHMMSSmmm`),
    /// making keys unique per upload within one user's traffic.
    pub fn storage_key(
        destination_system_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
        file_name: &str,
    ) -> String {
        let timestamp = now.format("%Y%m%d%H%M%S%3f");
        format!("{destination_system_id}/{user_id}/{timestamp}/{file_name}")
    }

    /// Upload file bytes under the given key
    #[instrument(skip(self, content), fields(key = %key, size_bytes = content.len()))]
    pub async fn put(&self, key: &str, content: Vec<u8>, content_type: &str) -> Result<()> {
        let size_bytes = content.len();
        let body = ByteStream::from(content);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .context("Failed to upload file to S3")?;

        debug!(key = %key, size_bytes, "File uploaded to blob store");
        Ok(())
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}
