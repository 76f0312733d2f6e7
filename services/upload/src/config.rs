use serde::Deserialize;

/// Main configuration for the upload service
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// S3 configuration
    pub s3: S3Config,
    /// DynamoDB configuration
    pub dynamodb: DynamoDbConfig,
    /// Destination system configuration
    #[serde(default)]
    pub destination: DestinationConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Service name for logging/metrics
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Metrics port
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Enable CORS
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
    /// Allowed CORS origins (empty = any)
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// S3 blob storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    /// S3 bucket name for uploaded files
    pub bucket: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for MinIO, LocalStack, etc.)
    pub endpoint_url: Option<String>,
    /// Force path-style access (required for MinIO)
    #[serde(default)]
    pub force_path_style: bool,
}

/// DynamoDB metadata store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DynamoDbConfig {
    /// Table holding upload records
    pub table: String,
    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint URL (for LocalStack, DynamoDB Local)
    pub endpoint_url: Option<String>,
}

/// Destination system configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    /// Identifier of the destination system, first component of every
    /// storage key
    #[serde(default = "default_destination_system_id")]
    pub system_id: String,
}

// Default value functions
fn default_service_name() -> String {
    "upload-service".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_destination_system_id() -> String {
    "A01".to_string()
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024 // 64MB
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            // Add config file if present
            .add_source(config::File::with_name("config/upload").required(false))
            .add_source(config::File::with_name("/etc/intake/upload").required(false))
            // Override with environment variables
            // UPLOAD__S3__BUCKET -> s3.bucket
            .add_source(
                config::Environment::with_prefix("UPLOAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly serve traffic
    fn validate(&self) -> anyhow::Result<()> {
        if self.s3.bucket.is_empty() {
            anyhow::bail!("s3.bucket must be set");
        }
        if self.dynamodb.table.is_empty() {
            anyhow::bail!("dynamodb.table must be set");
        }
        if self.destination.system_id.is_empty() {
            anyhow::bail!("destination.system_id must not be empty");
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            metrics_port: default_metrics_port(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_true(),
            cors_origins: Vec::new(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            system_id: default_destination_system_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_destination_system_id(), "A01");
        assert_eq!(default_port(), 8080);
        assert_eq!(default_max_upload_bytes(), 64 * 1024 * 1024);
    }

    #[test]
    fn test_validate_rejects_empty_bucket() {
        let config = Config {
            service: ServiceConfig::default(),
            server: ServerConfig::default(),
            s3: S3Config {
                bucket: String::new(),
                region: default_region(),
                endpoint_url: None,
                force_path_style: false,
            },
            dynamodb: DynamoDbConfig {
                table: "uploads".to_string(),
                region: default_region(),
                endpoint_url: None,
            },
            destination: DestinationConfig::default(),
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        let config = Config {
            service: ServiceConfig::default(),
            server: ServerConfig::default(),
            s3: S3Config {
                bucket: "intake-files".to_string(),
                region: default_region(),
                endpoint_url: None,
                force_path_style: false,
            },
            dynamodb: DynamoDbConfig {
                table: "uploads".to_string(),
                region: default_region(),
                endpoint_url: None,
            },
            destination: DestinationConfig::default(),
        };

        assert!(config.validate().is_ok());
    }
}
