//! Intake Upload Service
//!
//! HTTP intake surface of the file pipeline. Accepts a file upload plus
//! metadata from an authenticated caller, writes the bytes to S3 under a
//! deterministic key, then registers an upload record in DynamoDB. The
//! record's change feed drives the downstream processor service; nothing
//! here reads it back.
//!
//! ## Architecture
//!
//! ```text
//! client ──POST /upload──▶ ┌──────────────┐
//!                          │ Subject      │  gateway-verified claims
//!                          │ extractor    │
//!                          └──────┬───────┘
//!                                 ▼
//!                          ┌──────────────┐      ┌──────────────┐
//!                          │ Upload       │─────▶│ S3           │
//!                          │ handler      │      │ {dest}/{user}/│
//!                          └──────┬───────┘      │ {ts}/{name}  │
//!                                 │              └──────────────┘
//!                                 ▼
//!                          ┌──────────────┐
//!                          │ DynamoDB     │──▶ change feed ──▶ processor
//!                          │ UploadRecord │
//!                          └──────────────┘
//! ```
//!
//! The blob write and the metadata write are deliberately not transactional;
//! a failure between them leaves an orphaned blob and surfaces a server
//! error to the caller.

pub mod api;
pub mod auth;
pub mod blob_store;
pub mod config;
pub mod error;
pub mod metadata;
pub mod request_log;

pub use api::{AppState, UploadRequest, UploadResponse};
pub use auth::{AuthContext, Subject, VerifiedClaims};
pub use blob_store::BlobStore;
pub use config::Config;
pub use error::UploadError;
pub use metadata::{MetadataStore, UploadRecord};
