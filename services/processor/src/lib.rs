//! Intake Change Processor
//!
//! Second half of the file pipeline: consumes batches of change-feed
//! records from the upload metadata store, filters for newly-inserted
//! rows, and forwards `{user_id, file_path}` payloads to the downstream
//! system. The delivery mechanism between the store's change feed and
//! this service is an external event-routing intermediary; batches arrive
//! over the HTTP batch-invocation endpoint.
//!
//! ## Architecture
//!
//! ```text
//! change feed ──▶ intermediary ──POST /process──▶ ┌──────────────┐
//!                                                 │ Batch        │
//!                                                 │ processor    │
//!                                                 └──────┬───────┘
//!                                                        │ INSERT only,
//!                                                        │ bad records
//!                                                        │ logged+skipped
//!                                                        ▼
//!                                                 ┌──────────────┐
//!                                                 │ Downstream   │
//!                                                 │ (log stand-in)│
//!                                                 └──────────────┘
//! ```
//!
//! No state is retained between invocations; each batch is processed
//! independently, record by record, in input order.

pub mod change_event;
pub mod config;
pub mod downstream;
pub mod processor;
pub mod server;

pub use change_event::{AttributeValue, ChangeRecord, StreamPayload};
pub use config::Config;
pub use downstream::{Downstream, DownstreamPayload, LogDownstream};
pub use processor::{BatchBody, BatchProcessor, BatchResponse};
pub use server::AppState;
