//! Change-feed record types in the metadata store's field-tagged encoding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single change-feed record as delivered by the event-routing
/// intermediary. Both fields are optional on the wire; records missing
/// either are skipped by the processor rather than failing the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Change type: INSERT, MODIFY, or REMOVE
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    /// Stream payload carrying the record images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamodb: Option<StreamPayload>,
}

/// Stream payload of a change record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamPayload {
    /// Post-change snapshot of the row, field-tagged
    #[serde(rename = "NewImage", default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<HashMap<String, AttributeValue>>,
}

/// Field-tagged attribute value, e.g. `{"S": "text"}` or `{"N": "0"}`.
/// Numbers are transported as strings in this encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// String
    S(String),
    /// Number
    N(String),
    /// Boolean
    #[serde(rename = "BOOL")]
    Bool(bool),
    /// Null marker
    #[serde(rename = "NULL")]
    Null(bool),
    /// List of nested values
    L(Vec<AttributeValue>),
    /// Map of nested values
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Returns the payload when this is a string attribute
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl ChangeRecord {
    /// Whether this record describes a newly-inserted row
    pub fn is_insert(&self) -> bool {
        self.event_name.as_deref() == Some("INSERT")
    }

    /// The post-change snapshot, when the record has the expected shape
    pub fn new_image(&self) -> Option<&HashMap<String, AttributeValue>> {
        self.dynamodb.as_ref()?.new_image.as_ref()
    }
}
