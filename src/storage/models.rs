use serde::{Deserialize, Serialize};

use crate::identity::CallerId;

/// One alias as listed back to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenedUrl {
    pub short_url: String,
    pub original_url: String,
}

impl ShortenedUrl {
    pub fn new(short_url: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            short_url: short_url.into(),
            original_url: original_url.into(),
        }
    }
}

/// One entry of a client's bulk-create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// A bulk-create entry with its caller and minted alias, ready to insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRow {
    pub caller: CallerId,
    pub correlation_id: String,
    pub original_url: String,
    pub short_url: String,
}

impl PersistedRow {
    pub fn ack(&self) -> ClientAck {
        ClientAck {
            correlation_id: self.correlation_id.clone(),
            short_url: self.short_url.clone(),
        }
    }
}

/// What the client gets back for each bulk-create entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAck {
    pub correlation_id: String,
    pub short_url: String,
}
