//! Pluggable snapshot encoding

use serde::{Deserialize, Serialize};

use crate::config::SnapshotFormat;
use crate::error::SerializationError;
use crate::types::Ledger;

/// What is written to storage on every commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    /// Hex Blake3 digest of `ledger`
    pub hash: String,
    pub ledger: Ledger,
}

/// Encoding backend for snapshots
pub trait SnapshotSerializer: Send + Sync {
    fn serialize(&self, snapshot: &Snapshot) -> Result<Vec<u8>, SerializationError>;

    fn deserialize(&self, bytes: &[u8]) -> Result<Snapshot, SerializationError>;

    fn name(&self) -> &str;
}

/// Bincode serialization backend
#[derive(Debug, Clone, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    pub fn new() -> Self {
        Self
    }
}

impl SnapshotSerializer for BincodeSerializer {
    fn serialize(&self, snapshot: &Snapshot) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(snapshot).map_err(|e| SerializationError::SerializationFailed {
            reason: format!("Bincode serialization failed: {}", e),
        })
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Snapshot, SerializationError> {
        bincode::deserialize(bytes).map_err(|e| SerializationError::DeserializationFailed {
            reason: format!("Bincode deserialization failed: {}", e),
        })
    }

    fn name(&self) -> &str {
        "bincode"
    }
}

/// JSON serialization backend, the documented snapshot form
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn new_pretty() -> Self {
        Self { pretty: true }
    }
}

impl SnapshotSerializer for JsonSerializer {
    fn serialize(&self, snapshot: &Snapshot) -> Result<Vec<u8>, SerializationError> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(snapshot)
        } else {
            serde_json::to_vec(snapshot)
        };

        result.map_err(|e| SerializationError::SerializationFailed {
            reason: format!("JSON serialization failed: {}", e),
        })
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Snapshot, SerializationError> {
        serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializationFailed {
            reason: format!("JSON deserialization failed: {}", e),
        })
    }

    fn name(&self) -> &str {
        "json"
    }
}

pub fn serializer_for(format: SnapshotFormat) -> Box<dyn SnapshotSerializer> {
    match format {
        SnapshotFormat::Json => Box::new(JsonSerializer::new()),
        SnapshotFormat::Bincode => Box::new(BincodeSerializer::new()),
    }
}
