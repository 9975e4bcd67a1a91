//! Core traits for the FinTrack ledger

use serde::{de::DeserializeOwned, Serialize};

use crate::context::SeededRandom;
use crate::error::{StorageError, ValidationError};

/// State objects that can be snapshotted, hashed and restored
pub trait State: Clone + Serialize + DeserializeOwned {
    /// Structural checks run before a restored snapshot is trusted
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Durable key-value storage backing the ledger snapshot and the session marker
pub trait SnapshotStorage: Send {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Source of bill payment ids
pub trait BillIdSource: Send {
    /// Id for the next bill payment
    fn next_id(&mut self, random: &mut SeededRandom) -> String;

    /// Forget any remembered id
    fn clear(&mut self);
}
