//! Ledger state hashing using Blake3

use blake3::Hasher as Blake3Hasher;

use crate::error::SerializationError;
use crate::traits::State;
use crate::types::StateHash;

/// Hashes the bincode encoding of a state.
///
/// Used to stamp snapshots, to detect tampered or truncated blobs on load, and
/// to tell cheaply whether an operation left the ledger untouched.
#[derive(Debug, Clone, Default)]
pub struct StateHasher;

impl StateHasher {
    pub fn new() -> Self {
        Self
    }

    pub fn hash<S: State>(&self, state: &S) -> Result<StateHash, SerializationError> {
        let serialized =
            bincode::serialize(state).map_err(|e| SerializationError::SerializationFailed {
                reason: format!("Bincode encoding for hashing failed: {}", e),
            })?;

        let mut hasher = Blake3Hasher::new();
        hasher.update(&serialized);
        Ok(StateHash(*hasher.finalize().as_bytes()))
    }

    /// Check `state` against a hex digest recorded earlier
    pub fn verify<S: State>(&self, state: &S, expected_hex: &str) -> Result<(), SerializationError> {
        let actual = self.hash(state)?.to_hex();
        if actual != expected_hex {
            return Err(SerializationError::HashMismatch {
                expected: expected_hex.to_string(),
                actual,
            });
        }
        Ok(())
    }
}
