//! The ledger store: single owner of the ledger, explicit mutation API, and
//! best-effort snapshot persistence

use chrono::{DateTime, Utc};

use crate::command::{CommandOutcome, LedgerCommand};
use crate::config::SnapshotFormat;
use crate::error::{FinTrackError, SerializationError, ValidationError};
use crate::hasher::StateHasher;
use crate::logging::{AuditLog, LogEntry, LogLevel};
use crate::seed::seed_ledger;
use crate::serialization::{serializer_for, Snapshot, SnapshotSerializer};
use crate::traits::{SnapshotStorage, State};
use crate::types::{Ledger, StateHash};

pub const STORE_KEY: &str = "fintrack_persist_store";
pub const VERSION_KEY: &str = "fintrack_persist_version";
/// Audit entries kept in memory; older ones are dropped first
pub const AUDIT_LOG_LIMIT: usize = 10_000;

impl State for Ledger {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.user.account_number.is_empty() {
            return Err(ValidationError::InvalidState {
                reason: "Account number cannot be empty".to_string(),
            });
        }
        if let Some(tx) = self.transactions.iter().find(|tx| tx.id.is_empty()) {
            return Err(ValidationError::InvalidState {
                reason: format!("Transaction dated {} has no id", tx.date),
            });
        }
        if let Some(bp) = self.bill_payments.iter().find(|bp| bp.id.is_empty()) {
            return Err(ValidationError::InvalidState {
                reason: format!("Bill payment {} has no id", bp.reference),
            });
        }
        Ok(())
    }
}

/// Why the store started from seed data instead of a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedReason {
    NoSnapshot,
    VersionMismatch { found: Option<String> },
    Unreadable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Snapshot,
    Seed(SeedReason),
}

pub struct LedgerStore {
    ledger: Ledger,
    storage: Box<dyn SnapshotStorage>,
    serializer: Box<dyn SnapshotSerializer>,
    hasher: StateHasher,
    schema_version: String,
    audit: AuditLog,
    load_source: LoadSource,
    commit_count: usize,
    failed_commits: usize,
}

impl std::fmt::Debug for LedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerStore")
            .field("schema_version", &self.schema_version)
            .field("serializer", &self.serializer.name())
            .field("load_source", &self.load_source)
            .field("commit_count", &self.commit_count)
            .field("failed_commits", &self.failed_commits)
            .finish()
    }
}

impl LedgerStore {
    /// Load the snapshot if its version matches `schema_version`, otherwise
    /// discard it and start from seed data. Never fails: unreadable storage
    /// also falls back to the seed.
    pub fn open(
        storage: Box<dyn SnapshotStorage>,
        format: SnapshotFormat,
        schema_version: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let mut store = Self {
            ledger: seed_ledger(),
            storage,
            serializer: serializer_for(format),
            hasher: StateHasher::new(),
            schema_version: schema_version.to_string(),
            audit: AuditLog::with_info_level().with_max_entries(AUDIT_LOG_LIMIT),
            load_source: LoadSource::Seed(SeedReason::NoSnapshot),
            commit_count: 0,
            failed_commits: 0,
        };

        store.load_source = match store.load_snapshot() {
            Ok(ledger) => {
                store.ledger = ledger;
                LoadSource::Snapshot
            }
            Err(reason) => LoadSource::Seed(reason),
        };

        let message = match &store.load_source {
            LoadSource::Snapshot => "Restored ledger from snapshot".to_string(),
            LoadSource::Seed(reason) => format!("Started from seed data: {:?}", reason),
        };
        tracing::info!(schema_version = %store.schema_version, "{}", message);
        store.audit.log(LogEntry::new(LogLevel::Info, now, message).with_label("open"));
        store
    }

    fn load_snapshot(&mut self) -> Result<Ledger, SeedReason> {
        let stored_version = self
            .storage
            .get(VERSION_KEY)
            .map_err(|e| SeedReason::Unreadable { reason: e.to_string() })?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        if stored_version.as_deref() != Some(self.schema_version.as_str()) {
            // Stale schema: drop the blob and claim the key for this version
            if let Err(e) = self.storage.remove(STORE_KEY) {
                tracing::warn!(error = %e, "Failed to discard stale snapshot");
            }
            if let Err(e) = self.storage.set(VERSION_KEY, self.schema_version.as_bytes()) {
                tracing::warn!(error = %e, "Failed to record snapshot version");
            }
            return Err(match stored_version {
                None => SeedReason::NoSnapshot,
                found => SeedReason::VersionMismatch { found },
            });
        }

        let bytes = self
            .storage
            .get(STORE_KEY)
            .map_err(|e| SeedReason::Unreadable { reason: e.to_string() })?
            .ok_or(SeedReason::NoSnapshot)?;

        let snapshot = self.decode(&bytes).map_err(|e| {
            tracing::error!(error = %e, "Failed to load store");
            SeedReason::Unreadable { reason: e.to_string() }
        })?;
        Ok(snapshot.ledger)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Snapshot, FinTrackError> {
        let snapshot = self.serializer.deserialize(bytes)?;
        if snapshot.version != self.schema_version {
            return Err(SerializationError::DeserializationFailed {
                reason: format!(
                    "Snapshot carries version {}, expected {}",
                    snapshot.version, self.schema_version
                ),
            }
            .into());
        }
        self.hasher.verify(&snapshot.ledger, &snapshot.hash)?;
        snapshot.ledger.validate()?;
        Ok(snapshot)
    }

    /// Current ledger. Never blocks.
    pub fn read(&self) -> &Ledger {
        &self.ledger
    }

    /// Apply `command` and commit once. Persistence failures are logged and
    /// swallowed; the in-memory change stands either way. A command that
    /// would overflow the balance is refused whole and nothing is committed.
    pub fn dispatch(
        &mut self,
        command: LedgerCommand,
        now: DateTime<Utc>,
    ) -> Result<CommandOutcome, FinTrackError> {
        let label = command.label();
        let mut outcome = CommandOutcome {
            balance_before: self.ledger.user.balance,
            ..CommandOutcome::default()
        };
        if let Err(e) = command.apply(&mut self.ledger, now.date_naive(), &mut outcome) {
            tracing::error!(command = label, error = %e, "Refused ledger command");
            self.audit.log(
                LogEntry::new(LogLevel::Error, now, "Refused ledger command")
                    .with_label(label)
                    .with_metadata("balance", outcome.balance_before.to_string())
                    .with_metadata("error", e.to_string()),
            );
            return Err(e.into());
        }
        outcome.balance_after = self.ledger.user.balance;

        tracing::info!(
            command = label,
            balance_before = %outcome.balance_before,
            balance_after = %outcome.balance_after,
            "Dispatched ledger command"
        );

        let hash = self.hasher.hash(&self.ledger);
        let mut entry = LogEntry::new(LogLevel::Info, now, "Dispatched ledger command")
            .with_label(label)
            .with_metadata("balance_before", outcome.balance_before.to_string())
            .with_metadata("balance_after", outcome.balance_after.to_string());
        if let Ok(hash) = &hash {
            entry = entry.with_state_hash(hash.clone());
        }
        self.audit.log(entry);

        self.record_commit(hash.map_err(FinTrackError::from), now);
        Ok(outcome)
    }

    /// Best-effort durable write of the whole ledger
    pub fn commit(&mut self, now: DateTime<Utc>) {
        let hash = self.hasher.hash(&self.ledger).map_err(FinTrackError::from);
        self.record_commit(hash, now);
    }

    fn record_commit(&mut self, hash: Result<StateHash, FinTrackError>, now: DateTime<Utc>) {
        match hash.and_then(|hash| self.persist(&hash)) {
            Ok(()) => self.commit_count += 1,
            Err(e) => {
                self.failed_commits += 1;
                tracing::warn!(error = %e, "Failed to persist ledger snapshot");
                self.audit.log(
                    LogEntry::new(LogLevel::Warn, now, "Failed to persist ledger snapshot")
                        .with_label("commit")
                        .with_metadata("error", e.to_string()),
                );
            }
        }
    }

    fn persist(&mut self, hash: &StateHash) -> Result<(), FinTrackError> {
        let snapshot = Snapshot {
            version: self.schema_version.clone(),
            hash: hash.to_hex(),
            ledger: self.ledger.clone(),
        };
        let bytes = self.serializer.serialize(&snapshot)?;
        self.storage.set(STORE_KEY, &bytes)?;
        Ok(())
    }

    pub fn current_hash(&self) -> Result<StateHash, SerializationError> {
        self.hasher.hash(&self.ledger)
    }

    pub fn storage(&self) -> &dyn SnapshotStorage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn SnapshotStorage {
        self.storage.as_mut()
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    pub fn load_source(&self) -> &LoadSource {
        &self.load_source
    }

    pub fn schema_version(&self) -> &str {
        &self.schema_version
    }

    /// Successful durable writes since open
    pub fn commit_count(&self) -> usize {
        self.commit_count
    }

    pub fn failed_commits(&self) -> usize {
        self.failed_commits
    }
}
