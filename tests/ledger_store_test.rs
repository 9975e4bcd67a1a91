//! Snapshot persistence, reseeding and reconciliation

mod common;

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use common::{config, d, logged_in, logged_in_over, top_up, RECIPIENT};
use fintrack::session::current_session;
use fintrack::store::{STORE_KEY, VERSION_KEY};
use fintrack::transfer::TransferWorkflow;
use fintrack::{
    reconcile, Behavior, DefectModes, FileStorage, FinTrack, FinTrackConfig, LoadSource, LogLevel,
    MemoryStorage, SeedReason, SnapshotFormat, SnapshotStorage, StorageError, TransferForm,
};

fn transfer(app: &mut FinTrack, amount: &str) {
    let mut workflow = TransferWorkflow::new();
    workflow
        .continue_to_review(app, &TransferForm::new(RECIPIENT, "Rahim Uddin", amount))
        .unwrap();
    workflow.confirm(app).unwrap();
    for completion in app.run_until_idle() {
        workflow.on_completion(&completion);
    }
}

/// Storage whose snapshot writes always fail
struct FailingStorage {
    inner: MemoryStorage,
}

impl SnapshotStorage for FailingStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if key == STORE_KEY {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("fintrack-it-{}-{}-{}", tag, std::process::id(), nanos))
}

#[test]
fn test_reload_restores_committed_ledger() {
    let storage = MemoryStorage::new();
    let mut app = logged_in_over(config(), storage.clone());
    transfer(&mut app, "1000");

    let reloaded = FinTrack::new(config(), Box::new(storage));
    assert_eq!(reloaded.store().load_source(), &LoadSource::Snapshot);
    assert_eq!(reloaded.read().balance(), d(23_985));
    assert_eq!(reloaded.read().transactions.len(), 51);
    assert_eq!(reloaded.read(), app.read());
    assert!(current_session(reloaded.store().storage()).is_some());
}

#[test]
fn test_stale_version_reseeds() {
    let mut storage = MemoryStorage::new();
    {
        let mut app = logged_in_over(config(), storage.clone());
        transfer(&mut app, "1000");
    }
    storage.set(VERSION_KEY, b"v2").unwrap();

    let app = FinTrack::new(config(), Box::new(storage.clone()));
    assert_eq!(
        app.store().load_source(),
        &LoadSource::Seed(SeedReason::VersionMismatch {
            found: Some("v2".to_string())
        })
    );
    assert_eq!(app.read().balance(), d(25_000));
    assert_eq!(app.read().transactions.len(), 50);

    let current = app.store().schema_version().as_bytes().to_vec();
    assert_eq!(storage.get(VERSION_KEY).unwrap(), Some(current));
    assert_eq!(storage.get(STORE_KEY).unwrap(), None);
}

#[test]
fn test_tampered_snapshot_falls_back_to_seed() {
    let mut storage = MemoryStorage::new();
    {
        let mut app = logged_in_over(config(), storage.clone());
        transfer(&mut app, "1000");
    }

    let bytes = storage.get(STORE_KEY).unwrap().unwrap();
    let mut snapshot: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    snapshot["hash"] = serde_json::Value::String("0".repeat(64));
    storage
        .set(STORE_KEY, &serde_json::to_vec(&snapshot).unwrap())
        .unwrap();

    let app = FinTrack::new(config(), Box::new(storage));
    assert!(matches!(
        app.store().load_source(),
        LoadSource::Seed(SeedReason::Unreadable { .. })
    ));
    assert_eq!(app.read().balance(), d(25_000));
}

#[test]
fn test_bincode_snapshots_reload() {
    let config: FinTrackConfig = config().with_snapshot_format(SnapshotFormat::Bincode);
    let storage = MemoryStorage::new();
    let mut app = logged_in_over(config.clone(), storage.clone());
    transfer(&mut app, "2000");

    let reloaded = FinTrack::new(config, Box::new(storage.clone()));
    assert_eq!(reloaded.store().load_source(), &LoadSource::Snapshot);
    assert_eq!(reloaded.read().balance(), d(25_000 - 2030));

    // A JSON reader cannot make sense of the blob
    let json_reader = FinTrack::new(common::config(), Box::new(storage));
    assert!(matches!(
        json_reader.store().load_source(),
        LoadSource::Seed(SeedReason::Unreadable { .. })
    ));
}

#[test]
fn test_file_storage_survives_restart() {
    let dir = scratch_dir("restart");
    {
        let storage = FileStorage::open(&dir).unwrap();
        let mut app = FinTrack::new(config(), Box::new(storage));
        fintrack::session::login(
            &mut app,
            &mut fintrack::LoginForm::new(fintrack::seed::SEED_EMAIL, fintrack::seed::SEED_PASSWORD),
        )
        .unwrap();
        transfer(&mut app, "1000");
    }

    let app = FinTrack::new(config(), Box::new(FileStorage::open(&dir).unwrap()));
    assert_eq!(app.store().load_source(), &LoadSource::Snapshot);
    assert_eq!(app.read().balance(), d(23_985));
    assert!(app.require_session().is_ok());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_persistence_failure_is_swallowed() {
    let storage = FailingStorage {
        inner: MemoryStorage::new(),
    };
    let mut app = FinTrack::new(config(), Box::new(storage));
    fintrack::session::login(
        &mut app,
        &mut fintrack::LoginForm::new(fintrack::seed::SEED_EMAIL, fintrack::seed::SEED_PASSWORD),
    )
    .unwrap();
    transfer(&mut app, "1000");

    // The in-memory ledger moves on regardless
    assert_eq!(app.read().balance(), d(23_985));
    assert_eq!(app.store().commit_count(), 0);
    assert!(app.store().failed_commits() >= 3);

    let warnings: Vec<_> = app
        .store()
        .audit_log()
        .entries()
        .iter()
        .filter(|entry| entry.level == LogLevel::Warn)
        .collect();
    assert_eq!(warnings.len(), app.store().failed_commits());
    assert!(warnings
        .iter()
        .all(|entry| entry.label.as_deref() == Some("commit")));
    assert!(warnings[0]
        .metadata_value("error")
        .is_some_and(|error| error.contains("quota exceeded")));
}

#[test]
fn test_every_command_is_audited_with_its_hash() {
    let mut app = logged_in(config());
    transfer(&mut app, "1000");

    let labels: Vec<_> = app
        .store()
        .audit_log()
        .entries()
        .iter()
        .filter_map(|entry| entry.label.as_deref())
        .collect();
    assert_eq!(labels.first(), Some(&"open"));
    assert!(labels.contains(&"debit"));
    assert!(labels.contains(&"append_transaction"));

    let last = app.store().audit_log().entries().last().unwrap();
    assert_eq!(last.state_hash, Some(app.store().current_hash().unwrap()));
}

#[test]
fn test_legacy_large_transfer_breaks_the_chain() {
    let mut app = logged_in(config());
    top_up(&mut app, 100_000);
    transfer(&mut app, "1000");
    transfer(&mut app, "50000");

    let mut tail = app.read().clone();
    tail.transactions.truncate(2);
    let report = reconcile(&tail);

    assert!(report.head_matches_balance);
    assert!(!report.balanced);
    let broken = report.broken_links();
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].transaction_id, tail.transactions[0].id);
    assert_eq!(broken[0].expected, Some(d(123_985 - 50_750)));
    assert_eq!(broken[0].recorded, d(123_235));
}

#[test]
fn test_fixed_large_transfer_chains() {
    let mut defects = DefectModes::legacy();
    defects.large_transfer_principal = Behavior::Fixed;
    let mut app = logged_in(config().with_defects(defects));
    top_up(&mut app, 100_000);
    transfer(&mut app, "1000");
    transfer(&mut app, "50000");

    let mut tail = app.read().clone();
    tail.transactions.truncate(2);
    let report = reconcile(&tail);
    assert!(report.balanced);
    assert!(report.broken_links().is_empty());
}
