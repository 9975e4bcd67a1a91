//! FinTrack ledger simulator
//!
//! A single-user banking ledger driven by transfer, bill payment and settings
//! workflows over a deterministic virtual-time event loop. Documented defects
//! of the application are reproducible one by one through [`DefectModes`].

pub mod app;
pub mod bills;
pub mod command;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod fees;
pub mod hasher;
pub mod logging;
pub mod money;
pub mod query;
pub mod reconcile;
pub mod scheduler;
pub mod seed;
pub mod serialization;
pub mod session;
pub mod settings;
pub mod statement;
pub mod storage;
pub mod store;
pub mod traits;
pub mod transfer;
pub mod types;

// Re-export core types and traits
pub use app::FinTrack;
pub use bills::{
    BillPaymentForm, BillPaymentWorkflow, BillState, BillSubmission, Biller, FreshBillIds,
    StickyBillIdCache,
};
pub use command::{CommandOutcome, LedgerCommand, ProfileChanges};
pub use config::{Behavior, DefectModes, DelayTable, FinTrackConfig, SnapshotFormat, SCHEMA_VERSION};
pub use context::{DeterministicTime, ExecutionContext, SeededRandom};
pub use dashboard::{DashboardCache, DashboardSummary};
pub use error::{
    AuthError, FieldErrors, FinTrackError, RejectionError, SerializationError, SessionError,
    StorageError, ValidationError, WorkflowError,
};
pub use fees::{compute_fee, compute_total, FeeQuote};
pub use hasher::StateHasher;
pub use logging::{AuditLog, LogEntry, LogLevel};
pub use query::{DateRange, SortDirection, TransactionPage, TransactionQuery, TypeFilter};
pub use reconcile::{reconcile, LedgerComparator, LedgerComparison, ReconciliationReport};
pub use scheduler::{Completion, EventLoop, Task};
pub use session::{LoginForm, SessionMarker};
pub use settings::{PasswordChange, SettingsForm};
pub use statement::{Statement, StatementRow};
pub use storage::{FileStorage, MemoryStorage};
pub use store::{LedgerStore, LoadSource, SeedReason};
pub use traits::{BillIdSource, SnapshotStorage, State};
pub use transfer::{TransferForm, TransferQuote, TransferState, TransferWorkflow};
pub use types::{
    BillPayment, BillStatus, Ledger, NotificationFlags, StateHash, Transaction, TransactionDraft,
    TransactionKind, UserProfile,
};
