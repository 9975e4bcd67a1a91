//! Application service: one owner for the store, the event loop, and the
//! execution context

use chrono::{DateTime, NaiveDate, Utc};

use crate::bills::{FreshBillIds, StickyBillIdCache};
use crate::command::{CommandOutcome, LedgerCommand};
use crate::config::FinTrackConfig;
use crate::context::ExecutionContext;
use crate::error::{FinTrackError, SessionError};
use crate::scheduler::{Completion, EventLoop, Task};
use crate::session;
use crate::store::LedgerStore;
use crate::traits::{BillIdSource, SnapshotStorage};
use crate::types::Ledger;

pub struct FinTrack {
    config: FinTrackConfig,
    context: ExecutionContext,
    store: LedgerStore,
    events: EventLoop,
    bill_ids: Box<dyn BillIdSource>,
    /// Completions that fell due while an operation was sleeping
    deferred: Vec<Completion>,
}

impl FinTrack {
    /// Open the ledger over `storage` using the configured clock, seed and
    /// snapshot format. The bill id source follows `defects.bill_id_reuse`.
    pub fn new(config: FinTrackConfig, storage: Box<dyn SnapshotStorage>) -> Self {
        let bill_ids: Box<dyn BillIdSource> = if config.defects.bill_id_reuse.is_legacy() {
            Box::new(StickyBillIdCache::new())
        } else {
            Box::new(FreshBillIds)
        };
        Self::with_bill_ids(config, storage, bill_ids)
    }

    pub fn with_bill_ids(
        config: FinTrackConfig,
        storage: Box<dyn SnapshotStorage>,
        bill_ids: Box<dyn BillIdSource>,
    ) -> Self {
        let mut builder = ExecutionContext::builder().with_random_seed(config.random_seed);
        if let Some(start) = config.start_time {
            builder = builder.with_time(start);
        }
        let context = builder.build();
        let store = LedgerStore::open(
            storage,
            config.snapshot_format,
            &config.schema_version,
            context.now(),
        );

        Self {
            config,
            context,
            store,
            events: EventLoop::new(),
            bill_ids,
            deferred: Vec::new(),
        }
    }

    pub fn config(&self) -> &FinTrackConfig {
        &self.config
    }

    pub fn read(&self) -> &Ledger {
        self.store.read()
    }

    pub fn dispatch(&mut self, command: LedgerCommand) -> Result<CommandOutcome, FinTrackError> {
        let now = self.context.now();
        self.store.dispatch(command, now)
    }

    pub fn schedule(&mut self, delay_ms: u64, task: Task) {
        self.events.schedule(&self.context, delay_ms, task);
    }

    /// Let `ms` of virtual time pass, running whatever falls due. Also returns
    /// completions held back by an earlier [`FinTrack::sleep`].
    pub fn advance(&mut self, ms: u64) -> Vec<Completion> {
        let mut completions = std::mem::take(&mut self.deferred);
        completions.extend(self.events.advance(ms, &mut self.store, &mut self.context));
        completions
    }

    pub fn run_until_idle(&mut self) -> Vec<Completion> {
        let mut completions = std::mem::take(&mut self.deferred);
        completions.extend(self.events.run_until_idle(&mut self.store, &mut self.context));
        completions
    }

    /// Suspend the caller for `ms`. Other tasks keep landing meanwhile; their
    /// completions are handed out by the next `advance` or `run_until_idle`.
    pub fn sleep(&mut self, ms: u64) {
        let completions = self.events.advance(ms, &mut self.store, &mut self.context);
        self.deferred.extend(completions);
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.context.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.context.today()
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LedgerStore {
        &mut self.store
    }

    pub fn events(&self) -> &EventLoop {
        &self.events
    }

    /// Next bill payment id from the injected source
    pub fn next_bill_id(&mut self) -> String {
        self.bill_ids.next_id(self.context.random())
    }

    pub fn bill_ids_mut(&mut self) -> &mut dyn BillIdSource {
        self.bill_ids.as_mut()
    }

    /// Gate for protected operations
    pub fn require_session(&self) -> Result<(), SessionError> {
        session::require_session(self.store.storage())
    }
}

impl std::fmt::Debug for FinTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinTrack")
            .field("now", &self.context.now())
            .field("store", &self.store)
            .field("pending_tasks", &self.events.pending())
            .finish()
    }
}
