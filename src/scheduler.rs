//! Single-threaded virtual-time event loop
//!
//! Workflows suspend only at simulated I/O delays. A delay is a [`Task`]
//! scheduled on this loop; its command lands on the shared store when virtual
//! time reaches its due time, whatever else has happened in between and
//! whether or not the workflow that scheduled it still exists.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use crate::command::{CommandOutcome, LedgerCommand};
use crate::context::{later_by_ms, ExecutionContext};
use crate::store::LedgerStore;
use crate::types::BillPayment;

/// Notification delivered to workflows when a scheduled task finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    TransferSettled {
        reference: String,
        transaction_id: String,
    },
    BillPaymentApplied {
        payment: BillPayment,
    },
    ProfileSaved,
    PasswordChanged,
    NotificationPreferencesSaved,
    /// The store refused the task's command. Its follow-up and completion
    /// are dropped.
    Refused {
        label: String,
        reason: String,
    },
}

/// Deferred unit of work
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub label: String,
    pub command: Option<LedgerCommand>,
    pub completion: Option<Completion>,
    /// Scheduled relative to this task's run time, after it ran
    pub follow_up: Option<(u64, Box<Task>)>,
}

impl Task {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: None,
            completion: None,
            follow_up: None,
        }
    }

    pub fn with_command(mut self, command: LedgerCommand) -> Self {
        self.command = Some(command);
        self
    }

    pub fn with_completion(mut self, completion: Completion) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn then(mut self, delay_ms: u64, task: Task) -> Self {
        self.follow_up = Some((delay_ms, Box::new(task)));
        self
    }
}

/// Result of running one task
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub label: String,
    pub ran_at: DateTime<Utc>,
    pub outcome: Option<CommandOutcome>,
    /// Why the store refused the command, if it did
    pub error: Option<String>,
}

/// Task records kept for inspection; older ones are dropped first
pub const HISTORY_LIMIT: usize = 1_000;

#[derive(Debug)]
struct Scheduled {
    due: DateTime<Utc>,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed: BinaryHeap is a max-heap, the earliest (due, seq) must pop first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct EventLoop {
    queue: BinaryHeap<Scheduled>,
    next_seq: u64,
    history: Vec<TaskRecord>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run `delay_ms` after the context's current time
    pub fn schedule(&mut self, context: &ExecutionContext, delay_ms: u64, task: Task) {
        let due = later_by_ms(context.now(), delay_ms);
        self.schedule_at(due, task);
    }

    fn schedule_at(&mut self, due: DateTime<Utc>, task: Task) {
        tracing::debug!(task = %task.label, due = %due, "Scheduled task");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Scheduled { due, seq, task });
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.queue.peek().map(|scheduled| scheduled.due)
    }

    /// The most recent [`HISTORY_LIMIT`] tasks that ran, in run order
    pub fn history(&self) -> &[TaskRecord] {
        &self.history
    }

    /// Move virtual time forward by `ms`, running every task that falls due,
    /// including follow-ups that become due inside the window.
    pub fn advance(
        &mut self,
        ms: u64,
        store: &mut LedgerStore,
        context: &mut ExecutionContext,
    ) -> Vec<Completion> {
        let deadline = later_by_ms(context.now(), ms);
        let completions = self.run_due(deadline, store, context);
        context.clock_mut().advance_to(deadline);
        completions
    }

    /// Run until nothing is queued. Virtual time ends at the last task's due time.
    pub fn run_until_idle(
        &mut self,
        store: &mut LedgerStore,
        context: &mut ExecutionContext,
    ) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(due) = self.next_due() {
            completions.extend(self.run_due(due, store, context));
        }
        completions
    }

    fn run_due(
        &mut self,
        deadline: DateTime<Utc>,
        store: &mut LedgerStore,
        context: &mut ExecutionContext,
    ) -> Vec<Completion> {
        let mut completions = Vec::new();

        while self.next_due().is_some_and(|due| due <= deadline) {
            let Some(Scheduled { due, task, .. }) = self.queue.pop() else {
                break;
            };
            context.clock_mut().advance_to(due);

            let (outcome, error) = match task.command {
                None => (None, None),
                Some(command) => match store.dispatch(command, context.now()) {
                    Ok(outcome) => (Some(outcome), None),
                    Err(e) => (None, Some(e.to_string())),
                },
            };
            self.record(TaskRecord {
                label: task.label.clone(),
                ran_at: context.now(),
                outcome,
                error: error.clone(),
            });

            if let Some(reason) = error {
                tracing::error!(task = %task.label, error = %reason, "Scheduled task refused");
                completions.push(Completion::Refused {
                    label: task.label,
                    reason,
                });
                continue;
            }
            if let Some((delay_ms, follow_up)) = task.follow_up {
                self.schedule(context, delay_ms, *follow_up);
            }
            if let Some(completion) = task.completion {
                completions.push(completion);
            }
        }

        completions
    }

    fn record(&mut self, record: TaskRecord) {
        if self.history.len() >= HISTORY_LIMIT {
            let excess = self.history.len() + 1 - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
        self.history.push(record);
    }
}
