//! Ledger reconciliation
//!
//! Silent defects report success while the ledger goes wrong, so tests check
//! the ledger itself: [`reconcile`] replays the log and [`LedgerComparator`]
//! explains what changed between two ledger states.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::hasher::StateHasher;
use crate::types::Ledger;

/// Whether one transaction's running balance follows from its predecessor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCheck {
    /// Position in replay order, oldest first
    pub index: usize,
    pub transaction_id: String,
    /// Predecessor's running balance plus this transaction's signed amount;
    /// `None` for the oldest entry
    pub expected: Option<Decimal>,
    pub recorded: Decimal,
    pub chains: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub checks: Vec<ChainCheck>,
    /// Newest running balance equals the current balance
    pub head_matches_balance: bool,
    pub balanced: bool,
}

impl ReconciliationReport {
    pub fn broken_links(&self) -> Vec<&ChainCheck> {
        self.checks.iter().filter(|check| !check.chains).collect()
    }
}

/// Replay the transaction log oldest to newest
pub fn reconcile(ledger: &Ledger) -> ReconciliationReport {
    let mut checks = Vec::with_capacity(ledger.transactions.len());
    let mut previous: Option<Decimal> = None;

    for (index, tx) in ledger.transactions.iter().rev().enumerate() {
        let expected = previous.map(|balance| balance + tx.kind.signed(tx.amount));
        checks.push(ChainCheck {
            index,
            transaction_id: tx.id.clone(),
            expected,
            recorded: tx.running_balance,
            chains: expected.map_or(true, |e| e == tx.running_balance),
        });
        previous = Some(tx.running_balance);
    }

    let head_matches_balance = ledger
        .transactions
        .first()
        .map_or(true, |tx| tx.running_balance == ledger.balance());
    let balanced = head_matches_balance && checks.iter().all(|check| check.chains);

    ReconciliationReport {
        checks,
        head_matches_balance,
        balanced,
    }
}

/// What happened to the ledger between two observations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerComparison {
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    /// Transactions at the head of `after` that `before` did not have
    pub new_transactions: Vec<String>,
    /// Signed sum of the new transactions
    pub logged_delta: Decimal,
    pub new_bill_payments: usize,
    pub hashes_match: bool,
}

impl LedgerComparison {
    pub fn balance_delta(&self) -> Decimal {
        self.balance_after - self.balance_before
    }

    /// Balance movement the log does not account for
    pub fn unlogged_delta(&self) -> Decimal {
        self.balance_delta() - self.logged_delta
    }
}

#[derive(Debug, Default)]
pub struct LedgerComparator {
    hasher: StateHasher,
}

impl LedgerComparator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compare(&self, before: &Ledger, after: &Ledger) -> LedgerComparison {
        let added = after.transactions.len().saturating_sub(before.transactions.len());
        let new = &after.transactions[..added];

        let hashes_match = match (self.hasher.hash(before), self.hasher.hash(after)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };

        LedgerComparison {
            balance_before: before.balance(),
            balance_after: after.balance(),
            new_transactions: new.iter().map(|tx| tx.id.clone()).collect(),
            logged_delta: new.iter().map(|tx| tx.kind.signed(tx.amount)).sum(),
            new_bill_payments: after.bill_payments.len().saturating_sub(before.bill_payments.len()),
            hashes_match,
        }
    }
}
