//! Dashboard summary
//!
//! The summary is captured on the first view after a page load and reused by
//! every later view, so it goes stale as soon as the ledger moves. Only
//! [`DashboardCache::hard_refresh`] drops it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::app::FinTrack;
use crate::config::Behavior;
use crate::error::SessionError;
use crate::money::mask_account_number;
use crate::query::DateRange;
use crate::types::{Ledger, Transaction, TransactionKind};

const RECENT_COUNT: usize = 5;

/// Debit total for one `YYYY-MM` month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub month: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub name: String,
    pub account_type: String,
    pub masked_account: String,
    /// Ledger balance when the summary was captured
    pub balance: Decimal,
    /// What the balance card shows
    pub display_balance: Decimal,
    pub recent: Vec<Transaction>,
    pub recent_credits: Decimal,
    pub recent_debits: Decimal,
    pub chart: Vec<ChartPoint>,
}

/// Shown balance. Under legacy parity exactly 10000 shows as 10500.
pub fn display_balance(balance: Decimal, mode: Behavior) -> Decimal {
    if mode.is_legacy() && balance == Decimal::from(10_000) {
        Decimal::from(10_500)
    } else {
        balance
    }
}

/// Debit totals of the last 30 days by month, oldest month first. Months with
/// only credits appear with a zero total.
pub fn chart(transactions: &[Transaction], now: DateTime<Utc>) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = Vec::new();
    for tx in transactions {
        if !DateRange::Last30Days.contains(tx, now) {
            continue;
        }
        let month = tx.date.format("%Y-%m").to_string();
        let debit = match tx.kind {
            TransactionKind::Debit => tx.amount,
            TransactionKind::Credit => Decimal::ZERO,
        };
        match points.iter_mut().find(|p| p.month == month) {
            Some(point) => point.amount += debit,
            None => points.push(ChartPoint { month, amount: debit }),
        }
    }
    points.reverse();
    points
}

/// First entries of the log, newest first
pub fn recent(transactions: &[Transaction]) -> &[Transaction] {
    &transactions[..transactions.len().min(RECENT_COUNT)]
}

fn total(transactions: &[Transaction], kind: TransactionKind) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.kind == kind)
        .map(|tx| tx.amount)
        .sum()
}

pub fn build_summary(ledger: &Ledger, now: DateTime<Utc>, display_mode: Behavior) -> DashboardSummary {
    let recent = recent(&ledger.transactions).to_vec();
    DashboardSummary {
        name: ledger.user.name.clone(),
        account_type: ledger.user.account_type.clone(),
        masked_account: mask_account_number(&ledger.user.account_number),
        balance: ledger.balance(),
        display_balance: display_balance(ledger.balance(), display_mode),
        recent_credits: total(&recent, TransactionKind::Credit),
        recent_debits: total(&recent, TransactionKind::Debit),
        recent,
        chart: chart(&ledger.transactions, now),
    }
}

/// Summary cache that lives for one page load
#[derive(Debug, Clone, Default)]
pub struct DashboardCache {
    snapshot: Option<DashboardSummary>,
}

impl DashboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached summary, captured from the live ledger on first use
    pub fn view(&mut self, app: &FinTrack) -> Result<&DashboardSummary, SessionError> {
        app.require_session()?;
        let mode = app.config().defects.display_balance;
        Ok(self
            .snapshot
            .get_or_insert_with(|| build_summary(app.read(), app.now(), mode)))
    }

    pub fn is_cached(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Forget the snapshot; the next view reads the live ledger
    pub fn hard_refresh(&mut self) {
        self.snapshot = None;
    }
}
