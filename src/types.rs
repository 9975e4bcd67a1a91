//! Core data types for the FinTrack ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blake3 hash of a serialized ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateHash(pub [u8; 32]);

impl StateHash {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    Credit,
    Debit,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Credit => "Credit",
            TransactionKind::Debit => "Debit",
        }
    }

    /// Sign applied to the amount when replaying the entry against a balance.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Credit => amount,
            TransactionKind::Debit => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable historical record in the transaction log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    /// Balance snapshot taken right after this entry was applied
    pub running_balance: Decimal,
    #[serde(default)]
    pub biller: Option<String>,
}

/// A transaction waiting to be appended.
///
/// The running balance is not part of the draft: it is read from the ledger at
/// the moment the append lands, whatever has happened to the balance since the
/// draft was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub id: String,
    /// `None` stamps the entry with the clock date at append time
    pub date: Option<NaiveDate>,
    pub description: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub biller: Option<String>,
}

impl TransactionDraft {
    pub fn into_transaction(self, today: NaiveDate, running_balance: Decimal) -> Transaction {
        Transaction {
            id: self.id,
            date: self.date.unwrap_or(today),
            description: self.description,
            kind: self.kind,
            amount: self.amount,
            running_balance,
            biller: self.biller,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillStatus {
    Paid,
    Scheduled,
    Failed,
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BillStatus::Paid => "Paid",
            BillStatus::Scheduled => "Scheduled",
            BillStatus::Failed => "Failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPayment {
    pub id: String,
    pub biller: String,
    pub consumer_number: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub status: BillStatus,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationFlags {
    pub email: bool,
    pub sms: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    /// Plaintext, compared with `==` only
    pub password: String,
    pub phone: String,
    pub address: String,
    pub account_number: String,
    pub account_type: String,
    pub balance: Decimal,
    pub notifications: NotificationFlags,
}

/// The aggregate root: profile, balance, and both logs, newest entries first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub user: UserProfile,
    pub transactions: Vec<Transaction>,
    pub bill_payments: Vec<BillPayment>,
    pub is_logged_in: bool,
}

impl Ledger {
    pub fn balance(&self) -> Decimal {
        self.user.balance
    }

    pub fn find_transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    pub fn bill_payments_with_id(&self, id: &str) -> Vec<&BillPayment> {
        self.bill_payments.iter().filter(|bp| bp.id == id).collect()
    }
}
