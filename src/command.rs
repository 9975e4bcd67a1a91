//! Ledger mutations as values
//!
//! Workflows never touch the ledger directly. They build [`LedgerCommand`]s and
//! hand them to the store, which applies each dispatch and then commits once.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{BillPayment, Ledger, NotificationFlags, TransactionDraft};

/// Contact fields written by a profile save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileChanges {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    /// Subtract from the balance. No sign or sufficiency check, only overflow.
    Debit { amount: Decimal },
    /// Insert at the head of the transaction log
    AppendTransaction(TransactionDraft),
    /// Insert at the head of the bill payment log
    AppendBillPayment(BillPayment),
    UpdateProfile(ProfileChanges),
    SetPassword(String),
    SetNotifications(NotificationFlags),
    SetLoggedIn(bool),
    /// Applied in order under a single commit
    Batch(Vec<LedgerCommand>),
}

/// What a single dispatch changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    /// Ids of transactions appended, in application order
    pub appended_transactions: Vec<String>,
    /// Ids of bill payments appended, in application order
    pub appended_bill_payments: Vec<String>,
}

impl LedgerCommand {
    pub fn label(&self) -> &'static str {
        match self {
            LedgerCommand::Debit { .. } => "debit",
            LedgerCommand::AppendTransaction(_) => "append_transaction",
            LedgerCommand::AppendBillPayment(_) => "append_bill_payment",
            LedgerCommand::UpdateProfile(_) => "update_profile",
            LedgerCommand::SetPassword(_) => "set_password",
            LedgerCommand::SetNotifications(_) => "set_notifications",
            LedgerCommand::SetLoggedIn(_) => "set_logged_in",
            LedgerCommand::Batch(_) => "batch",
        }
    }

    /// Balance left after this command, or `None` if any debit in it overflows
    pub fn balance_after(&self, balance: Decimal) -> Option<Decimal> {
        match self {
            LedgerCommand::Debit { amount } => balance.checked_sub(*amount),
            LedgerCommand::Batch(commands) => commands
                .iter()
                .try_fold(balance, |balance, command| command.balance_after(balance)),
            _ => Some(balance),
        }
    }

    /// Apply in place. `today` dates transaction drafts that carry no date.
    ///
    /// All or nothing: a command whose debits would overflow the balance is
    /// refused before any part of it is applied.
    pub fn apply(
        &self,
        ledger: &mut Ledger,
        today: NaiveDate,
        outcome: &mut CommandOutcome,
    ) -> Result<(), ValidationError> {
        if self.balance_after(ledger.user.balance).is_none() {
            return Err(ValidationError::BalanceOverflow {
                command: self.label(),
            });
        }
        self.apply_checked(ledger, today, outcome);
        Ok(())
    }

    fn apply_checked(&self, ledger: &mut Ledger, today: NaiveDate, outcome: &mut CommandOutcome) {
        match self {
            LedgerCommand::Debit { amount } => {
                if let Some(balance) = ledger.user.balance.checked_sub(*amount) {
                    ledger.user.balance = balance;
                }
            }
            LedgerCommand::AppendTransaction(draft) => {
                let tx = draft.clone().into_transaction(today, ledger.user.balance);
                outcome.appended_transactions.push(tx.id.clone());
                ledger.transactions.insert(0, tx);
            }
            LedgerCommand::AppendBillPayment(payment) => {
                outcome.appended_bill_payments.push(payment.id.clone());
                ledger.bill_payments.insert(0, payment.clone());
            }
            LedgerCommand::UpdateProfile(changes) => {
                ledger.user.name = changes.name.clone();
                ledger.user.phone = changes.phone.clone();
                ledger.user.address = changes.address.clone();
                ledger.user.email = changes.email.clone();
            }
            LedgerCommand::SetPassword(password) => {
                ledger.user.password = password.clone();
            }
            LedgerCommand::SetNotifications(flags) => {
                ledger.user.notifications = *flags;
            }
            LedgerCommand::SetLoggedIn(logged_in) => {
                ledger.is_logged_in = *logged_in;
            }
            LedgerCommand::Batch(commands) => {
                for command in commands {
                    command.apply_checked(ledger, today, outcome);
                }
            }
        }
    }
}
