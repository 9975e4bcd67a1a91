//! Bill payment workflow
//!
//! A payment dated today is `Paid`: it debits the balance and appends a
//! transaction. Any other date, past or future, is `Scheduled` and stays that
//! way; nothing ever promotes it. The record lands after the bill payment delay
//! whether or not the workflow is still around to hear about it.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::app::FinTrack;
use crate::command::LedgerCommand;
use crate::context::SeededRandom;
use crate::error::{FieldErrors, FinTrackError, ValidationError, WorkflowError};
use crate::money::parse_amount;
use crate::scheduler::{Completion, Task};
use crate::traits::BillIdSource;
use crate::types::{BillPayment, BillStatus, TransactionDraft, TransactionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biller {
    Electricity,
    Internet,
    Water,
    Gas,
    MobileRecharge,
}

impl Biller {
    pub const ALL: [Biller; 5] = [
        Biller::Electricity,
        Biller::Internet,
        Biller::Water,
        Biller::Gas,
        Biller::MobileRecharge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Biller::Electricity => "Electricity",
            Biller::Internet => "Internet",
            Biller::Water => "Water",
            Biller::Gas => "Gas",
            Biller::MobileRecharge => "Mobile Recharge",
        }
    }

    pub fn from_name(name: &str) -> Option<Biller> {
        Self::ALL.into_iter().find(|b| b.as_str() == name)
    }
}

impl fmt::Display for Biller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fresh `bp-` id for every payment
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshBillIds;

impl BillIdSource for FreshBillIds {
    fn next_id(&mut self, random: &mut SeededRandom) -> String {
        format!("bp-{}", random.next_id())
    }

    fn clear(&mut self) {}
}

/// Hands out the first id it generated until cleared, so consecutive payments
/// share one id.
#[derive(Debug, Clone, Default)]
pub struct StickyBillIdCache {
    last: Option<String>,
}

impl StickyBillIdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

impl BillIdSource for StickyBillIdCache {
    fn next_id(&mut self, random: &mut SeededRandom) -> String {
        self.last
            .get_or_insert_with(|| format!("bp-{}", random.next_id()))
            .clone()
    }

    fn clear(&mut self) {
        self.last = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillPaymentForm {
    pub biller: Biller,
    pub consumer_number: String,
    pub amount: String,
    pub date: NaiveDate,
}

impl BillPaymentForm {
    /// Empty form for the first biller, dated `today`
    pub fn new(today: NaiveDate) -> Self {
        Self {
            biller: Biller::Electricity,
            consumer_number: String::new(),
            amount: String::new(),
            date: today,
        }
    }
}

/// Checked form input. Zero amounts and any date are accepted.
pub fn validate(form: &BillPaymentForm) -> Result<Decimal, FieldErrors> {
    let mut errors = FieldErrors::new();
    if form.consumer_number.trim().is_empty() {
        errors.insert("consumer", "Consumer number is required");
    }
    let amount = parse_amount(&form.amount);
    if amount.is_none() {
        errors.insert("amount", "Please enter a valid amount");
    }
    match amount {
        Some(amount) if errors.is_empty() => Ok(amount),
        _ => Err(errors),
    }
}

/// `Paid` only for today; past dates are scheduled too.
pub fn classify(date: NaiveDate, today: NaiveDate) -> BillStatus {
    if date == today {
        BillStatus::Paid
    } else {
        BillStatus::Scheduled
    }
}

/// `date` plus one calendar month, letting a day past the end of the target
/// month spill into the following one (Jan 31 becomes Mar 3 in a common year).
pub fn naive_next_run(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first
            .checked_add_signed(Duration::days(i64::from(date.day()) - 1))
            .unwrap_or(date),
        None => date,
    }
}

/// What the caller gets back at submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillSubmission {
    pub payment: BillPayment,
    /// Recurrence date computed for scheduled payments; reported only
    pub next_run: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillState {
    Form,
    Processing(BillSubmission),
    Success(BillPayment),
}

impl BillState {
    fn name(&self) -> &'static str {
        match self {
            BillState::Form => "form",
            BillState::Processing(_) => "processing",
            BillState::Success(_) => "success",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BillPaymentWorkflow {
    state: BillState,
}

impl Default for BillPaymentWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl BillPaymentWorkflow {
    pub fn new() -> Self {
        Self {
            state: BillState::Form,
        }
    }

    pub fn state(&self) -> &BillState {
        &self.state
    }

    /// Validate, build the payment record, and schedule it to land after the
    /// bill payment delay.
    pub fn pay(
        &mut self,
        app: &mut FinTrack,
        form: &BillPaymentForm,
    ) -> Result<BillSubmission, FinTrackError> {
        if matches!(self.state, BillState::Processing(_)) {
            return Err(WorkflowError::InvalidTransition {
                state: self.state.name(),
                action: "pay",
            }
            .into());
        }
        app.require_session()?;
        let amount = validate(form).map_err(ValidationError::Fields)?;

        let today = app.today();
        let status = classify(form.date, today);
        if status == BillStatus::Paid && app.read().balance().checked_sub(amount).is_none() {
            let mut errors = FieldErrors::new();
            errors.insert("amount", "Bill amount is out of range");
            return Err(ValidationError::Fields(errors).into());
        }
        let next_run = (status == BillStatus::Scheduled).then(|| naive_next_run(form.date));
        let reference = format!("BP-{}", app.context_mut().random().next_id());
        let id = app.next_bill_id();

        let payment = BillPayment {
            id,
            biller: form.biller.as_str().to_string(),
            consumer_number: form.consumer_number.clone(),
            amount,
            date: form.date,
            status,
            reference,
        };

        let mut commands = vec![LedgerCommand::AppendBillPayment(payment.clone())];
        if status == BillStatus::Paid {
            let tx_id = format!("tx-{}", app.context_mut().random().next_id());
            commands.push(LedgerCommand::Debit { amount });
            commands.push(LedgerCommand::AppendTransaction(TransactionDraft {
                id: tx_id,
                date: Some(form.date),
                description: format!("{} Bill Payment", form.biller),
                kind: TransactionKind::Debit,
                amount,
                biller: Some(form.biller.as_str().to_string()),
            }));
        }

        tracing::info!(
            payment = %payment.id,
            status = %payment.status,
            amount = %amount,
            "Submitted bill payment"
        );
        let task = Task::new(format!("bill_payment {}", payment.reference))
            .with_command(LedgerCommand::Batch(commands))
            .with_completion(Completion::BillPaymentApplied {
                payment: payment.clone(),
            });
        let delay = app.config().delays.bill_payment_ms;
        app.schedule(delay, task);

        let submission = BillSubmission { payment, next_run };
        self.state = BillState::Processing(submission.clone());
        Ok(submission)
    }

    /// Feed a completion from the event loop. Returns whether it was ours.
    pub fn on_completion(&mut self, completion: &Completion) -> bool {
        let BillState::Processing(submission) = &self.state else {
            return false;
        };
        match completion {
            Completion::BillPaymentApplied { payment }
                if payment.reference == submission.payment.reference =>
            {
                self.state = BillState::Success(payment.clone());
                true
            }
            Completion::Refused { label, .. }
                if *label == format!("bill_payment {}", submission.payment.reference) =>
            {
                self.state = BillState::Form;
                true
            }
            _ => false,
        }
    }

    /// Back to an empty form after a success
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        match self.state {
            BillState::Success(_) => {
                self.state = BillState::Form;
                Ok(())
            }
            _ => Err(WorkflowError::InvalidTransition {
                state: self.state.name(),
                action: "reset",
            }),
        }
    }
}
