//! Fund transfer workflow: `Form -> Review -> Confirming -> Success`
//!
//! Confirmation schedules the settlement on the event loop. Nothing guards a
//! second `confirm` while the first is still settling, so two confirmations
//! debit twice and log twice.

use rust_decimal::Decimal;

use crate::app::FinTrack;
use crate::command::LedgerCommand;
use crate::config::{Behavior, DefectModes};
use crate::error::{FieldErrors, FinTrackError, RejectionError, ValidationError, WorkflowError};
use crate::fees::FeeQuote;
use crate::money::parse_amount;
use crate::scheduler::{Completion, Task};
use crate::types::{TransactionDraft, TransactionKind};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferForm {
    pub recipient_account: String,
    pub recipient_name: String,
    pub amount: String,
    pub reference: String,
}

impl TransferForm {
    pub fn new(
        recipient_account: impl Into<String>,
        recipient_name: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            recipient_account: recipient_account.into(),
            recipient_name: recipient_name.into(),
            amount: amount.into(),
            reference: String::new(),
        }
    }
}

/// Reviewed transfer: who gets what and what it costs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferQuote {
    pub recipient_account: String,
    pub recipient_name: String,
    pub note: String,
    pub principal: Decimal,
    pub fee: Decimal,
    pub total: Decimal,
}

impl TransferQuote {
    /// `None` when the fee or total cannot be represented
    pub fn new(form: &TransferForm, principal: Decimal, fee_rate: Decimal) -> Option<Self> {
        let FeeQuote { fee, total, .. } = FeeQuote::new(principal, fee_rate)?;
        Some(Self {
            recipient_account: form.recipient_account.clone(),
            recipient_name: form.recipient_name.clone(),
            note: form.reference.clone(),
            principal,
            fee,
            total,
        })
    }

    /// `Fund Transfer to 4321`
    pub fn description(&self) -> String {
        let chars: Vec<char> = self.recipient_account.chars().collect();
        let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
        format!("Fund Transfer to {}", tail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub reference: String,
    pub transaction_id: String,
    pub quote: TransferQuote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferState {
    Form,
    Review(TransferQuote),
    /// One reference per confirmation still settling
    Confirming {
        quote: TransferQuote,
        references: Vec<String>,
    },
    Success(TransferReceipt),
}

impl TransferState {
    pub fn name(&self) -> &'static str {
        match self {
            TransferState::Form => "form",
            TransferState::Review(_) => "review",
            TransferState::Confirming { .. } => "confirming",
            TransferState::Success(_) => "success",
        }
    }
}

/// Field-level checks. Returns the parsed principal.
///
/// Zero is always rejected. Negative amounts and the sender's own account
/// number get through unless their defect modes are fixed.
pub fn validate(
    form: &TransferForm,
    own_account: &str,
    defects: &DefectModes,
) -> Result<Decimal, FieldErrors> {
    let mut errors = FieldErrors::new();
    if form.recipient_account.trim().is_empty() {
        errors.insert("recipient", "Recipient account number is required");
    }
    if form.recipient_name.trim().is_empty() {
        errors.insert("recipientName", "Recipient name is required");
    }

    let amount = parse_amount(&form.amount);
    match amount {
        None => errors.insert("amount", "Please enter a valid amount"),
        Some(a) if a.is_zero() => errors.insert("amount", "Transfer amount must be greater than BDT 0"),
        Some(a) if a.is_sign_negative() && defects.negative_transfer_amount.is_fixed() => {
            errors.insert("amount", "Transfer amount must be greater than BDT 0")
        }
        Some(_) => {}
    }

    if defects.self_transfer.is_fixed() && form.recipient_account.trim() == own_account {
        errors.insert("recipient", "Cannot transfer to yourself");
    }

    match amount {
        Some(amount) if errors.is_empty() => Ok(amount),
        _ => Err(errors),
    }
}

fn amount_out_of_range() -> FinTrackError {
    let mut errors = FieldErrors::new();
    errors.insert("amount", "Transfer amount is out of range");
    ValidationError::Fields(errors).into()
}

/// Positive principals whose total exceeds the balance are refused
pub fn check_affordability(quote: &TransferQuote, balance: Decimal) -> Result<(), RejectionError> {
    if quote.principal > Decimal::ZERO && quote.total > balance {
        return Err(RejectionError::InsufficientBalance {
            required: quote.total,
            available: balance,
        });
    }
    Ok(())
}

/// Amount actually taken from the balance at settlement. Under legacy parity a
/// principal at or above `threshold` is never deducted, only its fee.
pub fn settlement_debit(quote: &TransferQuote, threshold: Decimal, mode: Behavior) -> Decimal {
    if mode.is_legacy() && quote.principal >= threshold {
        quote.fee
    } else {
        quote.total
    }
}

#[derive(Debug, Clone)]
pub struct TransferWorkflow {
    state: TransferState,
}

impl Default for TransferWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferWorkflow {
    pub fn new() -> Self {
        Self {
            state: TransferState::Form,
        }
    }

    pub fn state(&self) -> &TransferState {
        &self.state
    }

    fn invalid(&self, action: &'static str) -> FinTrackError {
        WorkflowError::InvalidTransition {
            state: self.state.name(),
            action,
        }
        .into()
    }

    /// Validate the form and price it. Moves to `Review` on success.
    pub fn continue_to_review(
        &mut self,
        app: &mut FinTrack,
        form: &TransferForm,
    ) -> Result<TransferQuote, FinTrackError> {
        if !matches!(self.state, TransferState::Form) {
            return Err(self.invalid("continue"));
        }
        app.require_session()?;

        let ledger = app.read();
        let principal = validate(form, &ledger.user.account_number, &app.config().defects)
            .map_err(ValidationError::Fields)?;
        let quote = TransferQuote::new(form, principal, app.config().fee_rate)
            .filter(|quote| ledger.balance().checked_sub(quote.total).is_some())
            .ok_or_else(amount_out_of_range)?;
        check_affordability(&quote, ledger.balance())?;

        tracing::debug!(principal = %quote.principal, fee = %quote.fee, "Transfer ready for review");
        self.state = TransferState::Review(quote.clone());
        Ok(quote)
    }

    /// `Review -> Form`, keeping nothing
    pub fn back_to_form(&mut self) -> Result<(), FinTrackError> {
        match self.state {
            TransferState::Review(_) => {
                self.state = TransferState::Form;
                Ok(())
            }
            _ => Err(self.invalid("edit")),
        }
    }

    /// Schedule a settlement and return its reference.
    ///
    /// Accepted from `Review` and again from `Confirming`; every accepted call
    /// debits and logs on its own.
    pub fn confirm(&mut self, app: &mut FinTrack) -> Result<String, FinTrackError> {
        let quote = match &self.state {
            TransferState::Review(quote) | TransferState::Confirming { quote, .. } => quote.clone(),
            _ => return Err(self.invalid("confirm")),
        };

        let config = app.config();
        let rate = config.fee_rate;
        let threshold = config.large_transfer_threshold;
        let mode = config.defects.large_transfer_principal;
        let settle_ms = config.delays.transfer_settle_ms;
        let jitter_bound = config.delays.transfer_jitter_ms;
        let record_ms = config.delays.transfer_record_ms;

        // Priced again at confirmation time
        let FeeQuote { fee, total, .. } =
            FeeQuote::new(quote.principal, rate).ok_or_else(amount_out_of_range)?;
        let quote = TransferQuote { fee, total, ..quote };
        let debit = settlement_debit(&quote, threshold, mode);

        let random = app.context_mut().random();
        let reference = format!("TXN-{}", random.next_id());
        let transaction_id = format!("tx-{}", random.next_id());
        let delay = settle_ms.saturating_add(random.jitter_ms(jitter_bound));

        let record = Task::new(format!("transfer_record {}", reference))
            .with_command(LedgerCommand::AppendTransaction(TransactionDraft {
                id: transaction_id.clone(),
                date: None,
                description: quote.description(),
                kind: TransactionKind::Debit,
                amount: quote.total,
                biller: None,
            }))
            .with_completion(Completion::TransferSettled {
                reference: reference.clone(),
                transaction_id,
            });
        let settle = Task::new(format!("transfer_settle {}", reference))
            .with_command(LedgerCommand::Debit { amount: debit })
            .then(record_ms, record);
        app.schedule(delay, settle);

        tracing::info!(
            reference = %reference,
            principal = %quote.principal,
            debit = %debit,
            delay_ms = delay,
            "Confirmed transfer"
        );

        match &mut self.state {
            TransferState::Confirming { references, .. } => references.push(reference.clone()),
            _ => {
                self.state = TransferState::Confirming {
                    quote,
                    references: vec![reference.clone()],
                }
            }
        }
        Ok(reference)
    }

    /// Feed a completion from the event loop. The first settlement of ours to
    /// land moves the workflow to `Success`. A refused settlement drops its
    /// reference; with none left the workflow returns to `Review`.
    pub fn on_completion(&mut self, completion: &Completion) -> bool {
        if let Completion::Refused { label, .. } = completion {
            return self.on_refused(label);
        }
        let Completion::TransferSettled {
            reference,
            transaction_id,
        } = completion
        else {
            return false;
        };
        match &self.state {
            TransferState::Confirming { quote, references } if references.contains(reference) => {
                self.state = TransferState::Success(TransferReceipt {
                    reference: reference.clone(),
                    transaction_id: transaction_id.clone(),
                    quote: quote.clone(),
                });
                true
            }
            _ => false,
        }
    }

    fn on_refused(&mut self, label: &str) -> bool {
        let TransferState::Confirming { quote, references } = &mut self.state else {
            return false;
        };
        let Some(reference) = label.strip_prefix("transfer_settle ") else {
            return false;
        };
        let before = references.len();
        references.retain(|pending| pending != reference);
        if references.len() == before {
            return false;
        }
        if references.is_empty() {
            self.state = TransferState::Review(quote.clone());
        }
        true
    }

    /// `Success -> Form` for a new transfer
    pub fn reset(&mut self) -> Result<(), FinTrackError> {
        match self.state {
            TransferState::Success(_) => {
                self.state = TransferState::Form;
                Ok(())
            }
            _ => Err(self.invalid("reset")),
        }
    }
}
