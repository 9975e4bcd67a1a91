//! Transfer workflow against the shared ledger
//!
//! These tests verify:
//! - Fee, total and debit arithmetic for standard and large transfers
//! - The asymmetric amount validation
//! - Settlement timing, double confirmation and settlement after the view is gone

mod common;

use common::{config, d, logged_in, top_up, RECIPIENT};
use fintrack::transfer::TransferWorkflow;
use fintrack::{
    Behavior, Completion, DefectModes, FinTrack, FinTrackError, LedgerCommand, LedgerComparator,
    MemoryStorage, SessionError, TransactionKind, TransferForm, TransferState, WorkflowError,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use proptest::prelude::*;

fn submit(app: &mut FinTrack, amount: &str) -> TransferWorkflow {
    let mut workflow = TransferWorkflow::new();
    workflow
        .continue_to_review(app, &TransferForm::new(RECIPIENT, "Rahim Uddin", amount))
        .unwrap();
    workflow
}

fn settle(app: &mut FinTrack, workflow: &mut TransferWorkflow) {
    for completion in app.run_until_idle() {
        workflow.on_completion(&completion);
    }
}

#[test]
fn test_standard_transfer_end_to_end() {
    let mut app = logged_in(config());
    let mut workflow = TransferWorkflow::new();

    let quote = workflow
        .continue_to_review(&mut app, &TransferForm::new(RECIPIENT, "Rahim Uddin", "1000"))
        .unwrap();
    assert_eq!(quote.fee, d(15));
    assert_eq!(quote.total, d(1015));

    let reference = workflow.confirm(&mut app).unwrap();
    assert!(reference.starts_with("TXN-"));
    settle(&mut app, &mut workflow);

    let ledger = app.read();
    assert_eq!(ledger.balance(), d(23_985));
    assert_eq!(ledger.transactions.len(), 51);

    let head = &ledger.transactions[0];
    assert_eq!(head.kind, TransactionKind::Debit);
    assert_eq!(head.amount, d(1015));
    assert_eq!(head.running_balance, d(23_985));
    assert_eq!(head.description, "Fund Transfer to 4321");
    assert_eq!(head.date, app.today());

    match workflow.state() {
        TransferState::Success(receipt) => {
            assert_eq!(receipt.reference, reference);
            assert_eq!(receipt.transaction_id, head.id);
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_debit_waits_for_settlement_delay() {
    let mut app = logged_in(config());
    let mut workflow = submit(&mut app, "1000");
    workflow.confirm(&mut app).unwrap();

    app.advance(2_999);
    assert_eq!(app.read().balance(), d(25_000));

    // Settle (at most 3999ms) then record (300ms later)
    app.advance(1_301);
    assert_eq!(app.read().balance(), d(23_985));
    assert_eq!(app.read().transactions.len(), 51);
}

#[test]
fn test_settlement_lands_after_workflow_is_dropped() {
    let mut app = logged_in(config());
    {
        let mut workflow = submit(&mut app, "2000");
        workflow.confirm(&mut app).unwrap();
    }

    app.run_until_idle();
    assert_eq!(app.read().balance(), d(25_000 - 2030));
}

#[test]
fn test_double_confirm_debits_twice() {
    let mut app = logged_in(config());
    let mut workflow = submit(&mut app, "1000");

    let first = workflow.confirm(&mut app).unwrap();
    let second = workflow.confirm(&mut app).unwrap();
    assert_ne!(first, second);
    assert!(matches!(workflow.state(), TransferState::Confirming { references, .. } if references.len() == 2));

    settle(&mut app, &mut workflow);

    let ledger = app.read();
    assert_eq!(ledger.balance(), d(25_000 - 2 * 1015));
    let new: Vec<_> = ledger.transactions[..2].iter().collect();
    assert!(new.iter().all(|tx| tx.amount == d(1015)));
    assert_ne!(new[0].id, new[1].id);
    assert!(matches!(workflow.state(), TransferState::Success(_)));
}

#[test]
fn test_large_transfer_skips_principal_under_legacy_parity() {
    let mut app = logged_in(config());
    top_up(&mut app, 100_000);
    let before = app.read().clone();

    let mut workflow = submit(&mut app, "50000");
    workflow.confirm(&mut app).unwrap();
    settle(&mut app, &mut workflow);

    let after = app.read();
    assert_eq!(after.balance(), before.balance() - d(750));
    assert_eq!(after.transactions[0].amount, d(50_750));

    let diff = LedgerComparator::new().compare(&before, after);
    assert_eq!(diff.unlogged_delta(), d(50_000));
}

#[test]
fn test_large_transfer_fixed_debits_total() {
    let mut defects = DefectModes::legacy();
    defects.large_transfer_principal = Behavior::Fixed;
    let mut app = logged_in(config().with_defects(defects));
    top_up(&mut app, 100_000);

    let mut workflow = submit(&mut app, "50000");
    workflow.confirm(&mut app).unwrap();
    settle(&mut app, &mut workflow);

    assert_eq!(app.read().balance(), d(125_000 - 50_750));
}

#[test]
fn test_negative_amount_credits_under_legacy_parity() {
    let mut app = logged_in(config());
    let mut workflow = submit(&mut app, "-500");
    workflow.confirm(&mut app).unwrap();
    settle(&mut app, &mut workflow);

    // -500 + floor(-7.5)
    assert_eq!(app.read().balance(), d(25_508));
    assert_eq!(app.read().transactions[0].amount, d(-508));
}

#[test]
fn test_zero_amount_is_rejected() {
    let mut app = logged_in(config());
    let mut workflow = TransferWorkflow::new();

    let err = workflow
        .continue_to_review(&mut app, &TransferForm::new(RECIPIENT, "Rahim Uddin", "0"))
        .unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors.get("amount"), Some("Transfer amount must be greater than BDT 0"));
    assert_eq!(workflow.state(), &TransferState::Form);
}

#[test]
fn test_fixed_negative_amount_is_rejected() {
    let mut app = logged_in(config().with_defects(DefectModes::fixed()));
    let mut workflow = TransferWorkflow::new();

    let err = workflow
        .continue_to_review(&mut app, &TransferForm::new(RECIPIENT, "Rahim Uddin", "-500"))
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains("amount"));
}

#[test]
fn test_insufficient_balance_is_rejected_without_mutation() {
    let mut app = logged_in(config());
    let hash = app.store().current_hash().unwrap();
    let mut workflow = TransferWorkflow::new();

    let err = workflow
        .continue_to_review(&mut app, &TransferForm::new(RECIPIENT, "Rahim Uddin", "24700"))
        .unwrap_err();
    assert!(matches!(err, FinTrackError::Rejected(_)));
    assert_eq!(err.to_string(), "Rejected: Insufficient balance to complete this transfer");
    assert_eq!(app.store().current_hash().unwrap(), hash);
}

#[test]
fn test_out_of_range_amount_is_a_field_error() {
    let mut app = logged_in(config());
    let hash = app.store().current_hash().unwrap();
    let mut workflow = TransferWorkflow::new();

    let err = workflow
        .continue_to_review(
            &mut app,
            &TransferForm::new(RECIPIENT, "Rahim Uddin", "79228162514264337593543950335"),
        )
        .unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors.get("amount"), Some("Transfer amount is out of range"));
    assert_eq!(workflow.state(), &TransferState::Form);
    assert_eq!(app.store().current_hash().unwrap(), hash);
}

#[test]
fn test_exponent_amount_is_priced() {
    let mut app = logged_in(config());
    let mut workflow = TransferWorkflow::new();

    let quote = workflow
        .continue_to_review(&mut app, &TransferForm::new(RECIPIENT, "Rahim Uddin", "1e3"))
        .unwrap();
    assert_eq!(quote.principal, d(1000));
    assert_eq!(quote.total, d(1015));
}

#[test]
fn test_refused_settlement_returns_to_review() {
    let mut app = logged_in(config());
    let half = Decimal::from_str("39614081257132168796771975168").unwrap();
    let mut workflow = submit(&mut app, &format!("-{}", half));
    workflow.confirm(&mut app).unwrap();

    // Credit lands first, so the pending settlement no longer fits
    app.dispatch(LedgerCommand::Debit { amount: -half }).unwrap();
    let completions = app.run_until_idle();
    assert!(matches!(
        completions.as_slice(),
        [Completion::Refused { label, .. }] if label.starts_with("transfer_settle ")
    ));
    for completion in &completions {
        assert!(workflow.on_completion(completion));
    }

    assert!(matches!(workflow.state(), TransferState::Review(_)));
    assert_eq!(app.read().balance(), d(25_000) + half);
    assert_eq!(app.read().transactions.len(), 50);
}

#[test]
fn test_transfer_requires_session() {
    let mut app = FinTrack::new(config(), Box::new(MemoryStorage::new()));
    let mut workflow = TransferWorkflow::new();

    let err = workflow
        .continue_to_review(&mut app, &TransferForm::new(RECIPIENT, "Rahim Uddin", "100"))
        .unwrap_err();
    assert!(matches!(err, FinTrackError::Session(SessionError::NotLoggedIn)));
}

#[test]
fn test_state_transitions() {
    let mut app = logged_in(config());
    let mut workflow = TransferWorkflow::new();

    assert!(matches!(
        workflow.confirm(&mut app),
        Err(FinTrackError::Workflow(WorkflowError::InvalidTransition { state: "form", .. }))
    ));

    workflow
        .continue_to_review(&mut app, &TransferForm::new(RECIPIENT, "Rahim Uddin", "10"))
        .unwrap();
    workflow.back_to_form().unwrap();
    assert_eq!(workflow.state(), &TransferState::Form);
    assert!(workflow.reset().is_err());

    let mut workflow = submit(&mut app, "10");
    workflow.confirm(&mut app).unwrap();
    settle(&mut app, &mut workflow);
    workflow.reset().unwrap();
    assert_eq!(workflow.state(), &TransferState::Form);
}

#[test]
fn test_foreign_completion_is_ignored() {
    let mut app = logged_in(config());
    let mut workflow = submit(&mut app, "10");
    workflow.confirm(&mut app).unwrap();

    assert!(!workflow.on_completion(&Completion::TransferSettled {
        reference: "TXN-OTHER".to_string(),
        transaction_id: "tx-OTHER".to_string(),
    }));
    assert!(!workflow.on_completion(&Completion::ProfileSaved));
    assert!(matches!(workflow.state(), TransferState::Confirming { .. }));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Standard transfers debit principal plus floored fee and log that total once
    #[test]
    fn property_standard_transfer_debits_total(principal in 1i64..24_000, seed in any::<u64>()) {
        let mut app = logged_in(config().with_random_seed(seed));
        let before = app.read().clone();

        let mut workflow = submit(&mut app, &principal.to_string());
        workflow.confirm(&mut app).unwrap();
        settle(&mut app, &mut workflow);

        let fee = (d(principal) * rust_decimal::Decimal::new(15, 3)).floor();
        let after = app.read();
        prop_assert_eq!(after.balance(), before.balance() - (d(principal) + fee));
        prop_assert_eq!(after.transactions.len(), before.transactions.len() + 1);
        prop_assert_eq!(after.transactions[0].amount, d(principal) + fee);
        prop_assert_eq!(after.transactions[0].running_balance, after.balance());
    }

    /// Large transfers under legacy parity only lose the fee
    #[test]
    fn property_large_transfer_debits_fee_only(principal in 50_000i64..200_000) {
        let mut app = logged_in(config());
        top_up(&mut app, 500_000);
        let before = app.read().balance();

        let mut workflow = submit(&mut app, &principal.to_string());
        workflow.confirm(&mut app).unwrap();
        settle(&mut app, &mut workflow);

        let fee = (d(principal) * rust_decimal::Decimal::new(15, 3)).floor();
        prop_assert_eq!(app.read().balance(), before - fee);
    }
}
