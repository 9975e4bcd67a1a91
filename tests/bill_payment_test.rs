//! Bill payment workflow against the shared ledger

mod common;

use chrono::{Duration, NaiveDate};
use common::{config, d, logged_in};
use fintrack::{
    Behavior, BillPaymentForm, BillPaymentWorkflow, BillState, BillStatus, Biller, Completion,
    DefectModes, FinTrack, FinTrackError, LedgerCommand, WorkflowError,
};
use rust_decimal::Decimal;
use std::str::FromStr;

fn form(biller: Biller, amount: &str, date: NaiveDate) -> BillPaymentForm {
    BillPaymentForm {
        biller,
        consumer_number: "EL-77821".to_string(),
        amount: amount.to_string(),
        date,
    }
}

fn pay(app: &mut FinTrack, form: &BillPaymentForm) -> BillPaymentWorkflow {
    let mut workflow = BillPaymentWorkflow::new();
    workflow.pay(app, form).unwrap();
    for completion in app.run_until_idle() {
        workflow.on_completion(&completion);
    }
    workflow
}

#[test]
fn test_payment_dated_today_is_paid_and_debited() {
    let mut app = logged_in(config());
    let today = app.today();
    let workflow = pay(&mut app, &form(Biller::Electricity, "450", today));

    let ledger = app.read();
    assert_eq!(ledger.balance(), d(24_550));
    assert_eq!(ledger.bill_payments.len(), 5);
    assert_eq!(ledger.transactions.len(), 51);

    let payment = &ledger.bill_payments[0];
    assert_eq!(payment.status, BillStatus::Paid);
    assert_eq!(payment.amount, d(450));
    assert!(payment.reference.starts_with("BP-"));
    assert!(payment.id.starts_with("bp-"));

    let tx = &ledger.transactions[0];
    assert_eq!(tx.description, "Electricity Bill Payment");
    assert_eq!(tx.amount, d(450));
    assert_eq!(tx.running_balance, d(24_550));
    assert_eq!(tx.biller.as_deref(), Some("Electricity"));
    assert_eq!(tx.date, today);

    assert_eq!(workflow.state(), &BillState::Success(payment.clone()));
}

#[test]
fn test_future_payment_stays_scheduled() {
    let mut app = logged_in(config());
    let date = app.today() + Duration::days(30);
    let hash = app.store().current_hash().unwrap();

    let mut workflow = BillPaymentWorkflow::new();
    let submission = workflow
        .pay(&mut app, &form(Biller::Internet, "450", date))
        .unwrap();
    assert_eq!(submission.payment.status, BillStatus::Scheduled);
    assert!(submission.next_run.is_some());

    // Long past the payment date, nothing promotes it
    app.advance(Duration::days(60).num_milliseconds() as u64);
    assert_ne!(app.store().current_hash().unwrap(), hash);

    let ledger = app.read();
    assert_eq!(ledger.balance(), d(25_000));
    assert_eq!(ledger.transactions.len(), 50);
    assert_eq!(ledger.bill_payments[0].status, BillStatus::Scheduled);
    assert_eq!(ledger.bill_payments[0].date, date);
}

#[test]
fn test_past_payment_is_scheduled_not_debited() {
    let mut app = logged_in(config());
    let yesterday = app.today() - Duration::days(1);
    pay(&mut app, &form(Biller::Water, "300", yesterday));

    assert_eq!(app.read().bill_payments[0].status, BillStatus::Scheduled);
    assert_eq!(app.read().balance(), d(25_000));
}

#[test]
fn test_zero_amount_is_paid() {
    let mut app = logged_in(config());
    let today = app.today();
    pay(&mut app, &form(Biller::Gas, "0", today));

    assert_eq!(app.read().balance(), d(25_000));
    assert_eq!(app.read().transactions[0].amount, d(0));
    assert_eq!(app.read().bill_payments[0].status, BillStatus::Paid);
}

#[test]
fn test_record_lands_after_delay() {
    let mut app = logged_in(config());
    let today = app.today();
    let mut workflow = BillPaymentWorkflow::new();
    workflow
        .pay(&mut app, &form(Biller::Electricity, "450", today))
        .unwrap();

    assert!(app.advance(599).is_empty());
    assert_eq!(app.read().bill_payments.len(), 4);

    let completions = app.advance(1);
    assert!(matches!(completions.as_slice(), [Completion::BillPaymentApplied { .. }]));
    assert_eq!(app.read().balance(), d(24_550));
}

#[test]
fn test_pay_while_processing_is_refused() {
    let mut app = logged_in(config());
    let today = app.today();
    let input = form(Biller::Electricity, "10", today);
    let mut workflow = BillPaymentWorkflow::new();
    workflow.pay(&mut app, &input).unwrap();

    let err = workflow.pay(&mut app, &input).unwrap_err();
    assert!(matches!(
        err,
        FinTrackError::Workflow(WorkflowError::InvalidTransition { state: "processing", .. })
    ));
}

#[test]
fn test_invalid_input_is_reported_inline() {
    let mut app = logged_in(config());
    let today = app.today();
    let mut input = form(Biller::Electricity, "", today);
    input.consumer_number.clear();

    let err = BillPaymentWorkflow::new().pay(&mut app, &input).unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors.get("consumer"), Some("Consumer number is required"));
    assert_eq!(errors.get("amount"), Some("Please enter a valid amount"));
    assert!(app.events().is_idle());
}

#[test]
fn test_out_of_range_amount_today_is_refused_up_front() {
    let mut app = logged_in(config());
    let today = app.today();
    let hash = app.store().current_hash().unwrap();
    let mut workflow = BillPaymentWorkflow::new();

    let err = workflow
        .pay(&mut app, &form(Biller::Gas, "-79228162514264337593543950335", today))
        .unwrap_err();
    let errors = err.field_errors().unwrap();
    assert_eq!(errors.get("amount"), Some("Bill amount is out of range"));
    assert!(app.events().is_idle());
    assert_eq!(workflow.state(), &BillState::Form);
    assert_eq!(app.store().current_hash().unwrap(), hash);
}

#[test]
fn test_refused_batch_leaves_no_partial_payment() {
    let mut app = logged_in(config());
    let today = app.today();
    let mut workflow = BillPaymentWorkflow::new();
    workflow
        .pay(&mut app, &form(Biller::Water, "-50000000000000000000000000000", today))
        .unwrap();

    // Another credit lands before the batch does
    let credit = Decimal::from_str("-50000000000000000000000000000").unwrap();
    app.dispatch(LedgerCommand::Debit { amount: credit }).unwrap();
    let completions = app.run_until_idle();
    assert!(matches!(completions.as_slice(), [Completion::Refused { .. }]));
    assert!(workflow.on_completion(&completions[0]));

    let ledger = app.read();
    assert_eq!(ledger.bill_payments.len(), 4);
    assert_eq!(ledger.transactions.len(), 50);
    assert_eq!(workflow.state(), &BillState::Form);
}

#[test]
fn test_default_config_assigns_fresh_ids() {
    let mut app = logged_in(config());
    let today = app.today();
    pay(&mut app, &form(Biller::Electricity, "10", today));
    pay(&mut app, &form(Biller::Water, "20", today));

    let ledger = app.read();
    assert_ne!(ledger.bill_payments[0].id, ledger.bill_payments[1].id);
}

#[test]
fn test_legacy_id_cache_reuses_until_cleared() {
    let mut defects = DefectModes::default();
    defects.bill_id_reuse = Behavior::LegacyParity;
    let mut app = logged_in(config().with_defects(defects));
    let today = app.today();

    pay(&mut app, &form(Biller::Electricity, "10", today));
    pay(&mut app, &form(Biller::Water, "20", today));
    let shared = app.read().bill_payments[0].id.clone();
    assert_eq!(app.read().bill_payments_with_id(&shared).len(), 2);
    // Both payments still debit
    assert_eq!(app.read().balance(), d(24_970));

    app.bill_ids_mut().clear();
    pay(&mut app, &form(Biller::Gas, "30", today));
    assert_ne!(app.read().bill_payments[0].id, shared);
}
