//! Ledger Walkthrough
//!
//! Drives one session end to end over in-memory storage:
//! - Log in with the demo credentials
//! - Send a transfer and pay a bill on the virtual clock
//! - Filter the transaction log and export a statement
//! - Reload from the committed snapshot and reconcile the new entries
//!
//! Run with `RUST_LOG=debug` to see every dispatched ledger command.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fintrack::seed::{SEED_EMAIL, SEED_PASSWORD};
use fintrack::session;
use fintrack::statement::{export, render_text};
use fintrack::transfer::TransferWorkflow;
use fintrack::{
    reconcile, BillPaymentForm, BillPaymentWorkflow, Biller, DashboardCache, DateRange, FinTrack,
    FinTrackConfig, LedgerComparator, LoginForm, MemoryStorage, TransactionPage, TransactionQuery,
    TransferForm, TypeFilter,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fintrack=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== FinTrack Ledger Walkthrough ===\n");

    let storage = MemoryStorage::new();
    let config = FinTrackConfig::default().with_random_seed(7);
    let mut app = FinTrack::new(config.clone(), Box::new(storage.clone()));
    let marker = session::login(&mut app, &mut LoginForm::new(SEED_EMAIL, SEED_PASSWORD))?;
    println!("Logged in as {} <{}>", marker.name, marker.email);

    let mut dashboard = DashboardCache::new();
    let summary = dashboard.view(&app)?;
    println!("  Account:  {} ({})", summary.masked_account, summary.account_type);
    println!("  Balance:  BDT {:.2}\n", summary.display_balance);

    let before = app.read().clone();

    // Transfer
    let mut transfer = TransferWorkflow::new();
    let quote = transfer.continue_to_review(
        &mut app,
        &TransferForm::new("9876543210984321", "Rahim Uddin", "2500"),
    )?;
    println!("Transfer review: {}", quote.description());
    println!("  Principal: BDT {:.2}", quote.principal);
    println!("  Fee:       BDT {:.2}", quote.fee);
    println!("  Total:     BDT {:.2}", quote.total);
    let reference = transfer.confirm(&mut app)?;
    for completion in app.run_until_idle() {
        transfer.on_completion(&completion);
    }
    println!("  Settled as {} ({})\n", reference, transfer.state().name());

    // Bill payment
    let mut bill = BillPaymentWorkflow::new();
    let mut form = BillPaymentForm::new(app.today());
    form.biller = Biller::Electricity;
    form.consumer_number = "EL-77821".to_string();
    form.amount = "1450".to_string();
    let submission = bill.pay(&mut app, &form)?;
    for completion in app.run_until_idle() {
        bill.on_completion(&completion);
    }
    println!(
        "Bill payment {} for {}: {}",
        submission.payment.reference, submission.payment.biller, submission.payment.status
    );
    println!("  Balance now BDT {:.2}\n", app.read().balance());

    // Query and statement
    let query = TransactionQuery::new()
        .with_kind(TypeFilter::Debit)
        .with_date_range(DateRange::Last30Days);
    let results = fintrack::query::query(
        &app.read().transactions,
        &query,
        app.now(),
        app.config().defects.combined_query_filters,
    );
    let page = TransactionPage::new(&results, 1, app.config().page_size);
    println!(
        "Debits in the last 30 days: {} across {} page(s)\n",
        page.total_items, page.total_pages
    );
    let statement = export(&page.items, app.config().defects.statement_last_row);
    println!("{}", render_text(&statement));

    // Reload and check
    let reloaded = FinTrack::new(config, Box::new(storage));
    println!("Reloaded from {:?}", reloaded.store().load_source());

    let diff = LedgerComparator::new().compare(&before, reloaded.read());
    println!("  Balance delta:  BDT {:.2}", diff.balance_delta());
    println!("  Logged delta:   BDT {:.2}", diff.logged_delta);
    println!("  Unlogged delta: BDT {:.2}", diff.unlogged_delta());

    let mut tail = reloaded.read().clone();
    tail.transactions.truncate(diff.new_transactions.len());
    let report = reconcile(&tail);
    println!("  New entries chain: {}", report.balanced);

    Ok(())
}
