//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use fintrack::seed::{SEED_EMAIL, SEED_PASSWORD};
use fintrack::session::{self, LoginForm};
use fintrack::{FinTrack, FinTrackConfig, LedgerCommand, MemoryStorage};

pub const RECIPIENT: &str = "9876543210984321";

/// Every test starts on 2026-02-21 at 09:00 UTC
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 21, 9, 0, 0).unwrap()
}

pub fn config() -> FinTrackConfig {
    FinTrackConfig::default()
        .with_start_time(start_time())
        .with_random_seed(42)
}

pub fn d(value: i64) -> Decimal {
    Decimal::from(value)
}

pub fn logged_in(config: FinTrackConfig) -> FinTrack {
    logged_in_over(config, MemoryStorage::new())
}

pub fn logged_in_over(config: FinTrackConfig, storage: MemoryStorage) -> FinTrack {
    let mut app = FinTrack::new(config, Box::new(storage));
    session::login(&mut app, &mut LoginForm::new(SEED_EMAIL, SEED_PASSWORD)).unwrap();
    app
}

/// Raise the balance by `amount`. Debits carry no sign check.
pub fn top_up(app: &mut FinTrack, amount: i64) {
    app.dispatch(LedgerCommand::Debit { amount: d(-amount) }).unwrap();
}
