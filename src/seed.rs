//! Seed data for a fresh ledger

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::types::{
    BillPayment, BillStatus, Ledger, NotificationFlags, Transaction, TransactionKind, UserProfile,
};

use crate::types::TransactionKind::{Credit as C, Debit as D};

type SeedRow = (
    &'static str,
    (i32, u32, u32),
    &'static str,
    TransactionKind,
    i64,
    i64,
    Option<&'static str>,
);

// Newest first. Running balances are fixture values and do not chain.
const SEED_TRANSACTIONS: &[SeedRow] = &[
    ("tx1", (2026, 2, 20), "Salary Credit", C, 15000, 25000, None),
    ("tx2", (2026, 2, 18), "Electricity Bill", D, 1200, 10000, Some("Electricity")),
    ("tx3", (2026, 2, 17), "Fund Transfer to 9876", D, 500, 8800, None),
    ("tx4", (2026, 2, 15), "Mobile Recharge", D, 200, 8600, Some("Mobile Recharge")),
    ("tx5", (2026, 2, 13), "Internet Bill", D, 800, 7800, Some("Internet")),
    ("tx6", (2026, 2, 12), "Water Bill", D, 350, 7450, Some("Water")),
    ("tx7", (2026, 2, 10), "Fund Transfer to 1234", D, 1000, 6450, None),
    ("tx8", (2026, 2, 8), "Gas Bill", D, 450, 6000, Some("Gas")),
    ("tx9", (2026, 2, 6), "Transfer Received", C, 2000, 8000, None),
    ("tx10", (2026, 2, 4), "Electricity Bill", D, 1100, 6900, Some("Electricity")),
    ("tx11", (2026, 2, 2), "Mobile Recharge", D, 200, 6700, Some("Mobile Recharge")),
    ("tx12", (2026, 1, 31), "January Salary", C, 15000, 21700, None),
    ("tx13", (2026, 1, 28), "Internet Bill", D, 800, 20900, Some("Internet")),
    ("tx14", (2026, 1, 25), "Large Transfer out", D, 10000, 10900, None),
    ("tx15", (2026, 1, 22), "Deposit", C, 5000, 15900, None),
    ("tx16", (2026, 1, 20), "Water Bill", D, 350, 15550, Some("Water")),
    ("tx17", (2026, 1, 18), "Gas Bill", D, 450, 15100, Some("Gas")),
    ("tx18", (2026, 1, 16), "Electricity Bill", D, 1200, 13900, Some("Electricity")),
    ("tx19", (2026, 1, 14), "Bonus Credit", C, 3000, 16900, None),
    ("tx20", (2026, 1, 10), "Fund Transfer to 5555", D, 2000, 14900, None),
    ("tx21", (2025, 12, 30), "December Salary", C, 15000, 29900, None),
    ("tx22", (2025, 12, 28), "Year-End Bonus", C, 5000, 34900, None),
    ("tx23", (2025, 8, 15), "August Salary", C, 15000, 30000, None),
    ("tx24", (2025, 8, 10), "Electricity Bill", D, 1300, 28700, Some("Electricity")),
    ("tx25", (2025, 7, 20), "July Salary", C, 15000, 27000, None),
    ("tx26", (2025, 7, 5), "Internet Bill", D, 800, 26200, Some("Internet")),
    ("tx27", (2025, 6, 18), "Fund Transfer to 7788", D, 3000, 20000, None),
    ("tx28", (2025, 5, 30), "May Salary", C, 15000, 25000, None),
    ("tx29", (2025, 4, 22), "Gas Bill", D, 500, 18000, Some("Gas")),
    ("tx30", (2025, 4, 10), "April Salary", C, 15000, 20000, None),
    ("tx31", (2026, 2, 10), "Mobile Recharge", D, 150, 24850, Some("Mobile Recharge")),
    ("tx32", (2026, 2, 5), "Gas Bill", D, 420, 24430, Some("Gas")),
    ("tx33", (2026, 1, 28), "Freelance Income", C, 8000, 22430, None),
    ("tx34", (2026, 1, 22), "Water Bill", D, 380, 22050, Some("Water")),
    ("tx35", (2026, 1, 15), "Mobile Recharge", D, 200, 21850, Some("Mobile Recharge")),
    ("tx36", (2026, 1, 5), "Internet Bill", D, 800, 21050, Some("Internet")),
    ("tx37", (2025, 12, 20), "Gas Bill", D, 430, 20620, Some("Gas")),
    ("tx38", (2025, 12, 15), "Fund Transfer to 3344", D, 5000, 15620, None),
    ("tx39", (2025, 12, 5), "Water Bill", D, 360, 15260, Some("Water")),
    ("tx40", (2025, 11, 30), "November Salary", C, 15000, 30260, None),
    ("tx41", (2025, 11, 20), "Electricity Bill", D, 1150, 29110, Some("Electricity")),
    ("tx42", (2025, 11, 12), "Mobile Recharge", D, 200, 28910, Some("Mobile Recharge")),
    ("tx43", (2025, 11, 5), "Internet Bill", D, 800, 28110, Some("Internet")),
    ("tx44", (2025, 9, 28), "September Salary", C, 15000, 32000, None),
    ("tx45", (2025, 9, 15), "Electricity Bill", D, 1250, 30750, Some("Electricity")),
    ("tx46", (2025, 9, 8), "Fund Transfer to 6622", D, 2500, 28250, None),
    ("tx47", (2025, 8, 25), "Water Bill", D, 340, 27910, Some("Water")),
    ("tx48", (2025, 5, 15), "Electricity Bill", D, 1100, 16500, Some("Electricity")),
    ("tx49", (2025, 3, 28), "March Salary", C, 15000, 22000, None),
    ("tx50", (2025, 3, 10), "Internet Bill", D, 800, 21200, Some("Internet")),
];

const SEED_BILL_PAYMENTS: &[(&str, &str, &str, i64, (i32, u32, u32), BillStatus, &str)] = &[
    ("bp1", "Electricity", "EL-001", 1200, (2026, 2, 18), BillStatus::Paid, "REF-BP-001"),
    ("bp2", "Internet", "IN-002", 800, (2026, 2, 13), BillStatus::Paid, "REF-BP-002"),
    ("bp3", "Water", "WA-003", 350, (2026, 2, 12), BillStatus::Paid, "REF-BP-003"),
    ("bp4", "Gas", "GA-004", 450, (2026, 3, 15), BillStatus::Scheduled, "REF-BP-004"),
];

pub const SEED_BALANCE: i64 = 25_000;
pub const SEED_EMAIL: &str = "user@fintrack.com";
pub const SEED_PASSWORD: &str = "SecurePass2026!";
pub const SEED_ACCOUNT_NUMBER: &str = "1234567890123456";

fn day((year, month, day): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("seed dates are valid calendar days")
}

pub fn seed_profile() -> UserProfile {
    UserProfile {
        name: "Abu Hena".to_string(),
        email: SEED_EMAIL.to_string(),
        password: SEED_PASSWORD.to_string(),
        phone: "01700000000".to_string(),
        address: "123 Main Street, Dhaka".to_string(),
        account_number: SEED_ACCOUNT_NUMBER.to_string(),
        account_type: "Savings".to_string(),
        balance: Decimal::from(SEED_BALANCE),
        notifications: NotificationFlags {
            email: true,
            sms: false,
        },
    }
}

pub fn seed_transactions() -> Vec<Transaction> {
    SEED_TRANSACTIONS
        .iter()
        .map(|&(id, date, description, kind, amount, running, biller)| Transaction {
            id: id.to_string(),
            date: day(date),
            description: description.to_string(),
            kind,
            amount: Decimal::from(amount),
            running_balance: Decimal::from(running),
            biller: biller.map(str::to_string),
        })
        .collect()
}

pub fn seed_bill_payments() -> Vec<BillPayment> {
    SEED_BILL_PAYMENTS
        .iter()
        .map(|&(id, biller, consumer, amount, date, status, reference)| BillPayment {
            id: id.to_string(),
            biller: biller.to_string(),
            consumer_number: consumer.to_string(),
            amount: Decimal::from(amount),
            date: day(date),
            status,
            reference: reference.to_string(),
        })
        .collect()
}

/// The ledger every session starts from when no usable snapshot exists
pub fn seed_ledger() -> Ledger {
    Ledger {
        user: seed_profile(),
        transactions: seed_transactions(),
        bill_payments: seed_bill_payments(),
        is_logged_in: false,
    }
}
