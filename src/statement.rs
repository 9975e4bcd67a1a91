//! Statement export of the current history page

use serde::{Deserialize, Serialize};

use crate::config::Behavior;
use crate::types::{Transaction, TransactionKind};

pub const STATEMENT_TITLE: &str = "FinTrack Transaction Statement";
pub const STATEMENT_HEADER: [&str; 3] = ["Date", "Description", "Amount (BDT)"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: String,
    pub description: String,
    /// Signed, two decimals: `+1500.00`, `-450.00`
    pub amount: String,
}

impl StatementRow {
    pub fn from_transaction(tx: &Transaction) -> Self {
        let sign = match tx.kind {
            TransactionKind::Credit => "+",
            TransactionKind::Debit => "-",
        };
        Self {
            date: tx.date.format("%Y-%m-%d").to_string(),
            description: tx.description.clone(),
            amount: format!("{}{:.2}", sign, tx.amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub title: String,
    pub rows: Vec<StatementRow>,
}

/// Rows for one page of history. Under legacy parity the page's final row is
/// left out.
pub fn export(page: &[Transaction], last_row: Behavior) -> Statement {
    let kept = if last_row.is_legacy() {
        &page[..page.len().saturating_sub(1)]
    } else {
        page
    };
    Statement {
        title: STATEMENT_TITLE.to_string(),
        rows: kept.iter().map(StatementRow::from_transaction).collect(),
    }
}

/// Plain-text rendering: title, header, one line per row
pub fn render_text(statement: &Statement) -> String {
    let mut lines = Vec::with_capacity(statement.rows.len() + 2);
    lines.push(statement.title.clone());
    lines.push(STATEMENT_HEADER.join(" | "));
    for row in &statement.rows {
        lines.push(format!("{} | {} | {}", row.date, row.description, row.amount));
    }
    lines.join("\n")
}
