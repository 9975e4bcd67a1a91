//! Configuration: constants, delays, and the per-defect behavior switches
//!
//! The application is a QA fixture whose documented defects are part of its
//! contract. Each defect can be reproduced exactly ([`Behavior::LegacyParity`])
//! or corrected ([`Behavior::Fixed`]), independently of the others.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SerializationError;

/// Expected schema version of persisted snapshots
pub const SCHEMA_VERSION: &str = "v3";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    LegacyParity,
    Fixed,
}

impl Behavior {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Behavior::Fixed)
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Behavior::LegacyParity)
    }
}

/// One switch per documented defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefectModes {
    /// Transfers at or above the threshold debit only the fee
    pub large_transfer_principal: Behavior,
    /// Negative transfer amounts pass validation
    pub negative_transfer_amount: Behavior,
    /// Transfers to the sender's own account number pass validation
    pub self_transfer: Behavior,
    /// The last bill payment id is reused until the cache is cleared
    pub bill_id_reuse: Behavior,
    /// New password confirmation is never compared
    pub password_confirmation: Behavior,
    /// Saving notification preferences writes nothing
    pub notification_preferences: Behavior,
    /// Biller filter drops the date range when both are active
    pub combined_query_filters: Behavior,
    /// Statement export drops the final row of the page
    pub statement_last_row: Behavior,
    /// Dashboard shows 10500 for a balance of exactly 10000
    pub display_balance: Behavior,
}

impl DefectModes {
    /// Every defect reproduced, including id reuse
    pub fn legacy() -> Self {
        Self {
            large_transfer_principal: Behavior::LegacyParity,
            negative_transfer_amount: Behavior::LegacyParity,
            self_transfer: Behavior::LegacyParity,
            bill_id_reuse: Behavior::LegacyParity,
            password_confirmation: Behavior::LegacyParity,
            notification_preferences: Behavior::LegacyParity,
            combined_query_filters: Behavior::LegacyParity,
            statement_last_row: Behavior::LegacyParity,
            display_balance: Behavior::LegacyParity,
        }
    }

    /// Every defect corrected
    pub fn fixed() -> Self {
        Self {
            large_transfer_principal: Behavior::Fixed,
            negative_transfer_amount: Behavior::Fixed,
            self_transfer: Behavior::Fixed,
            bill_id_reuse: Behavior::Fixed,
            password_confirmation: Behavior::Fixed,
            notification_preferences: Behavior::Fixed,
            combined_query_filters: Behavior::Fixed,
            statement_last_row: Behavior::Fixed,
            display_balance: Behavior::Fixed,
        }
    }
}

impl Default for DefectModes {
    /// Legacy parity, except that bill payments always get fresh ids
    fn default() -> Self {
        Self {
            bill_id_reuse: Behavior::Fixed,
            ..Self::legacy()
        }
    }
}

/// Simulated I/O delays in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayTable {
    pub transfer_settle_ms: u64,
    /// Upper bound (exclusive) of the random extra settle delay
    pub transfer_jitter_ms: u64,
    /// Gap between the transfer debit and its log entry
    pub transfer_record_ms: u64,
    pub bill_payment_ms: u64,
    pub profile_save_ms: u64,
    pub password_change_ms: u64,
    pub notification_save_ms: u64,
    pub login_min_ms: u64,
    pub login_max_ms: u64,
}

impl Default for DelayTable {
    fn default() -> Self {
        Self {
            transfer_settle_ms: 3000,
            transfer_jitter_ms: 1000,
            transfer_record_ms: 300,
            bill_payment_ms: 600,
            profile_save_ms: 400,
            password_change_ms: 500,
            notification_save_ms: 300,
            login_min_ms: 400,
            login_max_ms: 900,
        }
    }
}

/// On-disk encoding of the ledger snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapshotFormat {
    Json,
    Bincode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinTrackConfig {
    pub schema_version: String,
    pub fee_rate: Decimal,
    pub large_transfer_threshold: Decimal,
    pub page_size: usize,
    pub random_seed: u64,
    /// Virtual clock start; `None` starts from the wall clock
    pub start_time: Option<DateTime<Utc>>,
    pub snapshot_format: SnapshotFormat,
    pub delays: DelayTable,
    pub defects: DefectModes,
}

impl Default for FinTrackConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            fee_rate: Decimal::new(15, 3),
            large_transfer_threshold: Decimal::from(50_000),
            page_size: 10,
            random_seed: 0,
            start_time: None,
            snapshot_format: SnapshotFormat::Json,
            delays: DelayTable::default(),
            defects: DefectModes::default(),
        }
    }
}

impl FinTrackConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SerializationError> {
        serde_json::from_str(json).map_err(|e| SerializationError::DeserializationFailed {
            reason: format!("Invalid configuration: {}", e),
        })
    }

    pub fn with_start_time(mut self, time: DateTime<Utc>) -> Self {
        self.start_time = Some(time);
        self
    }

    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_defects(mut self, defects: DefectModes) -> Self {
        self.defects = defects;
        self
    }

    pub fn with_snapshot_format(mut self, format: SnapshotFormat) -> Self {
        self.snapshot_format = format;
        self
    }

    pub fn with_delays(mut self, delays: DelayTable) -> Self {
        self.delays = delays;
        self
    }
}
