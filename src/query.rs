//! Transaction history filtering, sorting and pagination
//!
//! Type is filtered first. The date range and the biller filter are each
//! applied to the type-filtered set on their own; under legacy parity, when
//! both are active only the biller result is kept. The final set is sorted by
//! date (stable, so same-day entries keep log order) and sliced into pages.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::bills::Biller;
use crate::config::Behavior;
use crate::types::{Transaction, TransactionKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Credit,
    Debit,
}

impl TypeFilter {
    fn matches(&self, kind: TransactionKind) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Credit => kind == TransactionKind::Credit,
            TypeFilter::Debit => kind == TransactionKind::Debit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    All,
    Last30Days,
    Last60Days,
    Last90Days,
}

impl DateRange {
    pub fn days(&self) -> Option<i64> {
        match self {
            DateRange::All => None,
            DateRange::Last30Days => Some(30),
            DateRange::Last60Days => Some(60),
            DateRange::Last90Days => Some(90),
        }
    }

    /// A transaction is in range when the start of its day is at or after
    /// `now` minus the range.
    pub fn contains(&self, tx: &Transaction, now: DateTime<Utc>) -> bool {
        match self.days() {
            None => true,
            Some(days) => {
                let start_of_day = tx.date.and_hms_opt(0, 0, 0).map(|start| Utc.from_utc_datetime(&start));
                start_of_day >= Some(now - Duration::days(days))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Newest first
    #[default]
    Desc,
    Asc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransactionQuery {
    pub kind: TypeFilter,
    pub biller: Option<Biller>,
    pub date_range: DateRange,
    pub sort: SortDirection,
}

impl TransactionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: TypeFilter) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_biller(mut self, biller: Biller) -> Self {
        self.biller = Some(biller);
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_sort(mut self, sort: SortDirection) -> Self {
        self.sort = sort;
        self
    }
}

/// Filtered, sorted copy of `transactions`. `combined_filters` decides what
/// happens when a date range and a biller are both selected.
pub fn query(
    transactions: &[Transaction],
    q: &TransactionQuery,
    now: DateTime<Utc>,
    combined_filters: Behavior,
) -> Vec<Transaction> {
    let by_type: Vec<&Transaction> = transactions.iter().filter(|tx| q.kind.matches(tx.kind)).collect();

    let in_range = |tx: &&Transaction| q.date_range.contains(tx, now);
    let from_biller = |tx: &&Transaction| match q.biller {
        Some(biller) => tx.biller.as_deref() == Some(biller.as_str()),
        None => true,
    };

    let selected: Vec<&Transaction> = match (q.biller, q.date_range) {
        (Some(_), DateRange::All) => by_type.into_iter().filter(from_biller).collect(),
        (Some(_), _) if combined_filters.is_legacy() => {
            by_type.into_iter().filter(from_biller).collect()
        }
        (Some(_), _) => by_type.into_iter().filter(in_range).filter(from_biller).collect(),
        (None, _) => by_type.into_iter().filter(in_range).collect(),
    };

    let mut result: Vec<Transaction> = selected.into_iter().cloned().collect();
    match q.sort {
        SortDirection::Desc => result.sort_by(|a, b| b.date.cmp(&a.date)),
        SortDirection::Asc => result.sort_by(|a, b| a.date.cmp(&b.date)),
    }
    result
}

/// Number of pages of `page_size` needed for `len` items
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

/// One-based page slice. Pages past the end, and page zero, are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// One page of query results plus the counts a history view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl TransactionPage {
    pub fn new(results: &[Transaction], page: usize, page_size: usize) -> Self {
        Self {
            items: paginate(results, page, page_size).to_vec(),
            page,
            total_pages: page_count(results.len(), page_size),
            total_items: results.len(),
        }
    }
}
