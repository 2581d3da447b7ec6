use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::error::{MonetizerError, Result};
use crate::monetizer::MonetizedRecord;

pub fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Date window + filter
// ---------------------------------------------------------------------------

/// Inclusive window from `start` 00:00:00 to `end` 23:59:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateWindow {
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(MonetizerError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        Ok(Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(last_second),
        })
    }

    /// Smallest whole-day window covering every record.
    pub fn covering(records: &[MonetizedRecord]) -> Option<Self> {
        let min = records.iter().map(|r| r.date).min()?;
        let max = records.iter().map(|r| r.date).max()?;
        Self::from_dates(min.date(), max.date()).ok()
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }

    /// The window of the same length ending one second before this one.
    /// Clamped to the earliest representable instant.
    pub fn previous(&self) -> Self {
        let shift = |d: Duration| self.start.checked_sub_signed(d).unwrap_or(NaiveDateTime::MIN);
        Self {
            start: shift(Duration::days(self.days())),
            end: shift(Duration::seconds(1)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub window: DateWindow,
    /// Raw category labels to keep; `None` keeps every category.
    pub categories: Option<BTreeSet<String>>,
}

impl Filter {
    pub fn new(window: DateWindow, categories: Option<BTreeSet<String>>) -> Self {
        Self { window, categories }
    }

    fn matches_category(&self, category: &str) -> bool {
        self.categories
            .as_ref()
            .map_or(true, |set| set.contains(category))
    }

    pub fn matches(&self, record: &MonetizedRecord) -> bool {
        self.window.contains(record.date) && self.matches_category(&record.category)
    }

    pub fn previous(&self) -> Self {
        Self {
            window: self.window.previous(),
            categories: self.categories.clone(),
        }
    }
}

pub fn filter_records<'r>(records: &'r [MonetizedRecord], filter: &Filter) -> Vec<&'r MonetizedRecord> {
    records.iter().filter(|r| filter.matches(r)).collect()
}

// ---------------------------------------------------------------------------
// Group by category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub category: String,
    pub canonical: Option<String>,
    pub quantity_sum: f64,
    pub value_sum: f64,
    pub record_count: usize,
    pub value_pct: f64,
    pub quantity_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTable {
    pub rows: Vec<AggregateRow>,
    pub total_value: f64,
    pub total_quantity: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Aggregation {
    /// Nothing matched the filter.
    Empty,
    Table(CategoryTable),
}

pub fn aggregate(records: &[&MonetizedRecord]) -> Aggregation {
    if records.is_empty() {
        return Aggregation::Empty;
    }

    let mut groups: BTreeMap<&str, AggregateRow> = BTreeMap::new();
    for r in records {
        let row = groups.entry(r.category.as_str()).or_insert_with(|| AggregateRow {
            category: r.category.clone(),
            canonical: r.resolution.canonical().map(str::to_string),
            quantity_sum: 0.0,
            value_sum: 0.0,
            record_count: 0,
            value_pct: 0.0,
            quantity_pct: 0.0,
        });
        row.quantity_sum += r.quantity;
        row.value_sum += r.value;
        row.record_count += 1;
    }

    let mut rows: Vec<AggregateRow> = groups.into_values().collect();
    let total_value: f64 = rows.iter().map(|r| r.value_sum).sum();
    let total_quantity: f64 = rows.iter().map(|r| r.quantity_sum).sum();
    for row in &mut rows {
        row.value_pct = if total_value != 0.0 {
            round2(row.value_sum / total_value * 100.0)
        } else {
            0.0
        };
        row.quantity_pct = if total_quantity != 0.0 {
            round2(row.quantity_sum / total_quantity * 100.0)
        } else {
            0.0
        };
    }
    // BTreeMap order makes ties come out by category name.
    rows.sort_by(|a, b| b.value_sum.total_cmp(&a.value_sum));

    Aggregation::Table(CategoryTable {
        rows,
        total_value,
        total_quantity,
        record_count: records.len(),
    })
}

// ---------------------------------------------------------------------------
// Period comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PeriodComparison {
    /// Both the current and the previous window total zero.
    NoData { previous_window: DateWindow },
    Delta {
        previous_window: DateWindow,
        current_total: f64,
        previous_total: f64,
        delta: f64,
        /// `None` when the previous window totals zero.
        pct_change: Option<f64>,
    },
}

pub fn compare_periods(records: &[MonetizedRecord], filter: &Filter) -> PeriodComparison {
    let previous = filter.previous();
    let total = |f: &Filter| -> f64 { records.iter().filter(|r| f.matches(r)).map(|r| r.value).sum() };
    let current_total = total(filter);
    let previous_total = total(&previous);

    if current_total == 0.0 && previous_total == 0.0 {
        return PeriodComparison::NoData {
            previous_window: previous.window,
        };
    }
    let delta = current_total - previous_total;
    PeriodComparison::Delta {
        previous_window: previous.window,
        current_total,
        previous_total,
        delta,
        pct_change: (previous_total != 0.0).then(|| delta / previous_total * 100.0),
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything the reporting side needs for one filter selection.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub window: DateWindow,
    pub categories: Option<Vec<String>>,
    pub aggregation: Aggregation,
    pub comparison: PeriodComparison,
    pub records: Vec<MonetizedRecord>,
}

pub fn build_report(records: &[MonetizedRecord], filter: &Filter) -> Report {
    let current = filter_records(records, filter);
    let aggregation = aggregate(&current);
    let comparison = compare_periods(records, filter);
    Report {
        window: filter.window,
        categories: filter.categories.as_ref().map(|c| c.iter().cloned().collect()),
        aggregation,
        comparison,
        records: current.into_iter().cloned().collect(),
    }
}
