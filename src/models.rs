use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Quantity cell exactly as it came out of the source, before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawQuantity {
    Missing,
    Number(f64),
    Text(String),
}

impl RawQuantity {
    /// Numeric value of the cell, `None` when missing or unparseable.
    pub fn parse(&self) -> Option<f64> {
        match self {
            Self::Missing => None,
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => parse_quantity(s),
        }
    }
}

/// Parse a free-text quantity. Accepts `.` or `,` as decimal separator;
/// when both are present the rightmost one is the decimal separator.
pub fn parse_quantity(raw: &str) -> Option<f64> {
    let s = raw.trim().trim_start_matches("R$").trim().replace(' ', "");
    if s.is_empty() {
        return None;
    }
    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s,
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// One input row after date normalization. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeizureRecord {
    pub date: NaiveDateTime,
    pub category: String,
    pub quantity: RawQuantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuantitySource {
    Column(String),
    /// The dataset has no quantity column; every record counts as 1.
    Assumed,
}

/// Which header was picked for each role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub date: String,
    pub category: String,
    pub quantity: QuantitySource,
}

/// Records loaded from one source, plus what the loader had to discard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub source: String,
    pub columns: ColumnMap,
    pub records: Vec<SeizureRecord>,
    pub dropped_rows: usize,
}

impl Dataset {
    pub fn date_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    pub category: String,
    pub unit_label: String,
    pub unit_cost: f64,
}
