use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{MonetizerError, Result};
use crate::models::{ColumnMap, Dataset, QuantitySource, RawQuantity, SeizureRecord};
use crate::resolver::fold;

const DATE_COLUMNS: &[&str] = &["data", "date"];
const CATEGORY_COLUMNS: &[&str] = &["categoria", "category", "tipo", "produto"];
const QUANTITY_COLUMNS: &[&str] = &["quantidade", "qtde", "qtd", "quantity", "peso"];

/// Sheet hint used when a workbook has several tabs.
pub const DEFAULT_SHEET_HINT: &str = "base_monetizacao";

const DEMO_NAME: &str = "demo_seizures.csv";
const DEMO_CSV: &str = include_str!("../data/demo_seizures.csv");

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Index of the first header matching a candidate, candidates tried in
/// priority order. A header matches when its folded form equals or
/// contains the folded candidate.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    let folded: Vec<String> = headers.iter().map(|h| fold(h)).collect();
    candidates.iter().find_map(|c| {
        let c = fold(c);
        folded.iter().position(|h| *h == c || h.contains(&c))
    })
}

/// Serial of 9999-12-31, the last day a spreadsheet can hold.
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_EXCEL_SERIAL).contains(&serial) {
        return None;
    }
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    let days = serial.trunc() as i64;
    let secs = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    base.checked_add_signed(chrono::Duration::try_days(days)?)?
        .checked_add_signed(chrono::Duration::try_seconds(secs)?)
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Parse a date or datetime written as text. Slash dates are day-first.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    // Fractional seconds ("2025-09-01 10:00:00.000") are dropped.
    let s = s
        .split_once('.')
        .filter(|(_, frac)| frac.chars().all(|c| c.is_ascii_digit()))
        .map_or(s, |(head, _)| head);
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .filter(|dt| (1..=9999).contains(&dt.year()))
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_datetime(raw).map(|dt| dt.date())
}

fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

// ---------------------------------------------------------------------------
// Raw table — the one shape every reader produces
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Records the reader could not parse at all.
    pub skipped_rows: usize,
}

impl RawTable {
    fn cell<'r>(&self, row: &'r [Cell], idx: usize) -> &'r Cell {
        row.get(idx).unwrap_or(&Cell::Empty)
    }

    /// Trimmed text of a cell; numbers are rendered without a trailing `.0`.
    pub fn text(&self, row: &[Cell], idx: usize) -> String {
        match self.cell(row, idx) {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => n.to_string(),
            Cell::DateTime(dt) => dt.to_string(),
        }
    }

    pub fn number(&self, row: &[Cell], idx: usize) -> Option<f64> {
        match self.cell(row, idx) {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn datetime(&self, row: &[Cell], idx: usize) -> Option<NaiveDateTime> {
        match self.cell(row, idx) {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Number(n) => excel_serial_to_datetime(*n),
            Cell::Text(s) => parse_datetime(s),
            Cell::Empty => None,
        }
    }

    pub fn quantity(&self, row: &[Cell], idx: usize) -> RawQuantity {
        match self.cell(row, idx) {
            Cell::Number(n) if n.is_finite() => RawQuantity::Number(*n),
            Cell::Text(s) if !s.trim().is_empty() => RawQuantity::Text(s.trim().to_string()),
            _ => RawQuantity::Missing,
        }
    }
}

fn read_csv(content: &str) -> Result<RawTable> {
    let content = content.trim_start_matches('\u{feff}');
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(sniff_delimiter(content))
        .from_reader(content.as_bytes());
    let headers = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let (rows, skipped_rows) = csv_rows(&mut rdr);
    Ok(RawTable {
        headers,
        rows,
        skipped_rows,
    })
}

/// Data rows as cells, plus how many records failed to parse.
fn csv_rows<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> (Vec<Vec<Cell>>, usize) {
    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "skipping malformed CSV record");
                skipped += 1;
                continue;
            }
        };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|f| {
                    if f.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(f.to_string())
                    }
                })
                .collect(),
        );
    }
    (rows, skipped)
}

/// First sheet whose folded name contains a hint (the default hint first,
/// then `hints`), otherwise the first sheet. `None` for an empty workbook.
#[cfg(any(feature = "xlsx", test))]
fn pick_sheet(names: &[String], hints: &[String]) -> Option<String> {
    let hints: Vec<String> = std::iter::once(DEFAULT_SHEET_HINT)
        .chain(hints.iter().map(String::as_str))
        .map(|h| fold(h).replace(' ', "_"))
        .collect();
    names
        .iter()
        .find(|n| {
            let name = fold(n).replace(' ', "_");
            hints.iter().any(|h| name.contains(h.as_str()))
        })
        .or_else(|| names.first())
        .cloned()
}

#[cfg(feature = "xlsx")]
fn workbook_cell(data: &calamine::Data) -> Cell {
    use calamine::Data;

    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64())
            .map(Cell::DateTime)
            .unwrap_or(Cell::Empty),
        other => Cell::Text(other.to_string()),
    }
}

#[cfg(feature = "xlsx")]
fn read_workbook(file_path: &Path, sheet_hints: &[String]) -> Result<RawTable> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)?;
    let names = workbook.sheet_names().to_vec();
    let sheet = pick_sheet(&names, sheet_hints).ok_or(MonetizerError::EmptyWorkbook)?;
    tracing::info!(%sheet, "reading worksheet");

    let range = workbook.worksheet_range(&sheet)?;
    let mut iter = range.rows();
    let headers = iter
        .next()
        .map(|r| r.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    let rows = iter
        .map(|r| r.iter().map(workbook_cell).collect::<Vec<_>>())
        .filter(|r| r.iter().any(|c| *c != Cell::Empty))
        .collect();
    Ok(RawTable {
        headers,
        rows,
        skipped_rows: 0,
    })
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(file_path: &Path, _sheet_hints: &[String]) -> Result<RawTable> {
    Err(MonetizerError::UnsupportedFormat(format!(
        "{} (built without workbook support)",
        file_path.display()
    )))
}

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    File(PathBuf),
    Embedded { name: String, content: String },
}

impl DataSource {
    pub fn demo() -> Self {
        Self::Embedded {
            name: DEMO_NAME.to_string(),
            content: DEMO_CSV.to_string(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Embedded { name, .. } => format!("embedded:{name}"),
        }
    }

    /// Raw bytes of the source, used for cache keys.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => {
                if !path.exists() {
                    return Err(MonetizerError::SourceNotFound(path.display().to_string()));
                }
                Ok(std::fs::read(path)?)
            }
            Self::Embedded { content, .. } => Ok(content.as_bytes().to_vec()),
        }
    }

    pub fn read_table(&self, sheet_hints: &[String]) -> Result<RawTable> {
        match self {
            Self::Embedded { content, .. } => read_csv(content),
            Self::File(path) => {
                if !path.exists() {
                    return Err(MonetizerError::SourceNotFound(path.display().to_string()));
                }
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.to_ascii_lowercase())
                    .unwrap_or_default();
                match ext.as_str() {
                    "csv" | "txt" => {
                        let bytes = std::fs::read(path)?;
                        read_csv(&String::from_utf8_lossy(&bytes))
                    }
                    "xlsx" | "xlsm" | "xls" | "ods" => read_workbook(path, sheet_hints),
                    other => Err(MonetizerError::UnsupportedFormat(other.to_string())),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// load_dataset
// ---------------------------------------------------------------------------

pub fn load_dataset(source: &DataSource, sheet_hints: &[String]) -> Result<Dataset> {
    let table = source.read_table(sheet_hints)?;
    records_from_table(&source.label(), &table)
}

/// Turn a raw table into seizure records. Missing date or category columns
/// are fatal; rows whose date does not parse are dropped.
pub fn records_from_table(source: &str, table: &RawTable) -> Result<Dataset> {
    let missing = |column: &str| MonetizerError::MissingColumn {
        column: column.to_string(),
        available: table.headers.join(", "),
    };
    let date_idx = find_column(&table.headers, DATE_COLUMNS).ok_or_else(|| missing("date"))?;
    let cat_idx = find_column(&table.headers, CATEGORY_COLUMNS)
        .filter(|i| *i != date_idx)
        .ok_or_else(|| missing("category"))?;
    let qty_idx = find_column(&table.headers, QUANTITY_COLUMNS)
        .filter(|i| *i != date_idx && *i != cat_idx);

    let quantity_source = match qty_idx {
        Some(i) => QuantitySource::Column(table.headers[i].clone()),
        None => {
            tracing::info!("no quantity column; assuming 1 per record");
            QuantitySource::Assumed
        }
    };

    let mut records = Vec::new();
    let mut dropped_rows = table.skipped_rows;
    for row in &table.rows {
        let Some(date) = table.datetime(row, date_idx) else {
            dropped_rows += 1;
            continue;
        };
        let quantity = match qty_idx {
            Some(i) => table.quantity(row, i),
            None => RawQuantity::Number(1.0),
        };
        records.push(SeizureRecord {
            date,
            category: table.text(row, cat_idx),
            quantity,
        });
    }
    if dropped_rows > 0 {
        tracing::warn!(dropped_rows, source, "rows without a valid date or unreadable were dropped");
    }

    Ok(Dataset {
        source: source.to_string(),
        columns: ColumnMap {
            date: table.headers[date_idx].clone(),
            category: table.headers[cat_idx].clone(),
            quantity: quantity_source,
        },
        records,
        dropped_rows,
    })
}
