use std::io::Write;

use serde::Serialize;

use crate::cli::{load_base, FilterArgs, InputArgs};
use crate::error::Result;
use crate::monetizer::MonetizedRecord;
use crate::reports::{filter_records, round2};
use crate::resolver::Resolution;

/// Flat export row for one monetized record.
#[derive(Debug, Serialize)]
struct RecordRow<'a> {
    date: String,
    category: &'a str,
    canonical: &'a str,
    rule: &'a str,
    quantity: f64,
    value: f64,
}

impl<'a> From<&'a MonetizedRecord> for RecordRow<'a> {
    fn from(r: &'a MonetizedRecord) -> Self {
        let (canonical, rule) = match &r.resolution {
            Resolution::Resolved { key, rule } => (key.as_str(), rule.key()),
            Resolution::Unresolved { .. } => ("", "unresolved"),
        };
        RecordRow {
            date: r.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            category: &r.category,
            canonical,
            rule,
            quantity: r.quantity,
            value: round2(r.value),
        }
    }
}

fn write_records<W: Write>(out: W, records: &[&MonetizedRecord]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(out);
    for record in records {
        wtr.serialize(RecordRow::from(*record))?;
    }
    wtr.flush()?;
    Ok(records.len())
}

pub fn run(input: &InputArgs, filter: &FilterArgs, output: Option<&str>) -> Result<()> {
    let base = load_base(input)?;
    let filter = filter.to_filter(&base.records)?;
    let selected = filter_records(&base.records, &filter);

    match output {
        Some(path) => {
            let path = std::path::Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let count = write_records(std::fs::File::create(path)?, &selected)?;
            eprintln!("Wrote {count} records to {}", path.display());
        }
        None => {
            write_records(std::io::stdout(), &selected)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost_table::CostTable;
    use crate::models::{RawQuantity, SeizureRecord};
    use crate::monetizer::monetize_all;
    use crate::resolver::AliasResolver;
    use chrono::NaiveDate;

    #[test]
    fn test_write_records_csv() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        let date = NaiveDate::from_ymd_opt(2025, 10, 10).unwrap().and_hms_opt(14, 30, 0).unwrap();
        let raw = vec![
            SeizureRecord {
                date,
                category: "Maconha".into(),
                quantity: RawQuantity::Text("0,09".into()),
            },
            SeizureRecord {
                date,
                category: "Celular".into(),
                quantity: RawQuantity::Number(2.0),
            },
        ];
        let monetized = monetize_all(&resolver, &raw);
        let refs: Vec<&MonetizedRecord> = monetized.iter().collect();

        let mut buf = Vec::new();
        assert_eq!(write_records(&mut buf, &refs).unwrap(), 2);
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,category,canonical,rule,quantity,value");
        assert_eq!(lines[1], "2025-10-10 14:30:00,Maconha,Maconha,exact,0.09,195.16");
        assert_eq!(lines[2], "2025-10-10 14:30:00,Celular,,unresolved,2.0,0.0");
    }
}
