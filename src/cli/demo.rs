use crate::cli::{report, FilterArgs, OutputFormat};
use crate::cost_table::CostTable;
use crate::error::Result;
use crate::importer::DataSource;
use crate::pipeline::{self, BaseTable, LoadOptions};

/// The bundled sample dataset monetized against the built-in cost table.
pub fn demo_base() -> Result<BaseTable> {
    let options = LoadOptions {
        sheet_hints: Vec::new(),
        cache: None,
    };
    let dataset = pipeline::load(&DataSource::demo(), &options)?;
    Ok(pipeline::monetize_dataset(dataset, &CostTable::builtin()))
}

pub fn run(filter: &FilterArgs, format: OutputFormat) -> Result<()> {
    let base = demo_base()?;
    report::render(&base, filter, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{build_report, Aggregation};

    #[test]
    fn test_demo_base_monetizes_sample() {
        let base = demo_base().unwrap();
        assert_eq!(base.dataset.dropped_rows, 1);
        assert!(!base.records.is_empty());

        let filter = FilterArgs::default().to_filter(&base.records).unwrap();
        let report = build_report(&base.records, &filter);
        let Aggregation::Table(table) = &report.aggregation else {
            panic!("demo data should aggregate");
        };
        assert!(table.total_value > 0.0);
        assert!(table.rows.iter().any(|r| r.canonical.is_none()));
    }
}
