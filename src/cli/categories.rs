use std::collections::BTreeMap;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{load_base, InputArgs};
use crate::error::Result;
use crate::monetizer::MonetizedRecord;
use crate::resolver::Resolution;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRow {
    pub category: String,
    pub count: usize,
    pub resolution: Resolution,
}

/// Distinct raw labels in the dataset, sorted, with how each resolves.
pub fn list_categories(records: &[MonetizedRecord]) -> Vec<CategoryRow> {
    let mut by_label: BTreeMap<&str, CategoryRow> = BTreeMap::new();
    for record in records {
        by_label
            .entry(record.category.as_str())
            .or_insert_with(|| CategoryRow {
                category: record.category.clone(),
                count: 0,
                resolution: record.resolution.clone(),
            })
            .count += 1;
    }
    by_label.into_values().collect()
}

pub fn run(input: &InputArgs) -> Result<()> {
    let base = load_base(input)?;
    let rows = list_categories(&base.records);

    let mut table = Table::new();
    table.set_header(vec!["Category", "Records", "Rule", "Cost Table Entry"]);
    let mut unresolved = 0;
    for row in &rows {
        let (rule, canonical) = match &row.resolution {
            Resolution::Resolved { key, rule } => (rule.key().normal(), key.as_str().normal()),
            Resolution::Unresolved { .. } => {
                unresolved += 1;
                ("unresolved".yellow(), "".normal())
            }
        };
        table.add_row(vec![
            Cell::new(&row.category),
            Cell::new(row.count).set_alignment(CellAlignment::Right),
            Cell::new(rule),
            Cell::new(canonical),
        ]);
    }
    println!("Categories in {}", base.dataset.source);
    if let Some((first, last)) = base.dataset.date_bounds() {
        println!("Records from {} to {}", first.format("%Y-%m-%d"), last.format("%Y-%m-%d"));
    }
    println!("{table}");
    if unresolved > 0 {
        println!(
            "{}",
            format!("{unresolved} unresolved categories are valued at zero.").yellow()
        );
    }
    Ok(())
}
