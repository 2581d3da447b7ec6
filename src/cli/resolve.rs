use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::criteria_source;
use crate::cost_table::CURRENCY_KEY;
use crate::error::Result;
use crate::fmt::money;
use crate::models::RawQuantity;
use crate::monetizer::monetize;
use crate::pipeline;
use crate::resolver::{AliasResolver, Resolution};
use crate::settings::load_settings;

fn resolution_table(resolver: &AliasResolver, labels: &[String], quantity: Option<&RawQuantity>) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Label", "Rule", "Cost Table Entry", "Unit", "Unit Cost"];
    if quantity.is_some() {
        header.push("Value");
    }
    table.set_header(header);

    for label in labels {
        let mut row = match resolver.resolve(label) {
            Resolution::Resolved { key, rule } => {
                let entry = resolver.table().lookup(&key);
                let unit = entry.map(|e| e.unit_label.clone()).unwrap_or_default();
                let cost = if key == CURRENCY_KEY {
                    "face value".to_string()
                } else {
                    entry.map(|e| money(e.unit_cost)).unwrap_or_default()
                };
                vec![
                    Cell::new(label),
                    Cell::new(rule.key()),
                    Cell::new(key),
                    Cell::new(unit),
                    Cell::new(cost).set_alignment(CellAlignment::Right),
                ]
            }
            Resolution::Unresolved { .. } => vec![
                Cell::new(label),
                Cell::new("unresolved".red()),
                Cell::new(""),
                Cell::new(""),
                Cell::new(money(0.0)).set_alignment(CellAlignment::Right),
            ],
        };
        if let Some(q) = quantity {
            row.push(Cell::new(money(monetize(resolver, label, q))).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }
    table
}

pub fn run(labels: &[String], criteria: Option<&str>, quantity: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let table = pipeline::cost_table(criteria_source(criteria, &settings).as_ref())?;
    let resolver = AliasResolver::new(&table);
    let quantity = quantity.map(|q| RawQuantity::Text(q.to_string()));
    println!("{}", resolution_table(&resolver, labels, quantity.as_ref()));
    Ok(())
}
