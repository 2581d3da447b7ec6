use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::criteria_source;
use crate::cost_table::{CostTable, CURRENCY_KEY};
use crate::error::Result;
use crate::fmt::money;
use crate::pipeline;
use crate::settings::load_settings;

fn criteria_table(table: &CostTable) -> Table {
    let mut entries: Vec<_> = table.entries().iter().collect();
    entries.sort_by(|a, b| a.category.cmp(&b.category));

    let mut out = Table::new();
    out.set_header(vec!["Category", "Unit", "Unit Cost"]);
    for entry in entries {
        let cost = if entry.category == CURRENCY_KEY {
            "face value".to_string()
        } else {
            money(entry.unit_cost)
        };
        out.add_row(vec![
            Cell::new(&entry.category),
            Cell::new(&entry.unit_label),
            Cell::new(cost).set_alignment(CellAlignment::Right),
        ]);
    }
    out
}

pub fn run(criteria: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let source = criteria_source(criteria, &settings);
    let table = pipeline::cost_table(source.as_ref())?;

    let origin = source.map_or_else(|| "built-in".to_string(), |s| s.label());
    println!("{}", format!("Cost table ({origin}), {} entries", table.len()).bold());
    println!("{}", criteria_table(&table));
    if !table.contains(CURRENCY_KEY) {
        println!(
            "{}",
            format!("No \"{CURRENCY_KEY}\" entry; cash labels are still valued at face value.").yellow()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criteria_table_sorted_with_cash_face_value() {
        let rendered = criteria_table(&CostTable::builtin()).to_string();
        let anfetaminas = rendered.find("Anfetaminas").unwrap();
        let veiculos = rendered.find("Veículos pesados").unwrap();
        assert!(anfetaminas < veiculos);
        assert!(rendered.contains("face value"));
        assert!(rendered.contains("R$ 180,000.00"));
    }
}
