use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};
use serde::Serialize;

use crate::cli::{load_base, FilterArgs, InputArgs, OutputFormat};
use crate::error::Result;
use crate::fmt::{money, pct, quantity, signed_money};
use crate::models::QuantitySource;
use crate::pipeline::BaseTable;
use crate::reports::{build_report, Aggregation, CategoryTable, DateWindow, PeriodComparison, Report};

/// JSON hand-off to the reporting side.
#[derive(Serialize)]
struct ReportPayload<'a> {
    source: &'a str,
    dropped_rows: usize,
    quantity_column: &'a QuantitySource,
    #[serde(flatten)]
    report: &'a Report,
}

pub fn run(input: &InputArgs, filter: &FilterArgs, format: OutputFormat) -> Result<()> {
    let base = load_base(input)?;
    render(&base, filter, format)
}

pub(crate) fn render(base: &BaseTable, filter: &FilterArgs, format: OutputFormat) -> Result<()> {
    let filter = filter.to_filter(&base.records)?;
    let report = build_report(&base.records, &filter);
    match format {
        OutputFormat::Json => print_json(base, &report),
        OutputFormat::Csv => print_csv(&report),
        OutputFormat::Table => {
            print_table(base, &report);
            Ok(())
        }
    }
}

fn print_json(base: &BaseTable, report: &Report) -> Result<()> {
    let payload = ReportPayload {
        source: &base.dataset.source,
        dropped_rows: base.dataset.dropped_rows,
        quantity_column: &base.dataset.columns.quantity,
        report,
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn print_csv(report: &Report) -> Result<()> {
    let Aggregation::Table(table) = &report.aggregation else {
        eprintln!("No records found for the selected filters.");
        return Ok(());
    };
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in &table.rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn window_label(window: &DateWindow) -> String {
    let days = window.days();
    format!(
        "{} to {} ({days} day{})",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d"),
        if days == 1 { "" } else { "s" }
    )
}

fn category_table(data: &CategoryTable) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Cost Table Entry", "Quantity", "Value", "% Value", "% Qty", "Records"]);
    for row in &data.rows {
        let canonical = match &row.canonical {
            Some(c) => c.as_str().normal(),
            None => "unresolved".yellow(),
        };
        table.add_row(vec![
            Cell::new(&row.category),
            Cell::new(canonical),
            Cell::new(quantity(row.quantity_sum)).set_alignment(CellAlignment::Right),
            Cell::new(money(row.value_sum)).set_alignment(CellAlignment::Right),
            Cell::new(pct(row.value_pct)).set_alignment(CellAlignment::Right),
            Cell::new(pct(row.quantity_pct)).set_alignment(CellAlignment::Right),
            Cell::new(row.record_count).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        Cell::new(quantity(data.total_quantity)).set_alignment(CellAlignment::Right),
        Cell::new(money(data.total_value).bold()).set_alignment(CellAlignment::Right),
        Cell::new(""),
        Cell::new(""),
        Cell::new(data.record_count).set_alignment(CellAlignment::Right),
    ]);
    table
}

fn comparison_line(comparison: &PeriodComparison) -> String {
    match comparison {
        PeriodComparison::NoData { previous_window } => {
            format!("Previous period {}: no data", window_label(previous_window))
        }
        PeriodComparison::Delta {
            previous_window,
            previous_total,
            delta,
            pct_change,
            ..
        } => {
            let change = pct_change.map_or("N/A".to_string(), |p| format!("{p:+.2}%"));
            let delta_str = format!("{} ({change})", signed_money(*delta));
            let delta_str = if *delta > 0.0 {
                delta_str.green()
            } else if *delta < 0.0 {
                delta_str.red()
            } else {
                delta_str.normal()
            };
            format!(
                "Previous period {}: {}\nChange: {delta_str}",
                window_label(previous_window),
                money(*previous_total)
            )
        }
    }
}

fn print_table(base: &BaseTable, report: &Report) {
    println!("{}", format!("Seizure Monetization: {}", base.dataset.source).bold());
    println!("Period: {}", window_label(&report.window));
    if let Some(categories) = &report.categories {
        println!("Categories: {}", categories.join(", "));
    }
    if base.dataset.columns.quantity == QuantitySource::Assumed {
        println!("{}", "No quantity column found; each record counts as 1.".yellow());
    }
    if base.dataset.dropped_rows > 0 {
        println!(
            "{}",
            format!("{} rows without a valid date were skipped.", base.dataset.dropped_rows).yellow()
        );
    }
    println!();

    match &report.aggregation {
        Aggregation::Empty => println!("No records found for the selected filters."),
        Aggregation::Table(data) => {
            println!("{}", category_table(data));
            println!(
                "\nTotal monetized: {}  |  Records: {}  |  Categories: {}",
                money(data.total_value).bold(),
                data.record_count,
                data.rows.len()
            );
        }
    }
    println!("{}", comparison_line(&report.comparison));
}
