use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::{RawQuantity, SeizureRecord};
use crate::resolver::{AliasResolver, Resolution};

/// A record with its derived value. Built fresh from a `SeizureRecord`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonetizedRecord {
    pub date: NaiveDateTime,
    pub category: String,
    /// Parsed quantity, 0 when missing or unparseable.
    pub quantity: f64,
    pub resolution: Resolution,
    pub value: f64,
}

/// Value of `quantity_raw` units of `category_raw`.
///
/// Cash is identity: the quantity already is money, so the table's unit
/// cost for it is never applied. Unresolved labels are worth 0.
pub fn monetize(resolver: &AliasResolver, category_raw: &str, quantity_raw: &RawQuantity) -> f64 {
    let Some(quantity) = quantity_raw.parse() else {
        return 0.0;
    };
    value_of(resolver, &resolver.resolve(category_raw), quantity)
}

fn value_of(resolver: &AliasResolver, resolution: &Resolution, quantity: f64) -> f64 {
    if resolution.is_currency() {
        return quantity;
    }
    resolution
        .canonical()
        .and_then(|key| resolver.table().lookup(key))
        .map(|entry| quantity * entry.unit_cost)
        .unwrap_or(0.0)
}

pub fn monetize_record(resolver: &AliasResolver, record: &SeizureRecord) -> MonetizedRecord {
    let resolution = resolver.resolve(&record.category);
    let parsed = record.quantity.parse();
    let value = parsed
        .map(|q| value_of(resolver, &resolution, q))
        .unwrap_or(0.0);
    MonetizedRecord {
        date: record.date,
        category: record.category.clone(),
        quantity: parsed.unwrap_or(0.0),
        resolution,
        value,
    }
}

pub fn monetize_all(resolver: &AliasResolver, records: &[SeizureRecord]) -> Vec<MonetizedRecord> {
    records.iter().map(|r| monetize_record(resolver, r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost_table::{CostTable, CURRENCY_KEY};
    use crate::models::CostEntry;

    fn num(q: f64) -> RawQuantity {
        RawQuantity::Number(q)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_known_categories_multiply_unit_cost() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        for entry in table.entries().iter().filter(|e| e.category != CURRENCY_KEY) {
            let value = monetize(&resolver, &entry.category, &num(2.5));
            assert!(approx(value, 2.5 * entry.unit_cost), "{}", entry.category);
        }
    }

    #[test]
    fn test_reference_scenario_values() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        assert!(approx(monetize(&resolver, "Maconha", &num(0.09)), 195.156));
        assert!(approx(monetize(&resolver, "Cloridrato de cocaína", &num(0.03)), 5400.0));
    }

    #[test]
    fn test_currency_is_identity() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        assert_eq!(monetize(&resolver, "Dinheiro apreendido", &num(76.0)), 76.0);
        assert_eq!(
            monetize(&resolver, "Dinheiro apreendido em espécie", &RawQuantity::Text("76".into())),
            76.0
        );
    }

    #[test]
    fn test_currency_ignores_table_unit_cost() {
        let table = CostTable::from_entries(vec![CostEntry {
            category: CURRENCY_KEY.into(),
            unit_label: "R$".into(),
            unit_cost: 3.5,
        }])
        .unwrap();
        let resolver = AliasResolver::new(&table);
        assert_eq!(monetize(&resolver, "Dinheiro apreendido", &num(76.0)), 76.0);
    }

    #[test]
    fn test_currency_without_table_entry() {
        let table = CostTable::from_entries(vec![CostEntry {
            category: "Maconha".into(),
            unit_label: "Kg".into(),
            unit_cost: 10.0,
        }])
        .unwrap();
        let resolver = AliasResolver::new(&table);
        assert_eq!(monetize(&resolver, "cash", &num(40.0)), 40.0);
    }

    #[test]
    fn test_missing_or_bad_quantity_is_zero() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        assert_eq!(monetize(&resolver, "Maconha", &RawQuantity::Missing), 0.0);
        assert_eq!(monetize(&resolver, "Maconha", &RawQuantity::Text("n/d".into())), 0.0);
        assert_eq!(monetize(&resolver, "Dinheiro apreendido", &RawQuantity::Text("".into())), 0.0);
    }

    #[test]
    fn test_unresolved_category_is_zero() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        assert_eq!(monetize(&resolver, "Celular", &num(10.0)), 0.0);
    }

    #[test]
    fn test_monetize_record_keeps_row_with_zero_quantity() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        let record = SeizureRecord {
            date: chrono::NaiveDate::from_ymd_opt(2025, 9, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            category: "Revólver".into(),
            quantity: RawQuantity::Text("?".into()),
        };
        let m = monetize_record(&resolver, &record);
        assert_eq!(m.quantity, 0.0);
        assert_eq!(m.value, 0.0);
        assert_eq!(m.resolution.canonical(), Some("Armas - Revólver"));
    }
}
