use std::collections::HashSet;

use crate::error::{MonetizerError, Result};
use crate::importer::{find_column, DataSource, RawTable};
use crate::models::{parse_quantity, CostEntry};

/// Canonical key for seized cash. Monetized as identity, whatever the
/// table says its unit cost is.
pub const CURRENCY_KEY: &str = "Dinheiro apreendido";

const BUILTIN: &[(&str, &str, f64)] = &[
    ("Maconha", "Kg", 2168.4),
    ("Haxixe", "Kg", 12000.0),
    ("Pasta base", "Kg", 120000.0),
    ("Cloridrato de cocaína", "Kg", 180000.0),
    ("Crack", "Kg", 20000.0),
    ("Anfetaminas", "Unidade", 6.0),
    ("Barbitúricos", "Unidade", 6.0),
    ("LSD", "Ponto", 30.0),
    ("Lança-perfume", "Caixa", 1250.0),
    ("Ecstasy", "Unidade", 40.0),
    ("Cigarro", "Pacote", 35.0),
    ("Armas - Revólver", "Unidade", 3000.0),
    ("Armas - Revólver Artesanal", "Unidade", 500.0),
    ("Armas - Pistola", "Unidade", 5000.0),
    ("Armas - Fuzil", "Unidade", 40000.0),
    ("Armas - Metralhadora e Submetralhadora", "Unidade", 30000.0),
    ("Armas - Espingarda", "Unidade", 5000.0),
    ("Armas - Espingarda Artesanal", "Unidade", 600.0),
    ("Armas - Carabina", "Unidade", 5000.0),
    ("Munições", "Unidade", 15.0),
    ("Veículos de passeio", "Unidade", 55092.43),
    ("Motocicletas", "Unidade", 18889.78),
    ("Veículos pesados", "Unidade", 120980.0),
    (CURRENCY_KEY, "R$", 1.0),
];

const CATEGORY_COLUMNS: &[&str] = &["categoria", "category"];
const UNIT_COLUMNS: &[&str] = &["unidade", "unit"];
const COST_COLUMNS: &[&str] = &["custo", "cost", "valor", "preco"];

/// Unit cost catalogue. Built once per run and only read afterwards;
/// iteration order is the order entries were supplied in.
#[derive(Debug, Clone)]
pub struct CostTable {
    entries: Vec<CostEntry>,
}

impl CostTable {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(category, unit, cost)| CostEntry {
                    category: category.to_string(),
                    unit_label: unit.to_string(),
                    unit_cost: *cost,
                })
                .collect(),
        }
    }

    pub fn from_entries(entries: Vec<CostEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(MonetizerError::InvalidCriteria("no valid rows".to_string()));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !entry.unit_cost.is_finite() || entry.unit_cost < 0.0 {
                return Err(MonetizerError::InvalidCriteria(format!(
                    "unit cost for '{}' must be a non-negative number",
                    entry.category
                )));
            }
            if !seen.insert(entry.category.as_str()) {
                return Err(MonetizerError::DuplicateCategory(entry.category.clone()));
            }
        }
        Ok(Self { entries })
    }

    /// Load an external criteria table that replaces the built-in one.
    pub fn load(source: &DataSource) -> Result<Self> {
        let table = source.read_table(&[])?;
        Self::from_raw_table(&table)
    }

    pub fn from_raw_table(table: &RawTable) -> Result<Self> {
        let cat_idx = find_column(&table.headers, CATEGORY_COLUMNS).ok_or_else(|| {
            MonetizerError::MissingColumn {
                column: "category".to_string(),
                available: table.headers.join(", "),
            }
        })?;
        let cost_idx = find_column(&table.headers, COST_COLUMNS).ok_or_else(|| {
            MonetizerError::MissingColumn {
                column: "unit cost".to_string(),
                available: table.headers.join(", "),
            }
        })?;
        let unit_idx = find_column(&table.headers, UNIT_COLUMNS)
            .filter(|i| *i != cost_idx && *i != cat_idx);

        let mut entries = Vec::new();
        for (line, row) in table.rows.iter().enumerate() {
            let category = table.text(row, cat_idx);
            if category.is_empty() {
                tracing::warn!(row = line + 2, "criteria row without category rejected");
                continue;
            }
            let cost = table.number(row, cost_idx).or_else(|| parse_quantity(&table.text(row, cost_idx)));
            let Some(unit_cost) = cost.filter(|c| c.is_finite() && *c >= 0.0) else {
                tracing::warn!(row = line + 2, %category, "criteria row with invalid unit cost rejected");
                continue;
            };
            let unit_label = unit_idx.map(|i| table.text(row, i)).unwrap_or_default();
            entries.push(CostEntry {
                category,
                unit_label,
                unit_cost,
            });
        }
        tracing::info!(entries = entries.len(), "loaded criteria table");
        Self::from_entries(entries)
    }

    pub fn lookup(&self, key: &str) -> Option<&CostEntry> {
        self.entries.iter().find(|e| e.category == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    pub fn entries(&self) -> &[CostEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
