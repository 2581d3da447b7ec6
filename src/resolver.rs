use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::cost_table::{CostTable, CURRENCY_KEY};

/// Historical spellings seen in seizure spreadsheets, keyed by folded label.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("artesanal longa", "Armas - Espingarda Artesanal"),
    ("arma artesanal longa", "Armas - Espingarda Artesanal"),
    ("espingarda artesanal", "Armas - Espingarda Artesanal"),
    ("artesanal curta", "Armas - Revólver Artesanal"),
    ("arma artesanal curta", "Armas - Revólver Artesanal"),
    ("revolver artesanal", "Armas - Revólver Artesanal"),
    ("municao", "Munições"),
    ("cocaina", "Cloridrato de cocaína"),
    ("lanca perfume", "Lança-perfume"),
    ("veiculo de passeio", "Veículos de passeio"),
    ("carro", "Veículos de passeio"),
    ("automovel", "Veículos de passeio"),
    ("motocicleta", "Motocicletas"),
    ("moto", "Motocicletas"),
    ("veiculo pesado", "Veículos pesados"),
    ("caminhao", "Veículos pesados"),
];

const GROUP_SEPARATORS: &[&str] = &[" - ", " \u{2013} ", " \u{2014} "];

/// Shortest folded label allowed to match inside a longer catalogue name.
const MIN_REVERSE_MATCH: usize = 3;

fn currency_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(dinheiro|cash|money|especie|numerario)\b").expect("constant pattern")
    })
}

/// Normalize a label for comparison: trim, collapse whitespace, lowercase,
/// drop Portuguese diacritics.
pub fn fold(label: &str) -> String {
    let lowered = label.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Suffix of a `Group - Name` key, if the key carries a group prefix.
fn group_suffix(folded_key: &str) -> Option<&str> {
    GROUP_SEPARATORS
        .iter()
        .find_map(|sep| folded_key.split_once(sep).map(|(_, suffix)| suffix.trim()))
        .filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Alias map
// ---------------------------------------------------------------------------

/// Raw spelling -> canonical key. Fixed at startup.
#[derive(Debug, Clone)]
pub struct AliasMap {
    pairs: Vec<(String, String)>,
}

impl AliasMap {
    pub fn builtin() -> Self {
        Self {
            pairs: BUILTIN_ALIASES
                .iter()
                .map(|(raw, canonical)| (fold(raw), canonical.to_string()))
                .collect(),
        }
    }

    pub fn get(&self, folded: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(raw, _)| raw == folded)
            .map(|(_, canonical)| canonical.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rule chain — enum dispatch, applied in declaration order
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    Alias,
    Substring,
    Currency,
}

const CHAIN: &[MatchRule] = &[
    MatchRule::Exact,
    MatchRule::Alias,
    MatchRule::Substring,
    MatchRule::Currency,
];

impl MatchRule {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Alias => "alias",
            Self::Substring => "substring",
            Self::Currency => "currency",
        }
    }

    fn apply(&self, folded: &str, resolver: &AliasResolver) -> Option<String> {
        match self {
            Self::Exact => resolver
                .keys
                .iter()
                .find(|k| k.folded == folded)
                .map(|k| k.canonical.clone()),
            Self::Alias => resolver
                .aliases
                .get(folded)
                .filter(|target| resolver.table.contains(target))
                .map(str::to_string),
            Self::Substring => resolver
                .keys
                .iter()
                .find(|k| k.substring_match(folded))
                .map(|k| k.canonical.clone()),
            Self::Currency => currency_pattern()
                .is_match(folded)
                .then(|| CURRENCY_KEY.to_string()),
        }
    }
}

/// Outcome of resolving one raw label.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    Resolved { key: String, rule: MatchRule },
    Unresolved { raw: String },
}

impl Resolution {
    pub fn canonical(&self) -> Option<&str> {
        match self {
            Self::Resolved { key, .. } => Some(key),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn is_currency(&self) -> bool {
        self.canonical() == Some(CURRENCY_KEY)
    }
}

#[derive(Debug, Clone)]
struct FoldedKey {
    canonical: String,
    folded: String,
    suffix: Option<String>,
}

impl FoldedKey {
    fn substring_match(&self, raw: &str) -> bool {
        match &self.suffix {
            Some(suffix) => {
                raw.contains(suffix.as_str())
                    || (raw.chars().count() >= MIN_REVERSE_MATCH && suffix.contains(raw))
            }
            None => raw.contains(self.folded.as_str()),
        }
    }
}

/// Maps uncontrolled category labels onto cost table keys.
pub struct AliasResolver<'a> {
    table: &'a CostTable,
    aliases: AliasMap,
    keys: Vec<FoldedKey>,
}

impl<'a> AliasResolver<'a> {
    pub fn new(table: &'a CostTable) -> Self {
        Self::with_aliases(table, AliasMap::builtin())
    }

    pub fn with_aliases(table: &'a CostTable, aliases: AliasMap) -> Self {
        let keys = table
            .entries()
            .iter()
            .map(|e| {
                let folded = fold(&e.category);
                let suffix = group_suffix(&folded).map(str::to_string);
                FoldedKey {
                    canonical: e.category.clone(),
                    folded,
                    suffix,
                }
            })
            .collect();
        Self {
            table,
            aliases,
            keys,
        }
    }

    pub fn table(&self) -> &CostTable {
        self.table
    }

    pub fn resolve(&self, raw: &str) -> Resolution {
        let folded = fold(raw);
        if !folded.is_empty() {
            for rule in CHAIN {
                if let Some(key) = rule.apply(&folded, self) {
                    return Resolution::Resolved { key, rule: *rule };
                }
            }
        }
        Resolution::Unresolved {
            raw: raw.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CostEntry;

    fn resolved(table: &CostTable, raw: &str) -> Resolution {
        AliasResolver::new(table).resolve(raw)
    }

    fn key_of(table: &CostTable, raw: &str) -> Option<String> {
        resolved(table, raw).canonical().map(str::to_string)
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold("  Cloridrato   de COCAÍNA "), "cloridrato de cocaina");
        assert_eq!(fold("Munições"), "municoes");
        assert_eq!(fold("Lança-perfume"), "lanca-perfume");
        assert_eq!(fold(""), "");
    }

    #[test]
    fn test_group_suffix() {
        assert_eq!(group_suffix("armas - revolver"), Some("revolver"));
        assert_eq!(group_suffix("armas \u{2013} fuzil"), Some("fuzil"));
        assert_eq!(group_suffix("lanca-perfume"), None);
        assert_eq!(group_suffix("maconha"), None);
    }

    #[test]
    fn test_exact_match_ignores_case_and_accents() {
        let table = CostTable::builtin();
        assert_eq!(
            resolved(&table, "cloridrato de cocaina"),
            Resolution::Resolved {
                key: "Cloridrato de cocaína".into(),
                rule: MatchRule::Exact
            }
        );
        assert_eq!(key_of(&table, " MACONHA "), Some("Maconha".into()));
    }

    #[test]
    fn test_alias_handcrafted_long_gun() {
        let table = CostTable::builtin();
        let r = resolved(&table, "Artesanal Longa");
        assert_eq!(
            r,
            Resolution::Resolved {
                key: "Armas - Espingarda Artesanal".into(),
                rule: MatchRule::Alias
            }
        );
        assert_eq!(table.lookup(r.canonical().unwrap()).unwrap().unit_cost, 600.0);
    }

    #[test]
    fn test_alias_short_barrel_and_singular_ammunition() {
        let table = CostTable::builtin();
        assert_eq!(key_of(&table, "Artesanal Curta"), Some("Armas - Revólver Artesanal".into()));
        assert_eq!(key_of(&table, "Munição"), Some("Munições".into()));
        assert_eq!(key_of(&table, "Revólver Artesanal"), Some("Armas - Revólver Artesanal".into()));
    }

    #[test]
    fn test_alias_skipped_when_target_missing_from_table() {
        let table = CostTable::from_entries(vec![CostEntry {
            category: "Maconha".into(),
            unit_label: "Kg".into(),
            unit_cost: 1.0,
        }])
        .unwrap();
        assert_eq!(
            resolved(&table, "Munição"),
            Resolution::Unresolved {
                raw: "Munição".into()
            }
        );
    }

    #[test]
    fn test_substring_on_group_suffix() {
        let table = CostTable::builtin();
        let r = resolved(&table, "Revólver");
        assert_eq!(
            r,
            Resolution::Resolved {
                key: "Armas - Revólver".into(),
                rule: MatchRule::Substring
            }
        );
        assert_eq!(table.lookup(r.canonical().unwrap()).unwrap().unit_cost, 3000.0);
    }

    #[test]
    fn test_substring_both_directions() {
        let table = CostTable::builtin();
        // suffix inside label
        assert_eq!(key_of(&table, "Pistola calibre .40"), Some("Armas - Pistola".into()));
        // label inside suffix
        assert_eq!(
            key_of(&table, "Submetralhadora"),
            Some("Armas - Metralhadora e Submetralhadora".into())
        );
    }

    #[test]
    fn test_substring_reverse_needs_minimum_length() {
        let table = CostTable::builtin();
        assert_eq!(key_of(&table, "fu"), None);
    }

    #[test]
    fn test_substring_unprefixed_key_inside_label() {
        let table = CostTable::builtin();
        assert_eq!(key_of(&table, "Maconha prensada"), Some("Maconha".into()));
        // one direction only for unprefixed keys
        assert_eq!(key_of(&table, "Macon"), None);
    }

    #[test]
    fn test_substring_takes_first_key_in_table_order() {
        let table = CostTable::builtin();
        assert_eq!(key_of(&table, "Crack e Maconha"), Some("Maconha".into()));
    }

    #[test]
    fn test_currency_rule() {
        let table = CostTable::builtin();
        assert_eq!(
            resolved(&table, "Cash (USD)"),
            Resolution::Resolved {
                key: CURRENCY_KEY.into(),
                rule: MatchRule::Currency
            }
        );
        assert!(resolved(&table, "Valores em espécie").is_currency());
        assert!(resolved(&table, "Dinheiro apreendido - operação X").is_currency());
    }

    #[test]
    fn test_currency_rule_ignores_table_contents() {
        let table = CostTable::from_entries(vec![CostEntry {
            category: "Maconha".into(),
            unit_label: "Kg".into(),
            unit_cost: 1.0,
        }])
        .unwrap();
        assert!(resolved(&table, "dinheiro").is_currency());
    }

    #[test]
    fn test_unresolved_returns_raw_label() {
        let table = CostTable::builtin();
        assert_eq!(
            resolved(&table, "Celular"),
            Resolution::Unresolved {
                raw: "Celular".into()
            }
        );
        assert_eq!(key_of(&table, "   "), None);
    }

    #[test]
    fn test_resolution_is_order_independent() {
        let table = CostTable::builtin();
        let resolver = AliasResolver::new(&table);
        let first = resolver.resolve("Revólver");
        resolver.resolve("Artesanal Longa");
        resolver.resolve("Celular");
        assert_eq!(resolver.resolve("Revólver"), first);
    }
}
