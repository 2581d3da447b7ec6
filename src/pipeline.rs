use crate::cache::{compute_checksum, DatasetCache};
use crate::cost_table::CostTable;
use crate::error::Result;
use crate::importer::{load_dataset, DataSource};
use crate::models::Dataset;
use crate::monetizer::{monetize_all, MonetizedRecord};
use crate::resolver::AliasResolver;

pub struct LoadOptions<'c> {
    pub sheet_hints: Vec<String>,
    /// `None` disables caching.
    pub cache: Option<&'c DatasetCache>,
}

/// Load a dataset, going through the cache for file sources.
pub fn load(source: &DataSource, options: &LoadOptions) -> Result<Dataset> {
    let cache = match (source, options.cache) {
        (DataSource::File(_), Some(cache)) => cache,
        _ => return load_dataset(source, &options.sheet_hints),
    };

    let checksum = compute_checksum(&source.bytes()?, &options.sheet_hints);
    if let Some(mut dataset) = cache.get(&checksum) {
        dataset.source = source.label();
        return Ok(dataset);
    }
    tracing::debug!(%checksum, "dataset cache miss");
    let dataset = load_dataset(source, &options.sheet_hints)?;
    if let Err(err) = cache.put(&checksum, &dataset) {
        tracing::warn!(error = %err, "could not write dataset cache");
    }
    Ok(dataset)
}

/// The active cost table: an external criteria table when given, the
/// built-in one otherwise. Fully built before any record is monetized.
pub fn cost_table(criteria: Option<&DataSource>) -> Result<CostTable> {
    match criteria {
        Some(source) => CostTable::load(source),
        None => Ok(CostTable::builtin()),
    }
}

/// Loaded records with their monetized view.
pub struct BaseTable {
    pub dataset: Dataset,
    pub records: Vec<MonetizedRecord>,
}

pub fn monetize_dataset(dataset: Dataset, table: &CostTable) -> BaseTable {
    let resolver = AliasResolver::new(table);
    let records = monetize_all(&resolver, &dataset.records);
    BaseTable { dataset, records }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Data;Categoria;Quantidade\n\
                       01/09/2025;Maconha;0,09\n\
                       01/09/2025;Cloridrato de cocaína;0,03\n\
                       01/09/2025;Dinheiro apreendido;76\n";

    #[test]
    fn test_load_populates_and_reuses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apreensoes.csv");
        std::fs::write(&path, CSV).unwrap();
        let cache = DatasetCache::new(dir.path().join("cache"));
        let options = LoadOptions {
            sheet_hints: Vec::new(),
            cache: Some(&cache),
        };
        let source = DataSource::File(path.clone());

        let first = load(&source, &options).unwrap();
        assert_eq!(cache.entry_count(), 1);
        let second = load(&source, &options).unwrap();
        assert_eq!(first.records, second.records);
        assert_eq!(cache.entry_count(), 1);

        std::fs::write(&path, format!("{CSV}02/09/2025;Crack;1\n")).unwrap();
        let third = load(&source, &options).unwrap();
        assert_eq!(third.records.len(), 4);
        assert_eq!(cache.entry_count(), 2);
    }

    #[test]
    fn test_cache_hit_reports_current_path() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("setembro.csv");
        let second = dir.path().join("copia.csv");
        std::fs::write(&first, CSV).unwrap();
        std::fs::write(&second, CSV).unwrap();
        let cache = DatasetCache::new(dir.path().join("cache"));
        let options = LoadOptions {
            sheet_hints: Vec::new(),
            cache: Some(&cache),
        };

        load(&DataSource::File(first), &options).unwrap();
        let source = DataSource::File(second);
        let dataset = load(&source, &options).unwrap();
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(dataset.source, source.label());
    }

    #[test]
    fn test_embedded_sources_skip_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new(dir.path());
        let options = LoadOptions {
            sheet_hints: Vec::new(),
            cache: Some(&cache),
        };
        load(&DataSource::demo(), &options).unwrap();
        assert_eq!(cache.entry_count(), 0);
    }

    #[test]
    fn test_monetize_dataset() {
        let source = DataSource::Embedded {
            name: "t.csv".into(),
            content: CSV.into(),
        };
        let dataset = load_dataset(&source, &[]).unwrap();
        let base = monetize_dataset(dataset, &CostTable::builtin());
        let values: Vec<f64> = base.records.iter().map(|r| r.value).collect();
        assert!((values[0] - 195.156).abs() < 1e-9);
        assert!((values[1] - 5400.0).abs() < 1e-9);
        assert_eq!(values[2], 76.0);
    }

    #[test]
    fn test_cost_table_prefers_criteria() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("criterios.csv");
        std::fs::write(&path, "Categoria,Unidade,Custo\nMaconha,Kg,10\n").unwrap();
        let table = cost_table(Some(&DataSource::File(path))).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(cost_table(None).unwrap().len(), 24);
    }
}
