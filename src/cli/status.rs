use std::path::Path;

use crate::cache::{default_cache_dir, DatasetCache};
use crate::error::Result;
use crate::settings::{load_settings, settings_file_exists, settings_path};

fn describe(path: Option<&str>, missing: &str) -> String {
    match path {
        None => missing.to_string(),
        Some(p) if Path::new(p).exists() => p.to_string(),
        Some(p) => format!("{p} (not found)"),
    }
}

pub fn run() -> Result<()> {
    let settings = load_settings();
    let cache = DatasetCache::new(default_cache_dir());

    let settings_label = if settings_file_exists() { "" } else { " (not created)" };
    println!("Settings:   {}{settings_label}", settings_path().display());
    println!("Source:     {}", describe(settings.source.as_deref(), "(not set)"));
    println!("Criteria:   {}", describe(settings.criteria.as_deref(), "built-in"));
    if !settings.preferred_sheets.is_empty() {
        println!("Sheets:     {}", settings.preferred_sheets.join(", "));
    }
    println!(
        "Cache:      {} ({})",
        cache.dir().display(),
        if settings.cache_enabled { "enabled" } else { "disabled" }
    );
    println!("Cached:     {} datasets", cache.entry_count());

    if settings.source.is_none() {
        println!();
        println!("No source configured. Run `seizure-monetizer init --source <file>` to set one.");
    }
    Ok(())
}
