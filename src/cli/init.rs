use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path, Settings};

pub struct InitOptions {
    pub source: Option<String>,
    pub criteria: Option<String>,
    pub sheets: Vec<String>,
    pub no_cache: bool,
}

/// Merge the given options into existing settings. Unset options keep the
/// current values.
pub fn apply(mut settings: Settings, options: InitOptions) -> Settings {
    if let Some(source) = options.source {
        settings.source = Some(shellexpand_path(&source));
    }
    if let Some(criteria) = options.criteria {
        settings.criteria = Some(shellexpand_path(&criteria));
    }
    if !options.sheets.is_empty() {
        settings.preferred_sheets = options.sheets;
    }
    if options.no_cache {
        settings.cache_enabled = false;
    }
    settings
}

pub fn run(options: InitOptions) -> Result<()> {
    let settings = apply(load_settings(), options);
    save_settings(&settings)?;

    for path in [&settings.source, &settings.criteria].into_iter().flatten() {
        if !Path::new(path).exists() {
            println!("{}", format!("Warning: {path} does not exist yet.").yellow());
        }
    }
    println!("Saved settings to {}", settings_path().display());
    Ok(())
}
