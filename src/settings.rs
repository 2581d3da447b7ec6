use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MonetizerError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Default seizure dataset.
    #[serde(default)]
    pub source: Option<String>,
    /// Criteria table replacing the built-in cost table.
    #[serde(default)]
    pub criteria: Option<String>,
    /// Extra worksheet name hints for workbook sources.
    #[serde(default)]
    pub preferred_sheets: Vec<String>,
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
}

fn default_cache_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: None,
            criteria: None,
            preferred_sheets: Vec::new(),
            cache_enabled: default_cache_enabled(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("seizure-monetizer")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(error = %err, path = %path.display(), "unreadable settings; using defaults");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| MonetizerError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            source: Some("/data/Tabela_Monetizacao.xlsx".to_string()),
            criteria: None,
            preferred_sheets: vec!["Base 2025".to_string()],
            cache_enabled: false,
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.source.is_none());
        assert!(s.criteria.is_none());
        assert!(s.preferred_sheets.is_empty());
        assert!(s.cache_enabled);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"source": "/tmp/apreensoes.csv", "unknown": 1}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.source.as_deref(), Some("/tmp/apreensoes.csv"));
        assert!(s.cache_enabled);
    }

    #[test]
    fn test_shellexpand_keeps_plain_paths() {
        assert_eq!(shellexpand_path("/nonexistent/dados.csv"), "/nonexistent/dados.csv");
    }
}
