use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Records per bulk read when assembling the full dataset.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_page_size() -> usize {
    crate::search::PAGE_SIZE
}
fn default_chunk_size() -> usize {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// When set, `POST /cache/revalidate` requires a matching
    /// `x-revalidate-secret` header.
    #[serde(default)]
    pub revalidate_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ImportConfig {
    /// Default input file for `chara import`.
    pub path: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.search.page_size == 0 {
        anyhow::bail!("search.page_size must be >= 1");
    }
    if config.search.chunk_size == 0 {
        anyhow::bail!("search.chunk_size must be >= 1");
    }
    if config.server.bind.trim().is_empty() {
        anyhow::bail!("server.bind must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[db]
path = "./data/chara.sqlite"

[server]
bind = "127.0.0.1:7341"
"#;

    #[test]
    fn test_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        validate(&config).unwrap();
        assert_eq!(config.search.page_size, 50);
        assert_eq!(config.search.chunk_size, 300);
        assert!(config.server.revalidate_secret.is_none());
        assert!(config.import.path.is_none());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let text = format!("{}\n[search]\npage_size = 0\n", MINIMAL);
        let config: Config = toml::from_str(&text).unwrap();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("search.page_size"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_config(Path::new("/nonexistent/chara.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/chara.toml"));
    }
}
