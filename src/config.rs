use anyhow::{bail, Context, Result};
use dataset_query_core::{Catalog, Category};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding `[data].root`.
pub const DATA_ROOT_ENV: &str = "DSQ_DATA_ROOT";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Replaces the built-in catalog when non-empty.
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            include_globs: default_include_globs(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.json".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default)]
    pub storage: Option<String>,
    pub keywords: Vec<String>,
}

impl Config {
    /// Built-in defaults, used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            data: DataConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            categories: Vec::new(),
        }
    }

    /// Builds the category catalog: the configured table, or the built-in one.
    pub fn catalog(&self) -> Result<Catalog> {
        if self.categories.is_empty() {
            return Ok(Catalog::builtin()?);
        }
        let categories = self
            .categories
            .iter()
            .map(|c| Category::new(c.name.clone(), c.storage.clone(), &c.keywords))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Catalog::new(categories)?)
    }

    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var(DATA_ROOT_ENV) {
            if !root.trim().is_empty() {
                self.data.root = PathBuf::from(root);
            }
        }
    }
}

/// Loads and validates the config file.
///
/// A missing file is not an error: defaults are used. `DSQ_DATA_ROOT`
/// overrides `[data].root` in both cases.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content).with_context(|| "Failed to parse config file")?
    } else {
        Config::minimal()
    };

    config.apply_env();
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.server.bind.trim().is_empty() {
        bail!("server.bind must not be empty");
    }

    if config.data.include_globs.is_empty() {
        bail!("data.include_globs must list at least one pattern");
    }
    for pattern in &config.data.include_globs {
        Glob::new(pattern).with_context(|| format!("Invalid glob in data.include_globs: {}", pattern))?;
    }

    for category in &config.categories {
        if category.name.trim().is_empty() {
            bail!("categories.name must not be empty");
        }
        if category.keywords.iter().all(|k| k.trim().is_empty()) {
            bail!("category '{}' must list at least one keyword", category.name);
        }
    }

    config
        .catalog()
        .with_context(|| "Invalid [[categories]] table")?;

    Ok(())
}
