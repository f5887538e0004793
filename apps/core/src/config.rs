use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routing::{RoutingError, RoutingTable, DEFAULT_FALLBACK_ROUTE, DEFAULT_ROUTES};
use crate::suggestions::DEFAULT_MAX_SUGGESTIONS;

pub const CONFIG_FILE_NAME: &str = "config.toml";

pub const DEFAULT_PARTITIONS: [&str; 23] = [
    "annual_herbs",
    "biennial_herbs",
    "culinary_herbs",
    "deciduous_shrubs",
    "deciduous_trees",
    "evergreen_shrubs",
    "evergreen_trees",
    "flowering_climbers",
    "flowering_shrubs",
    "foliage_shrubs",
    "fruit_trees",
    "ground-cover_Creepers",
    "hook_climbers",
    "medicinal_creepers",
    "medicinal_herbs",
    "medicinal_shrubs",
    "ornamental_trees",
    "perennial_herbs",
    "root_climbers",
    "tendril_climbers",
    "timber_trees",
    "twining_climbers",
    "vegetable_creepers",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("serialize error: {0}")]
    Serialize(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error(transparent)]
    Routing(#[from] RoutingError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub partitions: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub base_url: Option<String>,
    pub debounce_ms: u64,
    pub max_suggestions: u16,
    pub fallback_route: String,
    pub log_path: Option<PathBuf>,
    pub routes: BTreeMap<String, String>,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            partitions: DEFAULT_PARTITIONS.iter().map(|p| p.to_string()).collect(),
            data_dir: None,
            base_url: None,
            debounce_ms: 120,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS as u16,
            fallback_route: DEFAULT_FALLBACK_ROUTE.to_string(),
            log_path: None,
            routes: DEFAULT_ROUTES
                .iter()
                .map(|(partition, route)| (partition.to_string(), route.to_string()))
                .collect(),
            config_path: stable_app_data_dir().join(CONFIG_FILE_NAME),
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn routing_table(&self) -> RoutingTable {
        RoutingTable::from_pairs(self.routes.clone(), &self.fallback_route)
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    std::env::temp_dir().join("plantfind")
}

/// Reads the config at `path` (or the default location). A missing file
/// yields the defaults. `.json`/`.json5` files are parsed as JSON5, anything
/// else as TOML.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| stable_app_data_dir().join(CONFIG_FILE_NAME));

    if !config_path.exists() {
        return Ok(Config {
            config_path,
            ..Config::default()
        });
    }

    let raw = std::fs::read_to_string(&config_path)?;
    let mut config = parse(&raw, &config_path)?;
    config.config_path = config_path;
    Ok(config)
}

fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("json5"))
        .unwrap_or(false);

    let parsed = if is_json {
        json5::from_str::<Config>(raw).map_err(|error| error.to_string())
    } else {
        toml::from_str::<Config>(raw).map_err(|error| error.to_string())
    };

    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn save(config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = config.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let encoded =
        toml::to_string_pretty(config).map_err(|error| ConfigError::Serialize(error.to_string()))?;
    std::fs::write(&config.config_path, encoded)?;
    Ok(())
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.max_suggestions < 1 || cfg.max_suggestions > 50 {
        return Err(ConfigError::Invalid("max_suggestions out of range".into()));
    }

    if cfg.debounce_ms > 2_000 {
        return Err(ConfigError::Invalid("debounce_ms out of range".into()));
    }

    if cfg.partitions.is_empty() {
        return Err(ConfigError::Invalid("at least one partition is required".into()));
    }

    if cfg.fallback_route.trim().is_empty() {
        return Err(ConfigError::Invalid("fallback_route is required".into()));
    }

    cfg.routing_table().validate(&cfg.partitions)?;
    Ok(())
}
