use anyhow::{Context, Result};
use chrono_tz::Tz;
use fs_err::read_to_string;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "departures.toml";

/// Settings shared by the loader, the refresh logic and the CLI.
///
/// Read from `<config_dir>/departures.toml`. Every field has a default so an
/// absent file, or a file that sets only a few keys, is fine.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub cache_path: PathBuf,
    pub refresh_interval_secs: i64,
    pub max_age_secs: i64,
    pub timezone: String,
    pub fetcher: FetcherConfig,
    pub schema: SchemaKeys,
    pub labels: DirectionLabels,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_path: PathBuf::from("departures.json"),
            refresh_interval_secs: 60,
            max_age_secs: 300,
            timezone: "Europe/Vienna".to_string(),
            fetcher: FetcherConfig::default(),
            schema: SchemaKeys::default(),
            labels: DirectionLabels::default(),
        }
    }
}

/// The external program that rewrites the cache file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetcherConfig {
    pub program: String,
    pub args: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig {
            program: "node".to_string(),
            args: vec!["fetch_departures.js".to_string()],
            timeout_secs: 30,
        }
    }
}

/// Top level keys of the cache document.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchemaKeys {
    /// Single-direction list written by older fetchers
    pub legacy_key: String,
    pub outbound_key: String,
    pub inbound_key: String,
    pub last_updated_key: String,
    pub stations_key: String,
}

impl Default for SchemaKeys {
    fn default() -> Self {
        SchemaKeys {
            legacy_key: "journey".to_string(),
            outbound_key: "badVoeslauToWien".to_string(),
            inbound_key: "wienToBadVoeslau".to_string(),
            last_updated_key: "lastUpdated".to_string(),
            stations_key: "stations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectionLabels {
    pub outbound: String,
    pub inbound: String,
}

impl Default for DirectionLabels {
    fn default() -> Self {
        DirectionLabels {
            outbound: "Bad Vöslau → Wien Hbf".to_string(),
            inbound: "Wien Hbf → Bad Vöslau".to_string(),
        }
    }
}

impl Config {
    /// Loads the config file from `config_dir`, falling back to defaults when
    /// the file does not exist.
    pub fn load(config_dir: &Path) -> Result<Self> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Config::default());
        }
        let file = read_to_string(&path)?;
        let config: Config = toml::from_str(&file)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.timezone()?;
        Ok(config)
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|err| anyhow::anyhow!("Invalid timezone {:?}: {}", self.timezone, err))
    }
}
