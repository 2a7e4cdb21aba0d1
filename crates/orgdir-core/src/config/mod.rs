//! Configuration management with file persistence
//!
//! Settings are read once at process start and handed to constructors
//! explicitly; nothing in the core reads configuration from global state.

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Orgdir configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub server: ServerConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file; falls back to the per-user data location when unset
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Radius of the point filter in degrees (0.001 is roughly 100m)
    pub proximity_degrees: f64,
    pub default_items_per_page: u32,
    pub max_items_per_page: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: None,
            max_connections: 8,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            proximity_degrees: 0.001,
            default_items_per_page: 50,
            max_items_per_page: 100,
        }
    }
}

impl DatabaseSettings {
    /// The configured database path, or the default one
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(crate::storage::database::default_database_path)
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("ORGDIR_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("orgdir")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file (or defaults), then apply environment overrides
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("Invalid configuration TOML")
    }

    /// Apply `ORGDIR_*` overrides using the given variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("ORGDIR_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup("ORGDIR_DB_MAX_CONNECTIONS") {
            self.database.max_connections = value
                .parse()
                .with_context(|| format!("Invalid ORGDIR_DB_MAX_CONNECTIONS value: {}", value))?;
        }
        if let Some(host) = lookup("ORGDIR_HOST") {
            self.server.host = host;
        }
        if let Some(value) = lookup("ORGDIR_PORT") {
            self.server.port = value
                .parse()
                .with_context(|| format!("Invalid ORGDIR_PORT value: {}", value))?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.max_connections == 0 {
            return Err(anyhow!("database.max_connections must be at least 1"));
        }

        let proximity = self.search.proximity_degrees;
        if !proximity.is_finite() || proximity <= 0.0 {
            return Err(anyhow!("search.proximity_degrees must be a positive number"));
        }

        if self.search.default_items_per_page == 0 || self.search.max_items_per_page == 0 {
            return Err(anyhow!("search page sizes must be at least 1"));
        }

        if self.search.default_items_per_page > self.search.max_items_per_page {
            return Err(anyhow!(
                "search.default_items_per_page ({}) exceeds search.max_items_per_page ({})",
                self.search.default_items_per_page,
                self.search.max_items_per_page
            ));
        }

        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "database.path" => Ok(self.database.resolved_path().display().to_string()),
            "database.max_connections" => Ok(self.database.max_connections.to_string()),

            "server.host" => Ok(self.server.host.clone()),
            "server.port" => Ok(self.server.port.to_string()),

            "search.proximity_degrees" => Ok(self.search.proximity_degrees.to_string()),
            "search.default_items_per_page" => Ok(self.search.default_items_per_page.to_string()),
            "search.max_items_per_page" => Ok(self.search.max_items_per_page.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `orgdir config list` to see available keys.",
                key
            )),
        }
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "database.path",
            "database.max_connections",
            "server.host",
            "server.port",
            "search.proximity_degrees",
            "search.default_items_per_page",
            "search.max_items_per_page",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }
}
