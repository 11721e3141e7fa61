//! Settings of the `tener` binary.
//!
//! Sources are layered: the optional TOML file (`config/tener.toml` unless
//! `--config` points elsewhere), then `TENER__SECTION__KEY` environment
//! variables, then the CLI overrides.
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use ledger::{Clock, StoreOptions, store};
use migration::DEFAULT_DATABASE_URL;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "config/tener.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    /// IANA timezone driving "today" and creation timestamps.
    pub timezone: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            timezone: "Europe/Warsaw".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Sqlite,
    /// In-process store; nothing survives the invocation.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub backend: Backend,
    pub database_url: String,
    pub page_size: u64,
    pub timeout_ms: u64,
    pub month_limit: usize,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            backend: Backend::Sqlite,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            page_size: store::DEFAULT_PAGE_SIZE,
            timeout_ms: store::DEFAULT_TIMEOUT.as_millis() as u64,
            month_limit: store::DEFAULT_MONTH_LIMIT,
        }
    }
}

impl Storage {
    pub fn options(&self, clock: Clock) -> StoreOptions {
        StoreOptions {
            clock,
            timeout: Duration::from_millis(self.timeout_ms),
            page_size: self.page_size,
            month_limit: self.month_limit,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub storage: Storage,
}

/// Values given on the command line, applied last.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub config: Option<&'a str>,
    pub database_url: Option<&'a str>,
    pub level: Option<&'a str>,
}

impl Settings {
    pub fn load(overrides: Overrides<'_>) -> Result<Self, ConfigError> {
        let config_path = overrides.config.unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("TENER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(url) = overrides.database_url {
            settings.storage.database_url = url.to_string();
        }
        if let Some(level) = overrides.level {
            settings.app.level = level.to_string();
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_sources() {
        let settings = Settings::load(Overrides {
            config: Some("config/does-not-exist"),
            ..Overrides::default()
        })
        .unwrap();
        assert_eq!(settings.storage.page_size, 100);
        assert_eq!(settings.storage.month_limit, 1000);
        assert_eq!(settings.app.timezone, "Europe/Warsaw");
        assert_eq!(settings.storage.database_url, migration::DEFAULT_DATABASE_URL);
    }

    #[test]
    fn cli_overrides_win() {
        let settings = Settings::load(Overrides {
            config: Some("config/does-not-exist"),
            database_url: Some("sqlite::memory:"),
            level: Some("debug"),
        })
        .unwrap();
        assert_eq!(settings.storage.database_url, "sqlite::memory:");
        assert_eq!(settings.app.level, "debug");
    }

    #[test]
    fn storage_options_carry_the_timeout() {
        let storage = Storage {
            timeout_ms: 250,
            ..Storage::default()
        };
        let options = storage.options(Clock::default());
        assert_eq!(options.timeout, Duration::from_millis(250));
        assert_eq!(options.page_size, 100);
    }
}
