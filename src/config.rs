use crate::core::{Result, RowkeepError};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Top-level configuration structure parsed from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: ConnectionConfig,
}

/// Database driver named in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Sqlite,
    Mysql,
    Pgsql,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::Mysql => "mysql",
            Driver::Pgsql => "pgsql",
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings, consumed once when a `Connection` is built.
///
/// `options` are driver specific. For SQLite each entry is applied as
/// `PRAGMA name = value` right after the file is opened, in file order.
#[derive(Clone, Deserialize)]
pub struct ConnectionConfig {
    pub driver: Driver,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub charset: Option<String>,
    #[serde(default)]
    pub options: IndexMap<String, String>,
}

impl ConnectionConfig {
    /// SQLite configuration for a database file (or `":memory:"`).
    pub fn sqlite(database: impl Into<String>) -> Self {
        ConnectionConfig {
            driver: Driver::Sqlite,
            host: None,
            port: None,
            database: database.into(),
            username: None,
            password: None,
            charset: None,
            options: IndexMap::new(),
        }
    }

    /// Private in-memory SQLite database.
    pub fn in_memory() -> Self {
        Self::sqlite(":memory:")
    }

    /// Adds a driver option.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Renders the driver connection string.
    ///
    /// Network drivers use `driver:host=H;port=P;dbname=D;charset=C`, skipping
    /// parts that are not configured. SQLite uses `sqlite:<path>`.
    pub fn dsn(&self) -> String {
        if self.driver == Driver::Sqlite {
            return format!("sqlite:{}", self.database);
        }

        let mut parts = Vec::new();
        if let Some(host) = &self.host {
            parts.push(format!("host={}", host));
        }
        if let Some(port) = self.port {
            parts.push(format!("port={}", port));
        }
        parts.push(format!("dbname={}", self.database));
        if let Some(charset) = &self.charset {
            parts.push(format!("charset={}", charset));
        }

        format!("{}:{}", self.driver, parts.join(";"))
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("charset", &self.charset)
            .field("options", &self.options)
            .finish()
    }
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).map_err(|e| RowkeepError::Config(e.to_string()))
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = rowkeep::config::load_config("rowkeep.toml").expect("Failed to load config");
/// println!("{}", config.database.dsn());
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
