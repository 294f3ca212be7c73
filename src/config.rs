//! Configuration management
//!
//! Handles loading and saving shell configuration to
//! ~/.config/sqlsh/config.json

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A single saved connection: a name and its connection URL.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NamedConnection {
    pub name: String,
    pub url: String,
}

/// Lexer feature toggles. Which quoting and comment styles are accepted
/// varies per backend; the shell configures the statement buffer from here.
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
#[serde(default)]
pub struct LexerConfig {
    /// Accept `` ` `` as a quote character.
    pub backtick_quotes: bool,
    /// Accept `$tag$ ... $tag$` dollar quoting.
    pub dollar_quotes: bool,
    /// Accept `/* ... */` block comments.
    pub block_comments: bool,
    /// Accept `//` line comments.
    pub slash_comments: bool,
    /// Accept `#` line comments.
    pub hash_comments: bool,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            backtick_quotes: false,
            dollar_quotes: true,
            block_comments: true,
            slash_comments: false,
            hash_comments: false,
        }
    }
}

/// Application configuration
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
#[serde(default)]
pub struct AppConfig {
    /// List of saved connections
    pub connections: Vec<NamedConnection>,
    /// Name of the last used connection (for auto-connect)
    pub last_connection: Option<String>,
    /// Upper bound for a single metadata query, in milliseconds.
    /// Keeps tab completion responsive against slow backends.
    pub metadata_timeout_ms: Option<u64>,
    /// Echo metadata queries before running them.
    pub echo_queries: bool,
    /// Statement lexer feature toggles.
    pub lexer: LexerConfig,
}

impl AppConfig {
    pub const DEFAULT_METADATA_TIMEOUT_MS: u64 = 3_000;

    /// Get the config file path (~/.config/sqlsh/config.json)
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("sqlsh");

        Ok(config_dir.join("config.json"))
    }

    /// Load configuration from disk, creating empty config if it doesn't exist
    pub fn load() -> Self {
        Self::try_load().unwrap_or_default()
    }

    /// Try to load configuration from disk
    fn try_load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self =
            serde_json::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Add or update a connection (updates if name already exists)
    pub fn add_connection(&mut self, conn: NamedConnection) {
        if let Some(existing) = self.connections.iter_mut().find(|c| c.name == conn.name) {
            *existing = conn;
        } else {
            self.connections.push(conn);
        }
    }

    /// Get a connection URL by name
    pub fn get_connection(&self, name: &str) -> Option<&NamedConnection> {
        self.connections.iter().find(|c| c.name == name)
    }

    /// Metadata query timeout as a `Duration`.
    pub fn metadata_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(
            self.metadata_timeout_ms
                .unwrap_or(Self::DEFAULT_METADATA_TIMEOUT_MS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexer_defaults() {
        let lexer = LexerConfig::default();
        assert!(lexer.dollar_quotes);
        assert!(lexer.block_comments);
        assert!(!lexer.backtick_quotes);
        assert!(!lexer.hash_comments);
    }

    #[test]
    fn add_connection_replaces_by_name() {
        let mut config = AppConfig::default();
        config.add_connection(NamedConnection {
            name: "dev".into(),
            url: "mem:".into(),
        });
        config.add_connection(NamedConnection {
            name: "dev".into(),
            url: "mem:other".into(),
        });
        assert_eq!(config.connections.len(), 1);
        assert_eq!(config.get_connection("dev").unwrap().url, "mem:other");
    }

    #[test]
    fn timeout_defaults_when_unset() {
        let config = AppConfig::default();
        assert_eq!(
            config.metadata_timeout(),
            std::time::Duration::from_millis(AppConfig::DEFAULT_METADATA_TIMEOUT_MS)
        );
    }
}
