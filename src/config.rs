//! Server configuration.
//!
//! Values come from an optional YAML file (named by `LANTERN_CONFIG`) with a
//! handful of environment overrides layered on top.

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Token that binds the listener to every local interface.
pub const ANY_ADDRESS: &str = "ANY";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// `"ANY"` or a dotted IPv4 literal.
    pub listen_addr: String,
    pub port: u16,
    pub max_connections: usize,
    /// Capacity of each connection's receive buffer.
    pub max_packet_size: usize,
    pub keep_alive_timeout_secs: u64,
    pub keep_alive_max: u32,
    pub poll_interval_ms: u64,
    /// How long shutdown waits for a connection worker before aborting it.
    pub drain_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    pub max_file_size: u64,
    /// Upper bound on the table text of a generated directory listing.
    pub listing_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: ANY_ADDRESS.to_string(),
            port: 8080,
            max_connections: 64,
            max_packet_size: 4096,
            keep_alive_timeout_secs: 5,
            keep_alive_max: 100,
            poll_interval_ms: 1,
            drain_timeout_ms: 2000,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_file_size: 1024 * 1024,
            listing_capacity: 16 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn keep_alive_timeout(&self) -> Duration {
        Duration::from_secs(self.keep_alive_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`.
    pub fn load_from<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup("LANTERN_CONFIG") {
            Some(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {}", path))?;
                Self::from_yaml_str(&text)
                    .with_context(|| format!("invalid config file {}", path))?
            }
            None => Self::default(),
        };

        if let Some(addr) = lookup("LISTEN") {
            cfg.server.listen_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            cfg.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", port))?;
        }
        if let Some(root) = lookup("ROOT") {
            cfg.static_files.root = PathBuf::from(root);
        }
        if let Some(max) = lookup("MAX_CONNECTIONS") {
            cfg.server.max_connections = max
                .parse()
                .with_context(|| format!("MAX_CONNECTIONS is not a number: {}", max))?;
        }

        Ok(cfg)
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        let cfg = serde_yaml::from_str(text)?;
        Ok(cfg)
    }
}

/// Parsed form of the `listen_addr` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAddress(pub Ipv4Addr);

impl BindAddress {
    /// Parses `"ANY"` (wildcard) or a dotted IPv4 literal.
    ///
    /// ```
    /// # use lantern::config::BindAddress;
    /// # use std::net::Ipv4Addr;
    /// assert_eq!(BindAddress::parse("ANY"), Some(BindAddress(Ipv4Addr::UNSPECIFIED)));
    /// assert_eq!(BindAddress::parse("localhost"), None);
    /// ```
    pub fn parse(token: &str) -> Option<Self> {
        if token == ANY_ADDRESS {
            return Some(BindAddress(Ipv4Addr::UNSPECIFIED));
        }
        token.parse().ok().map(BindAddress)
    }
}
