use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub http: HTTPConfig,
}
impl AppConfig {
    /// Loads the TOML config, then applies environment overrides. An
    /// explicitly given path must exist; the default `config.toml` is
    /// optional since the relay can run entirely from defaults + env.
    pub fn load(config_filepath: Option<PathBuf>) -> Result<Self> {
        let mut config = match config_filepath {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = PathBuf::from("config.toml");
                if default_path.is_file() {
                    Self::from_file(&default_path)?
                } else {
                    AppConfig::default()
                }
            }
        };

        config.upstream.apply_env_overrides()?;
        config.upstream.base_url = normalize_base_url(&config.upstream.base_url);
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {path:?}"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-call timeout; exceeding it is treated as any other network failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}
impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
impl UpstreamConfig {
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(base_url) = std::env::var("BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("HTTP_TIMEOUT") {
            self.timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid HTTP_TIMEOUT value: {timeout}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HTTPConfig {
    #[serde(default = "default_http_address")]
    pub address: SocketAddr,
}
impl Default for HTTPConfig {
    fn default() -> Self {
        Self {
            address: default_http_address(),
        }
    }
}

/// Upstream traffic always goes over TLS, whatever scheme the operator
/// wrote. Trailing slashes are trimmed so URL building can stay dumb.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let host = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    format!("https://{host}")
}

fn default_base_url() -> String {
    "https://chatapi.efixtelecom.com.br".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_http_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 3000)
}
