//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use promoter_core::Author;
use promoter_engine::DEFAULT_STATUS_CONCURRENCY;

const DEFAULT_REPO_LOCATION: &str = "/tmp/repo";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_AUTHOR_NAME: &str = "promoter";
const DEFAULT_AUTHOR_EMAIL: &str = "promoter@localhost";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Where the managed checkout lives.
    pub repo_location: PathBuf,
    /// Clone URL, required only when no checkout exists yet.
    pub repo_url: Option<String>,
    pub listen_addr: SocketAddr,
    pub github_token: Option<String>,
    /// Identity used for commits when the checkout has none configured.
    pub author: Author,
    /// Background refresh period, `None` when disabled.
    pub refresh_interval: Option<Duration>,
    pub status_concurrency: usize,
    pub log_json: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = parse_listen_addr(&listen).ok_or_else(|| ConfigError::Invalid {
            key: "LISTEN_ADDR",
            value: listen.clone(),
        })?;

        let refresh_secs: u64 = parse_or("REFRESH_INTERVAL_SECS", get("REFRESH_INTERVAL_SECS"), 0)?;
        let status_concurrency = parse_or(
            "STATUS_CONCURRENCY",
            get("STATUS_CONCURRENCY"),
            DEFAULT_STATUS_CONCURRENCY,
        )?;

        Ok(Self {
            repo_location: get("REPO_DISK_LOCATION")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPO_LOCATION)),
            repo_url: get("REPO_URL"),
            listen_addr,
            github_token: get("GITHUB_TOKEN"),
            author: Author {
                name: get("GIT_AUTHOR_NAME").unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
                email: get("GIT_AUTHOR_EMAIL")
                    .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string()),
            },
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            status_concurrency,
            log_json: get("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }
}

/// Accepts `host:port` and the bare `:port` form.
fn parse_listen_addr(value: &str) -> Option<SocketAddr> {
    let value = value.trim();
    match value.strip_prefix(':') {
        Some(port) => port.parse::<u16>().ok().map(|p| SocketAddr::from(([0, 0, 0, 0], p))),
        None => value.parse().ok(),
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
