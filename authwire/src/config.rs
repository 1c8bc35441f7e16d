use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use thiserror::Error;

/// Base URL used by the client when neither `--api-url` nor `API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const API_URL_ENV: &str = "API_URL";
pub const UPSTREAM_ENV: &str = "AUTHWIRE_UPSTREAM";

#[derive(Debug, Parser)]
#[command(
    name = "authwire",
    version,
    about = "Bearer-token API client and signup/signin route table"
)]
pub struct Cli {
    /// Credential store file holding the bearer token.
    #[arg(long, global = true, value_name = "FILE")]
    pub token_file: Option<PathBuf>,

    /// API base URL; overrides the `API_URL` environment variable.
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the auth routes under `/api`.
    Serve(ServeArgs),
    /// Manage the stored bearer token.
    #[command(subcommand)]
    Token(TokenCommand),
    /// Issue a GET request through the API client.
    Get { path: String },
    /// Issue a POST request with a JSON body through the API client.
    Post {
        path: String,
        #[arg(long, short = 'd', value_name = "JSON")]
        data: Option<String>,
    },
    /// Issue a DELETE request through the API client.
    Delete { path: String },
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    Set { token: String },
    Clear,
    Show,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Base URL of the auth controller that handles signup and signin.
    #[arg(long, value_name = "URL")]
    pub upstream: Option<String>,

    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub upstream: Option<String>,
    pub rate_limit_replenish_ms: u64,
    pub rate_limit_burst: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: String,
    pub token_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    bind: Option<SocketAddr>,
    upstream: Option<String>,
    rate_limit_replenish_ms: Option<u64>,
    rate_limit_burst: Option<u32>,
}

impl ServerConfig {
    pub fn from_args(args: ServeArgs) -> Result<Self, ConfigError> {
        let from_file = read_file_config(args.config.as_deref())?;

        let bind = args
            .bind
            .or(from_file.bind)
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 5000)));
        let upstream = non_empty(args.upstream)
            .or_else(|| non_empty(from_file.upstream))
            .or_else(|| non_empty(std::env::var(UPSTREAM_ENV).ok()));
        let rate_limit_replenish_ms = from_file.rate_limit_replenish_ms.unwrap_or(50).max(1);
        let rate_limit_burst = from_file.rate_limit_burst.unwrap_or(50).max(1);

        Ok(Self {
            bind,
            upstream,
            rate_limit_replenish_ms,
            rate_limit_burst,
        })
    }
}

impl ClientConfig {
    pub fn from_cli(api_url: Option<String>, token_file: Option<PathBuf>) -> Self {
        let api_url =
            non_empty(api_url).unwrap_or_else(|| resolve_api_url(std::env::var(API_URL_ENV).ok()));
        let token_file =
            token_file.unwrap_or_else(|| PathBuf::from(".authwire").join("credentials.toml"));
        Self {
            api_url,
            token_file,
        }
    }
}

/// Empty and whitespace-only values count as unset.
pub fn resolve_api_url(env_value: Option<String>) -> String {
    non_empty(env_value).unwrap_or_else(|| String::from(DEFAULT_API_URL))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn read_file_config(path: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::{resolve_api_url, ClientConfig, ServeArgs, ServerConfig, DEFAULT_API_URL};

    #[test]
    fn api_url_defaults_to_localhost() {
        assert_eq!(resolve_api_url(None), DEFAULT_API_URL);
        assert_eq!(resolve_api_url(None), "http://localhost:5000/api");
    }

    #[test]
    fn api_url_treats_blank_env_as_unset() {
        assert_eq!(resolve_api_url(Some(String::new())), DEFAULT_API_URL);
        assert_eq!(resolve_api_url(Some(String::from("   "))), DEFAULT_API_URL);
    }

    #[test]
    fn api_url_uses_env_override() {
        assert_eq!(
            resolve_api_url(Some(String::from("https://api.example.com/v1"))),
            "https://api.example.com/v1"
        );
    }

    #[test]
    fn client_config_prefers_cli_override() {
        let config = ClientConfig::from_cli(
            Some(String::from("http://127.0.0.1:9000/api")),
            Some("creds.toml".into()),
        );
        assert_eq!(config.api_url, "http://127.0.0.1:9000/api");
        assert_eq!(config.token_file, std::path::PathBuf::from("creds.toml"));
    }

    #[test]
    fn server_config_reads_file_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("authwire.toml");
        std::fs::write(
            &path,
            "bind = \"127.0.0.1:7000\"\nupstream = \"http://auth.internal\"\nrate_limit_burst = 5\n",
        )?;

        let config = ServerConfig::from_args(ServeArgs {
            bind: None,
            upstream: None,
            config: Some(path),
        })?;

        assert_eq!(config.bind.to_string(), "127.0.0.1:7000");
        assert_eq!(config.upstream.as_deref(), Some("http://auth.internal"));
        assert_eq!(config.rate_limit_replenish_ms, 50);
        assert_eq!(config.rate_limit_burst, 5);
        Ok(())
    }

    #[test]
    fn server_config_cli_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("authwire.toml");
        std::fs::write(&path, "bind = \"127.0.0.1:7000\"\nupstream = \"http://a\"\n")?;

        let config = ServerConfig::from_args(ServeArgs {
            bind: Some("127.0.0.1:7001".parse()?),
            upstream: Some(String::from("http://b")),
            config: Some(path),
        })?;

        assert_eq!(config.bind.to_string(), "127.0.0.1:7001");
        assert_eq!(config.upstream.as_deref(), Some("http://b"));
        Ok(())
    }

    #[test]
    fn server_config_rejects_invalid_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("authwire.toml");
        std::fs::write(&path, "bind = 12").unwrap();

        let result = ServerConfig::from_args(ServeArgs {
            bind: None,
            upstream: None,
            config: Some(path),
        });
        assert!(result.is_err());
    }
}
