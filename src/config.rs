use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Method, Url};

use crate::auth::DEFAULT_REFRESH_PATH;

/// bearer-fetch - decode tokens and call APIs with automatic token refresh
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Base URL that relative addresses and the refresh path resolve against
    #[arg(short = 'b', long, env = "API_BASE_URL", default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Refresh endpoint path
    #[arg(long, env = "REFRESH_PATH", default_value = DEFAULT_REFRESH_PATH)]
    pub refresh_path: String,

    /// Access token to start with
    #[arg(long, env = "ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Refresh token to start with
    #[arg(long, env = "REFRESH_TOKEN")]
    pub refresh_token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// HTTP connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30")]
    pub connect_timeout: u64,

    /// HTTP request timeout in seconds
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT", default_value = "300")]
    pub request_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Print a token's payload without verifying its signature
    Decode { token: String },

    /// Send a request with the bearer token, refreshing it once on 401/403
    Request {
        /// Absolute URL or path relative to the base URL
        address: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Request body
        #[arg(short = 'd', long)]
        data: Option<String>,

        /// Extra header as "Name: value" (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Do not refresh and retry on 401/403
        #[arg(long)]
        no_retry: bool,
    },
}

#[derive(Clone, Debug)]
pub struct Config {
    // Endpoints
    pub base_url: Url,
    pub refresh_path: String,

    // Initial credentials
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,

    // HTTP client
    pub http_connect_timeout: u64,
    pub http_request_timeout: u64,

    pub log_level: String,
    pub command: Command,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_args(CliArgs::parse())
    }

    /// Build a validated configuration from parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let base_url = Url::parse(&args.base_url)
            .with_context(|| format!("API_BASE_URL is not a valid URL: {}", args.base_url))?;

        let config = Config {
            base_url,
            refresh_path: args.refresh_path,
            access_token: args.access_token.filter(|t| !t.is_empty()),
            refresh_token: args.refresh_token.filter(|t| !t.is_empty()),
            http_connect_timeout: args.connect_timeout,
            http_request_timeout: args.request_timeout,
            log_level: args.log_level,
            command: args.command,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.cannot_be_a_base() {
            anyhow::bail!("API_BASE_URL cannot be used as a base: {}", self.base_url);
        }

        if self.refresh_path.trim().is_empty() {
            anyhow::bail!("REFRESH_PATH must not be empty");
        }

        if self.http_connect_timeout == 0 || self.http_request_timeout == 0 {
            anyhow::bail!("HTTP timeouts must be greater than zero");
        }

        Ok(())
    }
}

/// Parse an HTTP method name, case-insensitively
pub fn parse_method(s: &str) -> Result<Method> {
    Method::from_bytes(s.to_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method: {}", s))
}

/// Parse a "Name: value" header line
pub fn parse_header_line(s: &str) -> Result<(String, String)> {
    let (name, value) = s
        .split_once(':')
        .with_context(|| format!("Header must look like 'Name: value': {}", s))?;

    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Header name is empty: {}", s);
    }

    Ok((name.to_string(), value.trim().to_string()))
}
