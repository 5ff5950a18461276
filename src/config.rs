use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub url_expiry_secs: u64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Admin backend for S3-compatible bucket file management")]
pub struct Args {
    /// Host to bind to (overrides STORAGE_ADMIN_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides STORAGE_ADMIN_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Default presigned-URL expiry in seconds (overrides STORAGE_ADMIN_URL_EXPIRY)
    #[arg(long)]
    pub url_expiry: Option<u64>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("STORAGE_ADMIN_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("STORAGE_ADMIN_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing STORAGE_ADMIN_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading STORAGE_ADMIN_PORT"),
        };
        let env_expiry = match env::var("STORAGE_ADMIN_URL_EXPIRY") {
            Ok(value) => value
                .parse::<u64>()
                .with_context(|| format!("parsing STORAGE_ADMIN_URL_EXPIRY value `{}`", value))?,
            Err(env::VarError::NotPresent) => 900,
            Err(err) => return Err(err).context("reading STORAGE_ADMIN_URL_EXPIRY"),
        };

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            url_expiry_secs: args.url_expiry.unwrap_or(env_expiry),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
