use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub const ENV_API_URL: &str = "MOVIEDECK_API_URL";
pub const ENV_APP_TOKEN: &str = "MOVIEDECK_APP_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "MOVIEDECK_TIMEOUT_SECS";
pub const ENV_TOKEN_FILE: &str = "MOVIEDECK_TOKEN_FILE";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOKEN_FILE: &str = ".moviedeck/session.json";

/// Settings for the REST client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub app_token: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub token_file: PathBuf,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(&base_url.into()),
            app_token: app_token.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(5),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }

    pub fn from_env() -> Result<Self> {
        let base_url = env::var(ENV_API_URL).with_context(|| format!("{ENV_API_URL} not set"))?;
        let app_token =
            env::var(ENV_APP_TOKEN).with_context(|| format!("{ENV_APP_TOKEN} not set"))?;
        let mut config = Self::new(base_url, app_token);

        if let Ok(raw) = env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_TIMEOUT_SECS} must be a number of seconds"))?;
            config.timeout = Duration::from_secs(secs.max(1));
        }
        if let Ok(path) = env::var(ENV_TOKEN_FILE) {
            if !path.trim().is_empty() {
                config.token_file = PathBuf::from(path);
            }
        }
        Ok(config)
    }
}

pub fn check_env() -> Result<()> {
    let required = [ENV_API_URL, ENV_APP_TOKEN];
    for key in required {
        if env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true) {
            anyhow::bail!("Missing required environment variable: {}", key);
        }
    }
    info!("All required environment variables are set");
    Ok(())
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let config = ClientConfig::new("https://example.test/api/ ", "app");
        assert_eq!(config.base_url, "https://example.test/api");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
