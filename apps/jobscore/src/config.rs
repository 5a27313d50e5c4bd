use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::llm_client::DEFAULT_GEMINI_MODEL;

/// Which remote service answers a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Endpoint,
    Gemini,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "endpoint" => Ok(Backend::Endpoint),
            "gemini" => Ok(Backend::Gemini),
            other => bail!("Unknown backend '{other}' (expected 'endpoint' or 'gemini')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Remote credentials are optional here and checked when a command needs them.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Option<Url>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub scorer: Backend,
    pub parser: Backend,
    pub store_path: PathBuf,
    pub wait_timeout: Duration,
    pub http_timeout: Duration,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let endpoint = optional_env("JOBSCORE_ENDPOINT")
            .map(|raw| Url::parse(&raw).context("JOBSCORE_ENDPOINT must be a valid URL"))
            .transpose()?;

        Ok(Config {
            endpoint,
            gemini_api_key: optional_env("GEMINI_API_KEY"),
            gemini_model: optional_env("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            scorer: parse_env("JOBSCORE_SCORER", Backend::Endpoint)?,
            parser: parse_env("JOBSCORE_PARSER", Backend::Endpoint)?,
            store_path: match optional_env("JOBSCORE_STORE") {
                Some(path) => PathBuf::from(path),
                None => default_store_path()?,
            },
            wait_timeout: Duration::from_millis(parse_env("JOBSCORE_WAIT_TIMEOUT_MS", 5000)?),
            http_timeout: Duration::from_secs(parse_env("JOBSCORE_HTTP_TIMEOUT_SECS", 120)?),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn require_endpoint(&self) -> Result<Url> {
        self.endpoint
            .clone()
            .context("Required environment variable 'JOBSCORE_ENDPOINT' is not set")
    }

    pub fn require_gemini_key(&self) -> Result<String> {
        self.gemini_api_key
            .clone()
            .context("Required environment variable 'GEMINI_API_KEY' is not set")
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key} is invalid: {e}")),
        None => Ok(default),
    }
}

fn default_store_path() -> Result<PathBuf> {
    let base = dirs::data_dir().context("Could not determine a data directory; set JOBSCORE_STORE")?;
    Ok(base.join("jobscore").join("storage.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("endpoint".parse::<Backend>().unwrap(), Backend::Endpoint);
        assert_eq!(" Gemini ".parse::<Backend>().unwrap(), Backend::Gemini);
        assert!("openai".parse::<Backend>().is_err());
    }

    #[test]
    fn test_missing_credentials_are_reported_on_use() {
        let config = Config {
            endpoint: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            scorer: Backend::Endpoint,
            parser: Backend::Endpoint,
            store_path: PathBuf::from("storage.json"),
            wait_timeout: Duration::from_millis(5000),
            http_timeout: Duration::from_secs(120),
            rust_log: "info".to_string(),
        };
        let err = config.require_endpoint().unwrap_err();
        assert!(err.to_string().contains("JOBSCORE_ENDPOINT"));
        assert!(config.require_gemini_key().is_err());
    }
}
