use std::env;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::summarizer::DEFAULT_CHUNK_SIZE;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub llm: LlmConfig,
    pub scraper: ScraperConfig,
    pub chunk_size: usize,
}

/// Settings for the OpenAI-compatible completion endpoint.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Fetch-stage knobs. `max_retries` counts total attempts, not extra ones.
#[derive(Clone, Debug, PartialEq)]
pub struct ScraperConfig {
    pub rate_limit: usize,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            rate_limit: 5,
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl ScraperConfig {
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit == 0 {
            return Err(AppError::ConfigError(
                "SCRAPER_RATE_LIMIT must be at least 1".to_string(),
            ));
        }
        if self.max_retries == 0 {
            return Err(AppError::ConfigError(
                "SCRAPER_MAX_RETRIES must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let api_key = required_env("OPENAI_API_KEY")?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let ip = IpAddr::from_str(&host)
            .map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;
        let port: u16 = env_or("PORT", 3000)?;

        let llm = LlmConfig {
            api_key,
            base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 60)?),
        };

        let defaults = ScraperConfig::default();
        let scraper = ScraperConfig {
            rate_limit: env_or("SCRAPER_RATE_LIMIT", defaults.rate_limit)?,
            timeout: Duration::from_secs(env_or(
                "SCRAPER_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )?),
            max_retries: env_or("SCRAPER_MAX_RETRIES", defaults.max_retries)?,
            retry_delay: Duration::from_millis(env_or(
                "SCRAPER_RETRY_DELAY_MS",
                defaults.retry_delay.as_millis() as u64,
            )?),
        };
        scraper.validate()?;

        let chunk_size: usize = env_or("SUMMARY_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(AppError::ConfigError(
                "SUMMARY_CHUNK_SIZE must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            llm,
            scraper,
            chunk_size,
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    env::var(key).map_err(|e| AppError::ConfigError(format!("{}: {}", key, e)))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", key, e)))
}
