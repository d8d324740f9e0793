use learnpath_core::{cache::EvictionPolicy, delivery::DEFAULT_PACING, video::DEFAULT_MAX_RESULTS};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported text-generation providers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
}

impl Provider {
    /// Base URL of the provider's OpenAI-compatible endpoint.
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::OpenAI => "https://api.openai.com/v1/",
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }

    /// Name of the environment variable holding the provider's key.
    pub fn key_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Gemini => "gemini-1.5-flash-latest",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub static_dir: PathBuf,
    pub ytdlp_path: PathBuf,
    pub max_videos_per_lesson: usize,
    pub stream_pacing: Duration,
    pub cache_policy: EvictionPolicy,
    pub cache_single_flight: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of 'gemini', 'openai'", other),
                ));
            }
        };

        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let gemini_api_key = std::env::var("GEMINI_API_KEY").ok();

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| provider.default_model().to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = path_var("PROMPTS_PATH", "./prompts");
        let static_dir = path_var("STATIC_DIR", "./static");
        let ytdlp_path = path_var("YTDLP_PATH", "yt-dlp");

        let max_videos_per_lesson =
            parsed_var::<usize>("MAX_VIDEOS_PER_LESSON")?.unwrap_or(DEFAULT_MAX_RESULTS);
        if max_videos_per_lesson == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_VIDEOS_PER_LESSON".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let stream_pacing = parsed_var::<u64>("STREAM_PACING_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_PACING);

        let cache_policy = EvictionPolicy {
            max_entries: parsed_var::<usize>("CACHE_MAX_ENTRIES")?,
            ttl: parsed_var::<u64>("CACHE_TTL_SECS")?.map(Duration::from_secs),
        };
        let cache_single_flight = parsed_var::<bool>("CACHE_SINGLE_FLIGHT")?.unwrap_or(true);

        let key_present = match provider {
            Provider::OpenAI => openai_api_key.is_some(),
            Provider::Gemini => gemini_api_key.is_some(),
        };
        if !key_present {
            return Err(ConfigError::MissingVar(format!(
                "{} must be set for '{}' provider",
                provider.key_var(),
                provider_str.to_lowercase()
            )));
        }

        Ok(Self {
            bind_address,
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            log_level,
            prompts_path,
            static_dir,
            ytdlp_path,
            max_videos_per_lesson,
            stream_pacing,
            cache_policy,
            cache_single_flight,
        })
    }

    /// The API key of the selected provider.
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
        }
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

/// Reads and parses an optional variable. Unset means `None`.
fn parsed_var<T>(name: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("'{}': {}", raw, e))),
        Err(_) => Ok(None),
    }
}
