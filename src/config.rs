use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_COMPLETIONS_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";
pub const DEFAULT_MAX_TOKENS: u32 = 64_000;
pub const DEFAULT_SEARCH_URL: &str = "https://google.serper.dev";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::UnknownLogFormat(s.to_string())),
        }
    }
}

/// Process-wide settings, read once at startup and shared read-only.
///
/// API keys are not validated here: a missing key only shows up later as an
/// authentication failure from the provider.
#[derive(Clone)]
pub struct Config {
    pub completions_api_key: String,
    pub completions_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub search_api_key: String,
    pub search_base_url: String,
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(v) if !v.trim().is_empty() => v.trim().parse()?,
            _ => LogFormat::default(),
        };

        Ok(Self {
            completions_api_key: lookup("OPENROUTER_API_KEY").unwrap_or_default(),
            completions_base_url: trim_slash(var("OPENROUTER_BASE_URL", DEFAULT_COMPLETIONS_URL)),
            model: var("OPENROUTER_MODEL", DEFAULT_MODEL),
            max_tokens: parse_number("MAX_TOKENS", lookup("MAX_TOKENS"), DEFAULT_MAX_TOKENS)?,
            search_api_key: lookup("SERPER_API_KEY").unwrap_or_default(),
            search_base_url: trim_slash(var("SERPER_BASE_URL", DEFAULT_SEARCH_URL)),
            host: var("HOST", "0.0.0.0"),
            port: parse_number("PORT", lookup("PORT"), 8000)?,
            log_format,
        })
    }

    /// Names of the secrets that are not set.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.completions_api_key.is_empty() {
            missing.push("OPENROUTER_API_KEY");
        }
        if self.search_api_key.is_empty() {
            missing.push("SERPER_API_KEY");
        }
        missing
    }
}

// Keys stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("completions_base_url", &self.completions_base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("search_base_url", &self.search_base_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_format", &self.log_format)
            .finish_non_exhaustive()
    }
}

fn trim_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

fn parse_number<T: FromStr>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: v }),
        _ => Ok(default),
    }
}
