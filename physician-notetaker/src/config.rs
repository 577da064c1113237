//! Environment configuration.
//!
//! Values come from the process environment, with a `.env` file in the working
//! directory loaded first when present.

use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_OPENROUTER_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";
pub const DEFAULT_MAX_TOKENS: u64 = 2048;
pub const DEFAULT_PORT: u16 = 7860;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Hosted LLM provider reached through rig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Groq,
    OpenRouter,
}

impl Provider {
    pub fn api_key_var(self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Groq => DEFAULT_GROQ_MODEL,
            Provider::OpenRouter => DEFAULT_OPENROUTER_MODEL,
        }
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(Provider::Groq),
            "openrouter" => Ok(Provider::OpenRouter),
            _ => Err(ConfigError::Invalid {
                var: "LLM_PROVIDER",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Groq => f.write_str("groq"),
            Provider::OpenRouter => f.write_str("openrouter"),
        }
    }
}

#[derive(Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
}

// Keeps the API key out of logs.
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub server: ServerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the variables may come from the shell.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup, treating blank values as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get("LLM_PROVIDER") {
            Some(value) => value.parse()?,
            None => Provider::Groq,
        };

        let api_key =
            get(provider.api_key_var()).ok_or(ConfigError::Missing(provider.api_key_var()))?;

        let model = get("LLM_MODEL")
            .or_else(|| match provider {
                Provider::Groq => get("GROQ_MODEL"),
                Provider::OpenRouter => None,
            })
            .unwrap_or_else(|| provider.default_model().to_string());

        let temperature = parse_or(get("LLM_TEMPERATURE"), "LLM_TEMPERATURE", 0.0)?;
        let max_tokens = parse_or(get("LLM_MAX_TOKENS"), "LLM_MAX_TOKENS", DEFAULT_MAX_TOKENS)?;

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            request_timeout: Duration::from_secs(parse_or(
                get("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        };

        Ok(Self {
            llm: LlmConfig {
                provider,
                api_key,
                model,
                temperature,
                max_tokens,
            },
            server,
        })
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}
