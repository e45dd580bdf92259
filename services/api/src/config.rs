use std::net::SocketAddr;
use std::path::PathBuf;
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

/// Defines the supported backends for explanation and quiz generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Groq,
    Gemini,
    /// Deterministic offline tutor, no API key needed.
    Mock,
}

impl Provider {
    /// Base URL of the provider's OpenAI-compatible endpoint.
    pub fn api_base(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("https://api.openai.com/v1/"),
            Provider::Groq => Some("https://api.groq.com/openai/v1"),
            Provider::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/openai"),
            Provider::Mock => None,
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => "gpt-4o",
            Provider::Groq => "llama3-8b-8192",
            Provider::Gemini => "gemini-2.0-flash",
            Provider::Mock => "mock",
        }
    }

    fn key_var(&self) -> Option<&'static str> {
        match self {
            Provider::OpenAI => Some("OPENAI_API_KEY"),
            Provider::Groq => Some("GROQ_API_KEY"),
            Provider::Gemini => Some("GEMINI_API_KEY"),
            Provider::Mock => None,
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub api_key: Option<String>,
    pub chat_model: String,
    pub log_level: Level,
    pub prompts_path: PathBuf,
    pub courses_path: PathBuf,
    pub scores_path: PathBuf,
    pub progress_path: PathBuf,
    /// `None` keeps sessions for the lifetime of the process.
    pub session_ttl: Option<Duration>,
    pub llm_timeout: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "groq".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "openai" => Provider::OpenAI,
            "groq" => Provider::Groq,
            "gemini" => Provider::Gemini,
            "mock" => Provider::Mock,
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{}' is not one of openai, groq, gemini, mock", other),
                ));
            }
        };

        let api_key = match provider.key_var() {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                ConfigError::MissingVar(format!(
                    "{} must be set for '{}' provider",
                    var,
                    provider_str.to_lowercase()
                ))
            })?),
            None => None,
        };

        let chat_model =
            std::env::var("CHAT_MODEL").unwrap_or_else(|_| provider.default_model().to_string());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let session_ttl = match secs_var("SESSION_TTL_SECS", 3600)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let llm_timeout = match secs_var("LLM_TIMEOUT_SECS", 30)? {
            0 => {
                return Err(ConfigError::InvalidValue(
                    "LLM_TIMEOUT_SECS".to_string(),
                    "timeout must be greater than zero".to_string(),
                ));
            }
            secs => Duration::from_secs(secs),
        };

        Ok(Self {
            bind_address,
            provider,
            api_key,
            chat_model,
            log_level,
            prompts_path: path_var("PROMPTS_PATH", "./prompts"),
            courses_path: path_var("COURSES_PATH", "./data/courses.json"),
            scores_path: path_var("SCORES_PATH", "./score.json"),
            progress_path: path_var("PROGRESS_PATH", "./progress.json"),
            session_ttl,
            llm_timeout,
        })
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    std::env::var(name)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn secs_var(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                name.to_string(),
                format!("'{}' is not a whole number of seconds", raw),
            )
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    fn clear_env_vars() {
        unsafe {
            env::remove_var("BIND_ADDRESS");
            env::remove_var("LLM_PROVIDER");
            env::remove_var("OPENAI_API_KEY");
            env::remove_var("GROQ_API_KEY");
            env::remove_var("GEMINI_API_KEY");
            env::remove_var("CHAT_MODEL");
            env::remove_var("RUST_LOG");
            env::remove_var("PROMPTS_PATH");
            env::remove_var("COURSES_PATH");
            env::remove_var("SCORES_PATH");
            env::remove_var("PROGRESS_PATH");
            env::remove_var("SESSION_TTL_SECS");
            env::remove_var("LLM_TIMEOUT_SECS");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    fn test_provider_endpoints() {
        assert_eq!(
            Provider::Groq.api_base(),
            Some("https://api.groq.com/openai/v1")
        );
        assert_eq!(Provider::Mock.api_base(), None);
        assert_eq!(Provider::Mock.key_var(), None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_groq() {
        clear_env_vars();
        unsafe {
            env::set_var("GROQ_API_KEY", "test-groq-key");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.provider, Provider::Groq);
        assert_eq!(config.api_key, Some("test-groq-key".to_string()));
        assert_eq!(config.chat_model, "llama3-8b-8192");
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.prompts_path, PathBuf::from("./prompts"));
        assert_eq!(config.courses_path, PathBuf::from("./data/courses.json"));
        assert_eq!(config.scores_path, PathBuf::from("./score.json"));
        assert_eq!(config.progress_path, PathBuf::from("./progress.json"));
        assert_eq!(config.session_ttl, Some(Duration::from_secs(3600)));
        assert_eq!(config.llm_timeout, Duration::from_secs(30));
    }

    #[test]
    #[serial]
    fn test_config_mock_provider_needs_no_key() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "mock");
            env::set_var("SESSION_TTL_SECS", "0");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.provider, Provider::Mock);
        assert_eq!(config.api_key, None);
        assert_eq!(config.session_ttl, None);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("LLM_PROVIDER", "OpenAI");
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("CHAT_MODEL", "gpt-3.5-turbo");
            env::set_var("RUST_LOG", "debug");
            env::set_var("PROMPTS_PATH", "/custom/prompts");
            env::set_var("COURSES_PATH", "/custom/data.json");
            env::set_var("SCORES_PATH", "/var/lib/tutor/score.json");
            env::set_var("PROGRESS_PATH", "/var/lib/tutor/users.json");
            env::set_var("SESSION_TTL_SECS", "60");
            env::set_var("LLM_TIMEOUT_SECS", "5");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.api_key, Some("custom-openai-key".to_string()));
        assert_eq!(config.chat_model, "gpt-3.5-turbo");
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.prompts_path, PathBuf::from("/custom/prompts"));
        assert_eq!(config.courses_path, PathBuf::from("/custom/data.json"));
        assert_eq!(config.scores_path, PathBuf::from("/var/lib/tutor/score.json"));
        assert_eq!(config.progress_path, PathBuf::from("/var/lib/tutor/users.json"));
        assert_eq!(config.session_ttl, Some(Duration::from_secs(60)));
        assert_eq!(config.llm_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
            env::set_var("GROQ_API_KEY", "test-groq-key");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        unsafe {
            env::set_var("GROQ_API_KEY", "test-groq-key");
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_unknown_provider() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "llamafile");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, msg) => {
                assert_eq!(var, "LLM_PROVIDER");
                assert!(msg.contains("llamafile"));
            }
            _ => panic!("Expected InvalidValue for LLM_PROVIDER"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_provider_key() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "gemini");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("GEMINI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for GEMINI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_durations() {
        clear_env_vars();
        unsafe {
            env::set_var("LLM_PROVIDER", "mock");
            env::set_var("SESSION_TTL_SECS", "an hour");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "SESSION_TTL_SECS"),
            _ => panic!("Expected InvalidValue for SESSION_TTL_SECS"),
        }

        unsafe {
            env::remove_var("SESSION_TTL_SECS");
            env::set_var("LLM_TIMEOUT_SECS", "0");
        }
        match Config::from_env().unwrap_err() {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "LLM_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for LLM_TIMEOUT_SECS"),
        }
    }
}
