use anyhow::{Context, Result};

/// Deployment environment; controls log verbosity and whether planning
/// endpoints require authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
    Debug,
}

impl Environment {
    fn from_env_var(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "production" => Self::Production,
            "debug" => Self::Debug,
            _ => Self::Development,
        }
    }

    /// Default tracing filter directive for this environment.
    pub fn default_log_level(self) -> &'static str {
        match self {
            Self::Production => "info",
            Self::Development | Self::Debug => "debug",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub google_maps_api_key: String,
    pub redis_url: String,
    pub environment: Environment,
    pub port: u16,
    pub admin_token: Option<String>,
    pub redis_stream_name: String,
    /// Comma-separated detail fields for place enrichment; unset keeps the
    /// full supported set.
    pub maps_detail_fields: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let environment = Environment::from_env_var(
            &std::env::var("ENVIRONMENT").unwrap_or_default(),
        );

        Ok(Config {
            google_maps_api_key: require_env("GOOGLE_MAPS_API_KEY")?,
            redis_url: require_env("REDIS_URL")?,
            environment,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            admin_token: std::env::var("ADMIN_TOKEN").ok().filter(|t| !t.is_empty()),
            redis_stream_name: std::env::var("REDIS_STREAM_NAME")
                .unwrap_or_else(|_| "stream:planning_api_usage".to_string()),
            maps_detail_fields: std::env::var("MAPS_DETAIL_FIELDS")
                .ok()
                .filter(|f| !f.is_empty()),
            rust_log: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| environment.default_log_level().to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_env_var("production"), Environment::Production);
        assert_eq!(Environment::from_env_var("PRODUCTION"), Environment::Production);
        assert_eq!(Environment::from_env_var("debug"), Environment::Debug);
        assert_eq!(Environment::from_env_var(""), Environment::Development);
        assert_eq!(Environment::from_env_var("staging"), Environment::Development);
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(Environment::Production.default_log_level(), "info");
        assert_eq!(Environment::Development.default_log_level(), "debug");
    }
}
