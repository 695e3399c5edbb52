//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `HELM_` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use helm_ai::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod ai;
mod error;
mod store;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use store::StoreConfig;

use serde::Deserialize;

/// Root application configuration.
///
/// Load using [`AppConfig::load()`] which reads from environment
/// variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (OpenAI/Anthropic)
    #[serde(default)]
    pub ai: AiConfig,

    /// Project store configuration (PostgreSQL connection)
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `HELM` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `HELM__AI__OPENAI_API_KEY=sk-...` -> `ai.openai_api_key = ...`
    /// - `HELM__STORE__DATABASE_URL=...` -> `store.database_url = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().prefix("HELM").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{AiModel, AiProvider};
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn set_minimal_env() {
        env::set_var("HELM__AI__OPENAI_API_KEY", "sk-test-xxx");
    }

    fn clear_env() {
        env::remove_var("HELM__AI__OPENAI_API_KEY");
        env::remove_var("HELM__AI__DEFAULT_PROVIDER");
        env::remove_var("HELM__AI__DEFAULT_MODEL");
        env::remove_var("HELM__AI__ANTHROPIC_API_KEY");
        env::remove_var("HELM__STORE__DATABASE_URL");
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.ai.openai_api_key.as_deref(), Some("sk-test-xxx"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_without_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.default_provider, AiProvider::OpenAi);
        assert_eq!(config.ai.default_model, AiModel::Gpt4oMini);
        assert!(!config.store.enabled());
    }

    #[test]
    fn test_provider_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("HELM__AI__ANTHROPIC_API_KEY", "sk-ant-xxx");
        env::set_var("HELM__AI__DEFAULT_PROVIDER", "anthropic");
        env::set_var("HELM__AI__DEFAULT_MODEL", "claude-3-haiku-20240307");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.ai.default_provider, AiProvider::Anthropic);
        assert_eq!(config.ai.default_model, AiModel::Claude3Haiku);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_store_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var(
            "HELM__STORE__DATABASE_URL",
            "postgresql://test@localhost/helm",
        );
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.store.enabled());
        assert!(config.validate().is_ok());
    }
}
