//! Store configuration (PostgreSQL connection).

use serde::Deserialize;

use super::error::ValidationError;

/// Project store configuration.
///
/// The store is optional: without a database URL the core runs in a
/// degraded mode where every store operation reports
/// `StoreError::NotConfigured` and callers fall back to placeholder
/// data.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,

    /// Connection pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl StoreConfig {
    /// Whether a backing database is configured.
    pub fn enabled(&self) -> bool {
        self.database_url.as_ref().is_some_and(|u| !u.is_empty())
    }

    /// Validate store configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.database_url {
            if !url.is_empty()
                && !url.starts_with("postgresql://")
                && !url.starts_with("postgres://")
            {
                return Err(ValidationError::InvalidValue {
                    field: "store.database_url",
                    reason: "must start with postgresql:// or postgres://".to_string(),
                });
            }
        }

        if self.max_connections == 0 {
            return Err(ValidationError::InvalidValue {
                field: "store.max_connections",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn default_max_connections() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_url_means_disabled() {
        let config = StoreConfig::default();
        assert!(!config.enabled());
    }

    #[test]
    fn default_store_config_validates() {
        let config = StoreConfig::default();
        assert_eq!(config.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_postgres_url() {
        let config = StoreConfig {
            database_url: Some("mysql://localhost/helm".to_string()),
            max_connections: 5,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn accepts_postgres_url() {
        let config = StoreConfig {
            database_url: Some("postgresql://test@localhost/helm".to_string()),
            max_connections: 5,
        };
        assert!(config.validate().is_ok());
        assert!(config.enabled());
    }
}
