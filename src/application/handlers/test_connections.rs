//! TestConnectionsHandler - health probe for every configured backend.

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::ai::ServiceCache;
use crate::application::common::cheapest_model;
use crate::config::AiConfig;
use crate::ports::AiProvider;

/// Connectivity result for one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionReport {
    pub provider: AiProvider,
    pub configured: bool,
    /// True when a minimal request round-tripped. Always false for an
    /// unconfigured provider.
    pub reachable: bool,
}

/// Handler probing provider connectivity.
pub struct TestConnectionsHandler {
    config: AiConfig,
    services: Arc<ServiceCache>,
}

impl TestConnectionsHandler {
    pub fn new(config: AiConfig, services: Arc<ServiceCache>) -> Self {
        Self { config, services }
    }

    /// Probes each provider family with a minimal request against its
    /// cheapest tier. Probe failures are reported, never raised.
    pub async fn handle(&self) -> Vec<ConnectionReport> {
        let mut reports = Vec::with_capacity(2);

        for provider in [AiProvider::OpenAi, AiProvider::Anthropic] {
            let configured = self.config.api_key_for(provider).is_some();
            let reachable = if configured {
                match self
                    .services
                    .get_or_create(provider, cheapest_model(provider))
                    .await
                {
                    Ok(service) => service.test_connection().await,
                    Err(_) => false,
                }
            } else {
                false
            };

            reports.push(ConnectionReport {
                provider,
                configured,
                reachable,
            });
        }

        reports
    }
}
