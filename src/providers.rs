use std::path::Path;
use std::sync::Arc;

use chat_provider::CompletionGateway;
use chat_provider_mock::{MockGateway, MOCK_PROVIDER_ID};
use chat_provider_openai::{OpenAiProvider, OPENAI_PROVIDER_ID};
use thiserror::Error;

use crate::config::{resolve_config_path, Config, ConfigError};

pub const DEFAULT_PROVIDER_ID: &str = OPENAI_PROVIDER_ID;
pub const PROVIDER_ENV_VAR: &str = "MASTERMIND_PROVIDER";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Init(String),

    #[error("Unsupported provider '{0}'. Available providers: openai, mock")]
    Unsupported(String),
}

/// Selects the gateway named by `MASTERMIND_PROVIDER`, defaulting to OpenAI.
pub fn gateway_from_env(
    config_path: Option<&Path>,
) -> Result<Arc<dyn CompletionGateway>, ProviderError> {
    let provider_id = std::env::var(PROVIDER_ENV_VAR)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    gateway_for_id(
        provider_id.as_deref().unwrap_or(DEFAULT_PROVIDER_ID),
        config_path,
    )
}

/// The mock gateway needs no credentials; the OpenAI gateway loads them
/// from the resolved configuration file.
pub fn gateway_for_id(
    provider_id: &str,
    config_path: Option<&Path>,
) -> Result<Arc<dyn CompletionGateway>, ProviderError> {
    match provider_id {
        OPENAI_PROVIDER_ID => {
            let path = resolve_config_path(config_path)?;
            let config = Config::load(&path)?;
            tracing::debug!(path = %path.display(), model = %config.model, "loaded configuration");

            let provider = OpenAiProvider::new(config.provider_config())
                .map_err(|error| ProviderError::Init(error.message().to_string()))?;
            Ok(Arc::new(provider))
        }
        MOCK_PROVIDER_ID => Ok(Arc::new(MockGateway::new())),
        unknown => Err(ProviderError::Unsupported(unknown.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap_error(result: Result<Arc<dyn CompletionGateway>, ProviderError>) -> ProviderError {
        match result {
            Ok(_) => panic!("provider selection should fail"),
            Err(error) => error,
        }
    }

    #[test]
    fn gateway_for_id_supports_mock() {
        let gateway = gateway_for_id("mock", None).expect("mock provider should resolve");
        assert_eq!(gateway.profile().provider_id, "mock");
    }

    #[test]
    fn gateway_for_id_rejects_unknown_provider() {
        let error = unwrap_error(gateway_for_id("custom", None));
        assert!(error.to_string().contains("Unsupported provider 'custom'"));
    }

    #[test]
    fn openai_gateway_loads_credentials() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"api_key": "sk-test", "model": "gpt-4o-mini"}"#)
            .expect("config written");

        let gateway = gateway_for_id("openai", Some(&path)).expect("openai should resolve");
        let profile = gateway.profile();
        assert_eq!(profile.provider_id, "openai");
        assert_eq!(profile.model_id, "gpt-4o-mini");
    }

    #[test]
    fn openai_gateway_surfaces_configuration_errors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model": "gpt-4o-mini"}"#).expect("config written");

        let error = unwrap_error(gateway_for_id("openai", Some(&path)));
        assert!(matches!(
            error,
            ProviderError::Config(ConfigError::MissingApiKey { .. })
        ));
    }
}
