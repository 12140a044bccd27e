//! OpenAI chat-completions implementation of the shared `chat_provider` contract.
//!
//! This adapter translates a session transcript into one `openai_api` request
//! and maps the response, or the transport failure, into a normalized
//! [`Completion`] / [`GatewayError`].

use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    ChatMessage, Completion, CompletionGateway, CompletionRequest, GatewayError, GatewayProfile,
    ProviderInitError,
};
use openai_api::{
    ChatCompletionRequest, ChatCompletionResponse, OpenAiApiClient, OpenAiApiConfig,
    OpenAiApiError, WireMessage,
};

/// Stable provider identifier used by startup selection.
pub const OPENAI_PROVIDER_ID: &str = "openai";

/// Model used when the configuration does not name one.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Runtime configuration for the OpenAI provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiProviderConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Option<String>,
    pub organization: Option<String>,
    pub timeout: Option<Duration>,
}

impl OpenAiProviderConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            organization: None,
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_api_config(self) -> OpenAiApiConfig {
        let mut config = OpenAiApiConfig::new(self.api_key);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(organization) = self.organization {
            config = config.with_organization(organization);
        }

        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }

        config
    }
}

trait CompletionClient: Send + Sync {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError>;
}

#[derive(Debug)]
struct DefaultCompletionClient {
    client: OpenAiApiClient,
}

impl CompletionClient for DefaultCompletionClient {
    fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAiApiError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                OpenAiApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(self.client.complete(request))
    }
}

/// `CompletionGateway` adapter backed by `openai_api` transport primitives.
pub struct OpenAiProvider {
    model: String,
    client: Arc<dyn CompletionClient>,
}

impl OpenAiProvider {
    /// Creates a provider using real HTTP transport.
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderInitError> {
        let model = sanitize_model(&config.model);
        if config.api_key.trim().is_empty() {
            return Err(ProviderInitError::new(
                "Failed to initialize openai provider: API key is required",
            ));
        }
        let client = Arc::new(DefaultCompletionClient {
            client: OpenAiApiClient::new(config.into_api_config()).map_err(map_init_error)?,
        });

        Ok(Self { model, client })
    }

    fn build_request(&self, request: CompletionRequest) -> ChatCompletionRequest {
        let messages = request.messages.iter().map(to_wire_message).collect();
        ChatCompletionRequest::new(self.model.clone(), messages)
            .with_temperature(request.temperature)
            .with_stop(request.stop)
    }

    #[cfg(test)]
    fn with_client_for_tests(model: &str, client: Arc<dyn CompletionClient>) -> Self {
        Self {
            model: sanitize_model(model),
            client,
        }
    }
}

impl CompletionGateway for OpenAiProvider {
    fn profile(&self) -> GatewayProfile {
        GatewayProfile {
            provider_id: OPENAI_PROVIDER_ID.to_string(),
            model_id: self.model.clone(),
        }
    }

    fn complete(&self, request: CompletionRequest) -> Result<Completion, GatewayError> {
        let request = self.build_request(request);
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let response = self.client.complete(&request).map_err(map_api_error)?;
        let content = response
            .first_content()
            .ok_or_else(|| map_api_error(OpenAiApiError::EmptyChoices))?
            .to_string();

        tracing::debug!(
            total_tokens = response.usage.total_tokens,
            "chat completion finished"
        );

        Ok(Completion {
            content,
            tokens_used: response.usage.total_tokens,
        })
    }
}

fn to_wire_message(message: &ChatMessage) -> WireMessage {
    WireMessage::new(message.role.as_str(), message.content.clone())
}

fn sanitize_model(model: &str) -> String {
    let trimmed = model.trim();
    if trimmed.is_empty() {
        DEFAULT_MODEL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_api_error(error: OpenAiApiError) -> GatewayError {
    let status = error.status_code();
    let message = match &error {
        OpenAiApiError::Status(_, message) => message.clone(),
        other => other.to_string(),
    };

    GatewayError { status, message }
}

fn map_init_error(error: OpenAiApiError) -> ProviderInitError {
    ProviderInitError::new(format!("Failed to initialize openai provider: {error}"))
}
