//! OpenAI-compatible story generator.
//!
//! Sends the story prompt as a system + user chat completion through
//! [`async_openai`]. Any server speaking the OpenAI chat protocol works via
//! `base_url`.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use secrecy::{ExposeSecret, SecretString};

use storytailor_core::story::{StoryGenerator, StoryPrompt};
use storytailor_types::config::GenerationSettings;
use storytailor_types::error::GroundingError;
use storytailor_types::story::StoryConstraints;

/// Story generator backed by an OpenAI-compatible chat API.
///
/// Does NOT derive Debug: the `async_openai::Client` holds the API key.
pub struct OpenAiStoryGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiStoryGenerator {
    pub fn new(api_key: SecretString, settings: &GenerationSettings) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key.expose_secret())
            .with_api_base(&settings.base_url);

        Self {
            client: Client::with_config(config),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    fn build_request(&self, prompt: &StoryPrompt) -> CreateChatCompletionRequest {
        let messages = vec![
            ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                content: ChatCompletionRequestSystemMessageContent::Text(prompt.system.clone()),
                name: None,
            }),
            ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(prompt.user.clone()),
                name: None,
            }),
        ];

        CreateChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_completion_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            ..Default::default()
        }
    }
}

impl StoryGenerator for OpenAiStoryGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        prompt: &StoryPrompt,
        constraints: &StoryConstraints,
    ) -> Result<String, GroundingError> {
        let request = self.build_request(prompt);
        tracing::debug!(model = %self.model, age = constraints.age, "requesting story completion");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(map_openai_error)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GroundingError::GenerationFailed("response had no content".to_string()))
    }
}

fn map_openai_error(err: OpenAIError) -> GroundingError {
    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            if code == "invalid_api_key" || api_err.message.contains("Incorrect API key") {
                GroundingError::GenerationFailed("authentication failed".to_string())
            } else {
                GroundingError::GenerationFailed(api_err.message.clone())
            }
        }
        OpenAIError::Reqwest(reqwest_err) => match reqwest_err.status().map(|s| s.as_u16()) {
            Some(401) => GroundingError::GenerationFailed("authentication failed".to_string()),
            Some(429) => GroundingError::GenerationFailed("rate limited".to_string()),
            _ => GroundingError::GenerationFailed(format!("HTTP request failed: {err}")),
        },
        OpenAIError::JSONDeserialize(_, content) => {
            GroundingError::GenerationFailed(format!("failed to parse response: {content}"))
        }
        _ => GroundingError::GenerationFailed(err.to_string()),
    }
}
