//! services/api/src/adapters/title_llm.rs
//!
//! Adapter for the session-title generation call. Implements the
//! `TitleService` port.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use prog_helper_core::ports::{PortError, PortResult, TitleService};

#[derive(Clone)]
pub struct OpenAiTitleAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTitleAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl TitleService for OpenAiTitleAdapter {
    async fn generate_title(&self, message: &str) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(
                        "You are a helpful assistant that creates concise, descriptive titles \
                         for programming chat conversations. Based on the user's question, \
                         generate a short, clear title (max 6 words) that captures the main \
                         topic or programming concept being discussed. Examples: 'React Hooks \
                         Help', 'Python Debugging', 'Database Design', 'API Integration'. \
                         Return only the title, nothing else.",
                    )
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(format!(
                        "Create a title for this programming question: \"{message}\""
                    ))
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_tokens(20u32)
            .temperature(0.3)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let title = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| PortError::Unexpected("No title generated".to_string()))?;

        Ok(title.trim().to_string())
    }
}
