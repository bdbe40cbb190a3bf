//! services/api/src/adapters/classify_llm.rs
//!
//! Adapter for the question-classification LLM call. Implements the
//! `ClassificationService` port.

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;

use prog_helper_core::ports::{ClassificationService, PortError, PortResult};
use prog_helper_core::prompts::QUESTION_CATEGORIES;

/// An adapter that sorts questions into the eight fixed categories.
#[derive(Clone)]
pub struct OpenAiClassifyAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClassifyAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl ClassificationService for OpenAiClassifyAdapter {
    async fn classify_question(&self, message: &str) -> PortResult<String> {
        let system = format!(
            "You are a helpful assistant that categorizes programming questions. \
             Based on the user's question, determine the most appropriate category from \
             these options: {}. Return only the category name, nothing else.",
            QUESTION_CATEGORIES
                .map(|c| format!("'{c}'"))
                .join(", ")
        );

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()
                    .map_err(|e| PortError::Unexpected(e.to_string()))?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(format!("Categorize this programming question: \"{message}\""))
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

        let category = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| PortError::Unexpected("No category returned".to_string()))?;

        Ok(category.trim().to_string())
    }
}
