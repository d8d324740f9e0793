use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse, ResponseFormat, ResponseFormatJsonSchema,
    },
};
use async_trait::async_trait;
use schemars::JsonSchema;

/// A named JSON schema the model output must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: &'static str,
    pub schema: serde_json::Value,
}

impl ResponseSchema {
    /// Derives the schema for `T` with `schemars`.
    pub fn of<T: JsonSchema>(name: &'static str) -> Result<Self> {
        let schema = serde_json::to_value(schemars::schema_for!(T))
            .with_context(|| format!("Failed to serialize JSON schema '{}'", name))?;
        Ok(Self { name, schema })
    }
}

/// A generic client for a text-generation model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Sends a prompt and asks for a JSON document conforming to `schema`.
    ///
    /// Returns the raw text of the reply; validating it is the caller's job.
    async fn complete_structured(&self, prompt: String, schema: ResponseSchema) -> Result<String>;

    /// Sends a plain prompt and returns the text reply.
    async fn complete(&self, prompt: String) -> Result<String>;
}

/// An implementation of `LLMClient` for any OpenAI-compatible API.
pub struct OpenAICompatibleClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleClient {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gemini-1.5-flash-latest").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }

    fn messages(prompt: String) -> Result<Vec<ChatCompletionRequestMessage>> {
        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content("You are a helpful assistant that designs structured online courses.")
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        ])
    }

    fn first_content(response: CreateChatCompletionResponse) -> Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .context("No response choice from LLM")?
            .message
            .content
            .context("No content in LLM response")
    }
}

#[async_trait]
impl LLMClient for OpenAICompatibleClient {
    async fn complete_structured(&self, prompt: String, schema: ResponseSchema) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::messages(prompt)?)
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: schema.name.to_string(),
                    schema: Some(schema.schema),
                    strict: None,
                },
            })
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;
        Self::first_content(response)
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .context("Chat completion request failed")?;
        Self::first_content(response)
    }
}
