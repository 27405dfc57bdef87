// Seams between the review components and the remote generative services.
// `ApiClient` speaks the OpenAI-compatible REST shapes; tests plug in fakes.

use std::future::Future;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::api::ApiClient;
use crate::errors::CliError;
use crate::parse::response::{
    extract_image_url, extract_model, extract_reply, extract_revised_prompt, extract_usage_line,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletion {
    pub text: String,
    pub model: Option<String>,
    pub usage: String,
}

/// One square image, always `n = 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub size: u32,
    pub quality: String,
}

impl ImageRequest {
    pub fn size_label(&self) -> String {
        format!("{0}x{0}", self.size)
    }
}

pub trait TextGenerator {
    fn complete(
        &self,
        request: ChatRequest,
    ) -> impl Future<Output = Result<ChatCompletion, CliError>> + Send;
}

pub trait ImageGenerator {
    /// Ask for one image and return a retrievable reference to it.
    fn generate(
        &self,
        request: ImageRequest,
    ) -> impl Future<Output = Result<String, CliError>> + Send;

    /// Retrieve the encoded bytes behind a reference from `generate`.
    fn fetch(&self, reference: String) -> impl Future<Output = Result<Vec<u8>, CliError>> + Send;
}

pub fn chat_body(request: &ChatRequest) -> Value {
    json!({
        "model": request.model,
        "messages": request
            .messages
            .iter()
            .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
            .collect::<Vec<_>>(),
        "temperature": request.temperature,
        "max_tokens": request.max_tokens,
    })
}

pub fn image_body(request: &ImageRequest) -> Value {
    json!({
        "model": request.model,
        "prompt": request.prompt,
        "size": request.size_label(),
        "quality": request.quality,
        "n": 1,
    })
}

impl TextGenerator for ApiClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatCompletion, CliError> {
        let res = self.post_json("/chat/completions", &chat_body(&request)).await?;
        debug!(request_id = ?res.request_id, elapsed_ms = res.elapsed_ms as u64, "chat completion");

        let text = extract_reply(&res.json).ok_or_else(|| {
            CliError::Remote("The text service returned no commentary in its response.".to_string())
        })?;
        Ok(ChatCompletion {
            text,
            model: extract_model(&res.json),
            usage: extract_usage_line(&res.json),
        })
    }
}

impl ImageGenerator for ApiClient {
    async fn generate(&self, request: ImageRequest) -> Result<String, CliError> {
        let res = self
            .post_json("/images/generations", &image_body(&request))
            .await?;
        debug!(request_id = ?res.request_id, elapsed_ms = res.elapsed_ms as u64, "image generation");
        if let Some(revised) = extract_revised_prompt(&res.json) {
            info!(%revised, "service revised the image prompt");
        }

        extract_image_url(&res.json).ok_or_else(|| {
            CliError::Remote("The image service returned no image URL in its response.".to_string())
        })
    }

    async fn fetch(&self, reference: String) -> Result<Vec<u8>, CliError> {
        self.get_bytes(&reference).await
    }
}
