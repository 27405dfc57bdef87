use tracing::{debug, info, warn};

use crate::errors::CliError;
use crate::prompts::commentary_messages;
use crate::script::Script;
use crate::services::{ChatCompletion, ChatRequest, TextGenerator};

pub const COMMENTARY_TEMPERATURE: f32 = 0.7;
pub const COMMENTARY_MAX_TOKENS: u32 = 1000;

/// Asks the text service for film-analysis commentary on a script.
/// Holds no state between requests.
#[derive(Debug, Clone)]
pub struct CommentaryRequester<T> {
    generator: T,
    model: String,
}

impl<T: TextGenerator> CommentaryRequester<T> {
    pub fn new(generator: T, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn request_commentary(&self, script: &Script) -> Result<ChatCompletion, CliError> {
        if script.is_blank() {
            info!("no script text; skipping commentary request");
            return Err(CliError::EmptyInput);
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: commentary_messages(script),
            temperature: COMMENTARY_TEMPERATURE,
            max_tokens: COMMENTARY_MAX_TOKENS,
        };
        info!(model = %self.model, "requesting commentary");
        if let Some(prompt) = request.messages.last() {
            debug!(prompt = %prompt.content, "commentary prompt");
        }

        match self.generator.complete(request).await {
            Ok(completion) => {
                info!("commentary received");
                Ok(completion)
            }
            Err(err) => {
                warn!(error = %err, "commentary request failed");
                Err(err)
            }
        }
    }
}
