//! The prompt gateway capability and its non-network implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AiError;
use crate::prompt::PromptId;

/// Turns a prompt id plus JSON input into the model's JSON answer.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait PromptGateway: Send + Sync {
    async fn generate(&self, prompt: PromptId, input: Value) -> Result<Value, AiError>;
}

/// Used when no model API key is configured: every call fails with
/// [`AiError::NotConfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGateway;

#[async_trait]
impl PromptGateway for DisabledGateway {
    async fn generate(&self, _prompt: PromptId, _input: Value) -> Result<Value, AiError> {
        Err(AiError::NotConfigured)
    }
}

/// Canned answers per prompt, for tests and offline development.
///
/// The rendered prompt is still produced so template errors surface the same
/// way they would against a real model.
#[derive(Debug, Default, Clone)]
pub struct StaticGateway {
    responses: HashMap<PromptId, Value>,
}

impl StaticGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, prompt: PromptId, response: Value) -> Self {
        self.responses.insert(prompt, response);
        self
    }
}

#[async_trait]
impl PromptGateway for StaticGateway {
    async fn generate(&self, prompt: PromptId, input: Value) -> Result<Value, AiError> {
        prompt.render(&input)?;
        self.responses
            .get(&prompt)
            .cloned()
            .ok_or(AiError::NoFixture(prompt))
    }
}
