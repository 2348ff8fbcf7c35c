use crate::prompt::PromptId;

/// Everything that can go wrong between a flow call and a parsed answer.
///
/// The API surfaces all of these as one generic 502; the detail is only
/// logged.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI gateway is not configured")]
    NotConfigured,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Model API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Model output for {prompt} did not match the expected shape: {reason}")]
    InvalidOutput { prompt: PromptId, reason: String },

    #[error("Prompt template error: {0}")]
    Template(String),

    #[error("No canned response for {0}")]
    NoFixture(PromptId),
}
