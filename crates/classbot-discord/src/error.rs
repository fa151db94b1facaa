use classbot_core::ClassbotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Discord returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid API base URL: {0}")]
    BaseUrl(String),
}

impl From<DiscordError> for ClassbotError {
    fn from(e: DiscordError) -> Self {
        ClassbotError::Platform(e.to_string())
    }
}
