use std::time::Duration;

use thiserror::Error;

use crate::{completion::CompletionError, config::ConfigError, prompts::TemplateError};

pub type Result<T> = std::result::Result<T, NotetakerError>;

#[derive(Debug, Error)]
pub enum NotetakerError {
    #[error("Conversation text is empty.")]
    EmptyConversation,

    #[error("Unknown analysis type: {0}")]
    UnknownAnalysisType(String),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("prompt rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("{0}")]
    Workflow(#[from] note_flow::GraphError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Analysis timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl NotetakerError {
    /// Whether the caller caused the error; everything else is a server-side failure
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            NotetakerError::EmptyConversation | NotetakerError::UnknownAnalysisType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_errors_are_client_errors() {
        assert!(NotetakerError::EmptyConversation.is_client_error());
        assert!(NotetakerError::UnknownAnalysisType("xray".into()).is_client_error());
        assert!(!NotetakerError::Timeout(Duration::from_secs(120)).is_client_error());
        assert!(
            !NotetakerError::Completion(CompletionError::Transport("connection reset".into()))
                .is_client_error()
        );
    }

    #[test]
    fn upstream_message_survives_display() {
        let err = NotetakerError::from(CompletionError::Service("rate limit reached".into()));
        assert_eq!(err.to_string(), "service error: rate limit reached");
    }

    #[test]
    fn timeout_message_names_the_limit() {
        let err = NotetakerError::Timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "Analysis timed out after 120s");
    }
}
