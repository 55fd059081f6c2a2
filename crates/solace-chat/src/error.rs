//! Error types for the chat layer.

use solace_core::error::SolaceError;
use solace_screening::ScreeningError;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a questionnaire is in progress; answer the current question first")]
    QuestionnaireInProgress,
    #[error("screening error: {0}")]
    Screening(#[from] ScreeningError),
    #[error("generation failed: {0}")]
    GenerationFailure(String),
    #[error("could not save risk score: {0}")]
    PersistenceFailure(String),
    #[error("retrieval error: {0}")]
    Retrieval(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<SolaceError> for ChatError {
    fn from(err: SolaceError) -> Self {
        ChatError::Retrieval(err.to_string())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::GenerationFailure(err.to_string())
    }
}
