//! solace-chat: the conversation layer of the support bot.
//!
//! A [`ChatSession`] owns one user's conversation state. Each turn it decides
//! whether the input is a greeting, pulls context from the shared
//! [`Retriever`](solace_vector::Retriever), asks a [`DialogueGenerator`] for a
//! reply, and decides whether to offer a screening questionnaire.

pub mod error;
pub mod generator;
pub mod greeting;
pub mod history;
pub mod prompt;
pub mod replies;
pub mod report;
pub mod session;
pub mod state;

pub use error::ChatError;
pub use generator::{ChatCompletionsClient, DialogueGenerator, GeneratorMessage};
pub use greeting::is_greeting;
pub use history::MessageLog;
pub use report::{RiskFile, RiskReport};
pub use session::{AnswerStep, ChatSession, Diagnostics, Reply, SessionOptions};
pub use state::ConversationState;
