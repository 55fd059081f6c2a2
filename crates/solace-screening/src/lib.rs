//! solace-screening
//!
//! The two standard self-report screenings used by the support bot: PHQ-9
//! (depression) and GAD-7 (anxiety). Item texts, answer options, and risk
//! thresholds are plain data; [`QuestionnaireSession`] walks a user through
//! one screening and scores it.

pub mod error;
pub mod risk;
pub mod screening;
pub mod session;

pub use error::ScreeningError;
pub use risk::{overall_risk, RiskLevel};
pub use screening::{AnswerOption, Screening, ANSWER_OPTIONS};
pub use session::{AnswerOutcome, Completion, Question, QuestionnaireSession};
