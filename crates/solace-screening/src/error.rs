//! Error types for questionnaire handling.

use crate::screening::Screening;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScreeningError {
    #[error("Answer is not a whole number: {0:?}")]
    InvalidAnswer(String),
    #[error("No questionnaire is in progress")]
    NotInProgress,
    #[error("{screening} cannot be started before {requires} is completed")]
    OutOfOrder {
        screening: Screening,
        requires: Screening,
    },
    #[error("Unknown screening: {0}")]
    UnknownScreening(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScreeningError::InvalidAnswer("abc".to_string());
        assert_eq!(err.to_string(), "Answer is not a whole number: \"abc\"");

        let err = ScreeningError::OutOfOrder {
            screening: Screening::Anxiety,
            requires: Screening::Depression,
        };
        assert_eq!(
            err.to_string(),
            "GAD-7 cannot be started before PHQ-9 is completed"
        );

        assert_eq!(
            ScreeningError::NotInProgress.to_string(),
            "No questionnaire is in progress"
        );
    }
}
