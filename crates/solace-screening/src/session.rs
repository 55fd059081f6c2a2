//! Questionnaire session: Idle -> InProgress -> Completed.
//!
//! A session administers one screening at a time. Starting a screening
//! always begins at item 1 with no scores; an answer that is not a whole
//! number abandons the run and returns the session to Idle.

use std::fmt;

use tracing::{debug, info, warn};

use crate::error::ScreeningError;
use crate::risk::RiskLevel;
use crate::screening::Screening;

/// One questionnaire item ready to be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub screening: Screening,
    /// 1-based position of the item.
    pub number: usize,
    pub total: usize,
    pub text: &'static str,
}

impl fmt::Display for Question {
    /// Progress label, e.g. "PHQ-9 Question 3/9: Trouble falling asleep...".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Question {}/{}: {}",
            self.screening, self.number, self.total, self.text
        )
    }
}

/// Result of a finished screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub screening: Screening,
    pub total: i64,
    pub level: RiskLevel,
}

/// What happens after an answer is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Next(Question),
    Completed(Completion),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    InProgress {
        screening: Screening,
        // current_index is always scores.len()
        scores: Vec<i64>,
    },
    Completed(Completion),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionnaireSession {
    phase: Phase,
}

impl QuestionnaireSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin `screening` from its first item, discarding any run in progress.
    ///
    /// Returns the first question, or `None` if the screening has no items.
    pub fn start(&mut self, screening: Screening) -> Option<Question> {
        if let Phase::InProgress { screening: prev, scores } = &self.phase {
            debug!(
                previous = %prev,
                answered = scores.len(),
                "Restarting questionnaire; previous run discarded"
            );
        }

        if screening.items().is_empty() {
            let total = 0;
            self.phase = Phase::Completed(Completion {
                screening,
                total,
                level: screening.classify(total),
            });
            return None;
        }

        self.phase = Phase::InProgress {
            screening,
            scores: Vec::with_capacity(screening.items().len()),
        };
        info!(screening = %screening, "Questionnaire started");
        self.current_question()
    }

    /// Record a raw answer, which must parse as a whole number.
    ///
    /// On a parse failure the run is abandoned (the session returns to Idle)
    /// and [`ScreeningError::InvalidAnswer`] is returned.
    pub fn record_answer(&mut self, raw: &str) -> Result<AnswerOutcome, ScreeningError> {
        if !self.is_in_progress() {
            return Err(ScreeningError::NotInProgress);
        }
        match raw.trim().parse::<i64>() {
            Ok(score) => self.record_score(score),
            Err(_) => {
                warn!(answer = raw, "Invalid questionnaire answer; abandoning run");
                self.phase = Phase::Idle;
                Err(ScreeningError::InvalidAnswer(raw.to_string()))
            }
        }
    }

    /// Record an already-numeric answer. Scores are not range-checked.
    pub fn record_score(&mut self, score: i64) -> Result<AnswerOutcome, ScreeningError> {
        let Phase::InProgress { screening, scores } = &mut self.phase else {
            return Err(ScreeningError::NotInProgress);
        };
        let screening = *screening;
        scores.push(score);

        if scores.len() < screening.items().len() {
            debug!(screening = %screening, answered = scores.len(), "Answer recorded");
            return self
                .current_question()
                .map(AnswerOutcome::Next)
                .ok_or(ScreeningError::NotInProgress);
        }

        let total = scores.iter().fold(0i64, |acc, &s| acc.saturating_add(s));
        let completion = Completion {
            screening,
            total,
            level: screening.classify(total),
        };
        info!(
            screening = %screening,
            total,
            level = %completion.level,
            "Questionnaire completed"
        );
        self.phase = Phase::Completed(completion);
        Ok(AnswerOutcome::Completed(completion))
    }

    /// Abandon any run in progress.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    /// The item awaiting an answer, if a run is in progress.
    pub fn current_question(&self) -> Option<Question> {
        match &self.phase {
            Phase::InProgress { screening, scores } => {
                let items = screening.items();
                items.get(scores.len()).map(|text| Question {
                    screening: *screening,
                    number: scores.len() + 1,
                    total: items.len(),
                    text,
                })
            }
            _ => None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, Phase::InProgress { .. })
    }

    /// The screening being administered, if any.
    pub fn active_screening(&self) -> Option<Screening> {
        match &self.phase {
            Phase::InProgress { screening, .. } => Some(*screening),
            _ => None,
        }
    }

    /// Number of items answered in the current run.
    pub fn current_index(&self) -> usize {
        match &self.phase {
            Phase::InProgress { scores, .. } => scores.len(),
            _ => 0,
        }
    }

    pub fn scores(&self) -> &[i64] {
        match &self.phase {
            Phase::InProgress { scores, .. } => scores,
            _ => &[],
        }
    }

    /// Result of the most recently finished run, until the next start.
    pub fn completion(&self) -> Option<Completion> {
        match &self.phase {
            Phase::Completed(c) => Some(*c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer_all(session: &mut QuestionnaireSession, score: &str) -> AnswerOutcome {
        let mut last = None;
        while session.is_in_progress() {
            last = Some(session.record_answer(score).unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn test_extreme_scores_saturate_instead_of_overflowing() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Anxiety);
        session.record_answer(&i64::MAX.to_string()).unwrap();
        for _ in 0..5 {
            session.record_answer("0").unwrap();
        }
        match session.record_answer("1").unwrap() {
            AnswerOutcome::Completed(c) => {
                assert_eq!(c.total, i64::MAX);
                assert_eq!(c.level, RiskLevel::High);
            }
            AnswerOutcome::Next(_) => panic!("expected completion"),
        }

        session.start(Screening::Anxiety);
        session.record_answer(&i64::MIN.to_string()).unwrap();
        let outcome = answer_all(&mut session, "-1");
        match outcome {
            AnswerOutcome::Completed(c) => {
                assert_eq!(c.total, i64::MIN);
                assert_eq!(c.level, RiskLevel::Low);
            }
            AnswerOutcome::Next(_) => panic!("expected completion"),
        }
    }

    #[test]
    fn test_start_returns_first_question() {
        let mut session = QuestionnaireSession::new();
        let q = session.start(Screening::Depression).unwrap();
        assert_eq!(q.number, 1);
        assert_eq!(q.total, 9);
        assert_eq!(q.text, Screening::Depression.items()[0]);
        assert_eq!(session.current_index(), 0);
        assert!(session.scores().is_empty());
    }

    #[test]
    fn test_progress_label() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Anxiety);
        session.record_answer("0").unwrap();
        let q = session.current_question().unwrap();
        assert_eq!(
            q.to_string(),
            "GAD-7 Question 2/7: Not being able to stop or control worrying?"
        );
    }

    #[test]
    fn test_answers_advance_and_keep_invariant() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Depression);
        for i in 0..5 {
            let outcome = session.record_answer("2").unwrap();
            assert_eq!(session.current_index(), i + 1);
            assert_eq!(session.scores().len(), session.current_index());
            match outcome {
                AnswerOutcome::Next(q) => assert_eq!(q.number, i + 2),
                AnswerOutcome::Completed(_) => panic!("completed too early"),
            }
        }
    }

    #[test]
    fn test_all_ones_phq9_is_moderate() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Depression);
        let outcome = answer_all(&mut session, "1");
        assert_eq!(
            outcome,
            AnswerOutcome::Completed(Completion {
                screening: Screening::Depression,
                total: 9,
                level: RiskLevel::Moderate,
            })
        );
        assert!(!session.is_in_progress());
        assert_eq!(session.completion().unwrap().total, 9);
    }

    #[test]
    fn test_all_zero_gad7_is_low() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Anxiety);
        match answer_all(&mut session, "0") {
            AnswerOutcome::Completed(c) => assert_eq!(c.level, RiskLevel::Low),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_answer_abandons_run() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Depression);
        session.record_answer("3").unwrap();

        let err = session.record_answer("often").unwrap_err();
        assert_eq!(err, ScreeningError::InvalidAnswer("often".to_string()));
        assert!(!session.is_in_progress());
        assert_eq!(session.current_index(), 0);
        assert!(session.completion().is_none());
    }

    #[test]
    fn test_answer_without_run() {
        let mut session = QuestionnaireSession::new();
        assert_eq!(
            session.record_answer("1").unwrap_err(),
            ScreeningError::NotInProgress
        );
    }

    #[test]
    fn test_answer_after_completion() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Anxiety);
        answer_all(&mut session, "3");
        assert_eq!(
            session.record_score(1).unwrap_err(),
            ScreeningError::NotInProgress
        );
    }

    #[test]
    fn test_scores_not_range_checked() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Anxiety);
        session.record_score(42).unwrap();
        session.record_answer(" -1 ").unwrap();
        assert_eq!(session.scores(), &[42, -1]);
    }

    #[test]
    fn test_restart_discards_previous_run() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Depression);
        session.record_answer("3").unwrap();
        session.record_answer("3").unwrap();

        let q = session.start(Screening::Depression).unwrap();
        assert_eq!(q.number, 1);
        assert!(session.scores().is_empty());
    }

    #[test]
    fn test_reset() {
        let mut session = QuestionnaireSession::new();
        session.start(Screening::Anxiety);
        session.reset();
        assert!(session.active_screening().is_none());
        assert!(session.current_question().is_none());
    }
}
