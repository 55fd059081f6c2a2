//! Per-session counters that drive the screening cadence.

use serde::Serialize;
use solace_screening::{overall_risk, Completion, RiskLevel, Screening};

/// Exchanges before the first PHQ-9 offer, and between later offers.
const PROMPT_AFTER_EXCHANGES: u32 = 2;

/// Counters and screening results for one conversation.
///
/// Greetings never touch the counters. A screening's risk level is set once
/// it completes; completion is what the cadence rules check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    exchange_count: u32,
    prompted_for_test: bool,
    test_declined_count: u32,
    chats_since_decline: u32,
    post_phq_exchanges: u32,
    phq9_risk: Option<RiskLevel>,
    gad7_risk: Option<RiskLevel>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a non-greeting user turn.
    pub fn record_exchange(&mut self) {
        self.exchange_count += 1;
        if self.test_declined_count > 0 {
            self.chats_since_decline += 1;
        }
        if self.phq9_completed() && !self.gad7_completed() {
            self.post_phq_exchanges += 1;
        }
    }

    /// Which screening to offer now, if any. First matching rule wins.
    ///
    /// Nothing is offered while a questionnaire is running or a previous
    /// offer is still unanswered.
    pub fn should_prompt_for_test(&self, questionnaire_active: bool) -> Option<Screening> {
        if questionnaire_active || self.prompted_for_test {
            return None;
        }
        if !self.phq9_completed() && self.exchange_count >= PROMPT_AFTER_EXCHANGES {
            return Some(Screening::Depression);
        }
        if self.test_declined_count > 0
            && !self.phq9_completed()
            && self.chats_since_decline >= PROMPT_AFTER_EXCHANGES
        {
            return Some(Screening::Depression);
        }
        if self.phq9_completed()
            && !self.gad7_completed()
            && self.post_phq_exchanges >= PROMPT_AFTER_EXCHANGES
        {
            return Some(Screening::Anxiety);
        }
        None
    }

    pub fn mark_prompted(&mut self) {
        self.prompted_for_test = true;
    }

    /// The user accepted the offer.
    pub fn accept_prompt(&mut self) {
        self.prompted_for_test = false;
    }

    /// The user turned the offer down.
    pub fn decline(&mut self, screening: Screening) {
        self.prompted_for_test = false;
        match screening {
            Screening::Depression => {
                self.test_declined_count += 1;
                self.chats_since_decline = 0;
            }
            Screening::Anxiety => {
                self.post_phq_exchanges = 0;
            }
        }
    }

    /// Store a finished screening's result.
    pub fn record_completion(&mut self, completion: &Completion) {
        match completion.screening {
            Screening::Depression => {
                self.phq9_risk = Some(completion.level);
                self.post_phq_exchanges = 0;
            }
            Screening::Anxiety => {
                self.gad7_risk = Some(completion.level);
            }
        }
    }

    /// True once every prerequisite of `screening` has completed.
    pub fn can_start(&self, screening: Screening) -> bool {
        match screening.prerequisite() {
            Some(required) => self.is_completed(required),
            None => true,
        }
    }

    pub fn is_completed(&self, screening: Screening) -> bool {
        match screening {
            Screening::Depression => self.phq9_completed(),
            Screening::Anxiety => self.gad7_completed(),
        }
    }

    pub fn overall_risk(&self) -> Option<RiskLevel> {
        overall_risk(self.phq9_risk, self.gad7_risk)
    }

    pub fn exchange_count(&self) -> u32 {
        self.exchange_count
    }

    pub fn prompted_for_test(&self) -> bool {
        self.prompted_for_test
    }

    pub fn test_declined_count(&self) -> u32 {
        self.test_declined_count
    }

    pub fn chats_since_decline(&self) -> u32 {
        self.chats_since_decline
    }

    pub fn post_phq_exchanges(&self) -> u32 {
        self.post_phq_exchanges
    }

    pub fn phq9_completed(&self) -> bool {
        self.phq9_risk.is_some()
    }

    pub fn gad7_completed(&self) -> bool {
        self.gad7_risk.is_some()
    }

    pub fn phq9_risk(&self) -> Option<RiskLevel> {
        self.phq9_risk
    }

    pub fn gad7_risk(&self) -> Option<RiskLevel> {
        self.gad7_risk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(screening: Screening, level: RiskLevel) -> Completion {
        Completion {
            screening,
            total: 0,
            level,
        }
    }

    #[test]
    fn test_first_prompt_after_two_exchanges() {
        let mut state = ConversationState::new();
        state.record_exchange();
        assert_eq!(state.should_prompt_for_test(false), None);
        state.record_exchange();
        assert_eq!(state.should_prompt_for_test(false), Some(Screening::Depression));
    }

    #[test]
    fn test_no_prompt_while_active_or_outstanding() {
        let mut state = ConversationState::new();
        state.record_exchange();
        state.record_exchange();
        assert_eq!(state.should_prompt_for_test(true), None);
        state.mark_prompted();
        assert_eq!(state.should_prompt_for_test(false), None);
    }

    #[test]
    fn test_decline_phq9_resets_decline_counter() {
        let mut state = ConversationState::new();
        state.record_exchange();
        state.record_exchange();
        state.mark_prompted();
        state.decline(Screening::Depression);

        assert!(!state.prompted_for_test());
        assert_eq!(state.test_declined_count(), 1);
        assert_eq!(state.chats_since_decline(), 0);

        state.record_exchange();
        assert_eq!(state.chats_since_decline(), 1);
        // exchange_count is already past the threshold, so rule 1 fires.
        assert_eq!(state.should_prompt_for_test(false), Some(Screening::Depression));
    }

    #[test]
    fn test_gad7_cadence_after_phq9() {
        let mut state = ConversationState::new();
        state.record_exchange();
        state.record_exchange();
        state.record_completion(&completion(Screening::Depression, RiskLevel::Moderate));
        assert_eq!(state.post_phq_exchanges(), 0);
        assert_eq!(state.should_prompt_for_test(false), None);

        state.record_exchange();
        assert_eq!(state.should_prompt_for_test(false), None);
        state.record_exchange();
        assert_eq!(state.post_phq_exchanges(), 2);
        assert_eq!(state.should_prompt_for_test(false), Some(Screening::Anxiety));

        state.mark_prompted();
        state.decline(Screening::Anxiety);
        assert_eq!(state.post_phq_exchanges(), 0);
        assert_eq!(state.test_declined_count(), 0);
        assert_eq!(state.should_prompt_for_test(false), None);
    }

    #[test]
    fn test_post_phq_counter_stops_after_gad7() {
        let mut state = ConversationState::new();
        state.record_completion(&completion(Screening::Depression, RiskLevel::Low));
        state.record_completion(&completion(Screening::Anxiety, RiskLevel::Low));
        state.record_exchange();
        state.record_exchange();
        assert_eq!(state.post_phq_exchanges(), 0);
        assert_eq!(state.should_prompt_for_test(false), None);
    }

    #[test]
    fn test_can_start_enforces_order() {
        let mut state = ConversationState::new();
        assert!(state.can_start(Screening::Depression));
        assert!(!state.can_start(Screening::Anxiety));
        state.record_completion(&completion(Screening::Depression, RiskLevel::High));
        assert!(state.can_start(Screening::Anxiety));
    }

    #[test]
    fn test_overall_risk() {
        let mut state = ConversationState::new();
        assert_eq!(state.overall_risk(), None);
        state.record_completion(&completion(Screening::Depression, RiskLevel::High));
        assert_eq!(state.overall_risk(), None);
        state.record_completion(&completion(Screening::Anxiety, RiskLevel::High));
        assert_eq!(state.overall_risk(), Some(RiskLevel::High));
    }
}
