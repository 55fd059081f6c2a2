//! Canned user-facing messages.

use solace_screening::{Completion, RiskLevel, Screening};

/// Prefix on every assistant reply.
pub const REPLY_PREFIX: &str = "🧠 ";

pub const GREETING_REPLY: &str =
    "🧠 Hi there! I'm here to support you. How are you feeling today?";

pub const QUESTIONNAIRE_ERROR: &str = "🧠 It looks like there was an issue. Let's continue \
    chatting, or you can start the questionnaire again later.";

pub const GENERATION_APOLOGY: &str = "🧠 I'm sorry, I'm having trouble responding right now. \
    Could you tell me a bit more, or try again in a moment?";

/// Reply after the user turns down a screening.
pub fn decline_reply(screening: Screening) -> &'static str {
    match screening {
        Screening::Depression => {
            "🧠 No problem! We can continue chatting. I'll check in with you again later \
             about the questionnaires."
        }
        Screening::Anxiety => {
            "🧠 That's okay! We can continue our conversation. The GAD-7 can wait for \
             another time."
        }
    }
}

/// Yes/no question shown next to a pending screening prompt.
pub fn offer_question(screening: Screening) -> &'static str {
    match screening {
        Screening::Depression => "Would you like to take the PHQ-9 and GAD-7 questionnaires?",
        Screening::Anxiety => "Would you like to complete the GAD-7 questionnaire now?",
    }
}

fn upper(level: RiskLevel) -> String {
    level.as_str().to_uppercase()
}

/// Result message for a finished screening.
///
/// After GAD-7 the message also summarises both results and, when known,
/// the overall level.
pub fn completion_message(
    completion: &Completion,
    phq9: Option<RiskLevel>,
    gad7: Option<RiskLevel>,
    overall: Option<RiskLevel>,
) -> String {
    match completion.screening {
        Screening::Depression => format!(
            "✅ PHQ-9 Complete! Your depression screening result: {}\n\n\
             Great job completing the first questionnaire! Let's continue our conversation.",
            upper(completion.level)
        ),
        Screening::Anxiety => {
            let mut msg = format!(
                "✅ GAD-7 Complete! Your anxiety screening result: {}\n\n",
                upper(completion.level)
            );
            if let (Some(phq9), Some(gad7), Some(overall)) = (phq9, gad7, overall) {
                msg.push_str("📊 Overall Assessment Summary:\n");
                msg.push_str(&format!("• Depression (PHQ-9): {}\n", upper(phq9)));
                msg.push_str(&format!("• Anxiety (GAD-7): {}\n", upper(gad7)));
                msg.push_str(&format!("• Overall Risk Level: {}\n\n", upper(overall)));
            }
            msg.push_str(
                "Thank you for completing both questionnaires. This comprehensive assessment \
                 helps me better understand how to support you.",
            );
            msg
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_replies_are_prefixed() {
        assert!(GREETING_REPLY.starts_with(REPLY_PREFIX));
        assert!(QUESTIONNAIRE_ERROR.starts_with(REPLY_PREFIX));
        assert!(GENERATION_APOLOGY.starts_with(REPLY_PREFIX));
        assert!(decline_reply(Screening::Depression).starts_with(REPLY_PREFIX));
        assert!(decline_reply(Screening::Anxiety).starts_with(REPLY_PREFIX));
    }

    #[test]
    fn test_phq9_completion_message() {
        let c = Completion {
            screening: Screening::Depression,
            total: 9,
            level: RiskLevel::Moderate,
        };
        let msg = completion_message(&c, Some(RiskLevel::Moderate), None, None);
        assert!(msg.starts_with("✅ PHQ-9 Complete!"));
        assert!(msg.contains("MODERATE"));
    }

    #[test]
    fn test_gad7_completion_summary() {
        let c = Completion {
            screening: Screening::Anxiety,
            total: 12,
            level: RiskLevel::High,
        };
        let msg = completion_message(
            &c,
            Some(RiskLevel::Low),
            Some(RiskLevel::High),
            Some(RiskLevel::Moderate),
        );
        assert!(msg.contains("Depression (PHQ-9): LOW"));
        assert!(msg.contains("Anxiety (GAD-7): HIGH"));
        assert!(msg.contains("Overall Risk Level: MODERATE"));
    }
}
