use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScreeningError;
use crate::risk::RiskLevel;

const PHQ9_ITEMS: [&str; 9] = [
    "Over the last 2 weeks, how often have you had little interest or pleasure in doing things?",
    "Feeling down, depressed, or hopeless?",
    "Trouble falling or staying asleep, or sleeping too much?",
    "Feeling tired or having little energy?",
    "Poor appetite or overeating?",
    "Feeling bad about yourself — or that you are a failure?",
    "Trouble concentrating on things, like reading or watching TV?",
    "Moving or speaking so slowly that others notice? Or the opposite — being fidgety/restless?",
    "Thoughts that you would be better off dead or of hurting yourself?",
];

const GAD7_ITEMS: [&str; 7] = [
    "Feeling nervous, anxious, or on edge?",
    "Not being able to stop or control worrying?",
    "Worrying too much about different things?",
    "Trouble relaxing?",
    "Being so restless that it's hard to sit still?",
    "Becoming easily annoyed or irritable?",
    "Feeling afraid as if something awful might happen?",
];

/// One of the four fixed answers shared by both screenings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOption {
    pub label: &'static str,
    pub score: i64,
}

/// Answer options in display order, scored 0-3.
pub const ANSWER_OPTIONS: [AnswerOption; 4] = [
    AnswerOption {
        label: "Not at all",
        score: 0,
    },
    AnswerOption {
        label: "Several days",
        score: 1,
    },
    AnswerOption {
        label: "More than half the days",
        score: 2,
    },
    AnswerOption {
        label: "Nearly every day",
        score: 3,
    },
];

/// A screening questionnaire.
///
/// PHQ-9 screens for depression, GAD-7 for anxiety. GAD-7 is only offered
/// once PHQ-9 has been completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Screening {
    #[serde(rename = "PHQ9")]
    Depression,
    #[serde(rename = "GAD7")]
    Anxiety,
}

impl Screening {
    /// Short machine code ("PHQ9" / "GAD7").
    pub fn code(&self) -> &'static str {
        match self {
            Self::Depression => "PHQ9",
            Self::Anxiety => "GAD7",
        }
    }

    /// Name shown to users ("PHQ-9" / "GAD-7").
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Depression => "PHQ-9",
            Self::Anxiety => "GAD-7",
        }
    }

    /// What the screening measures, capitalised for summaries.
    pub fn condition(&self) -> &'static str {
        match self {
            Self::Depression => "Depression",
            Self::Anxiety => "Anxiety",
        }
    }

    pub fn items(&self) -> &'static [&'static str] {
        match self {
            Self::Depression => &PHQ9_ITEMS,
            Self::Anxiety => &GAD7_ITEMS,
        }
    }

    /// Score sums at which the result becomes moderate and high.
    pub fn thresholds(&self) -> (i64, i64) {
        match self {
            Self::Depression => (5, 15),
            Self::Anxiety => (5, 10),
        }
    }

    /// The screening that must be completed before this one may start.
    pub fn prerequisite(&self) -> Option<Screening> {
        match self {
            Self::Depression => None,
            Self::Anxiety => Some(Self::Depression),
        }
    }

    /// Map a score sum onto a risk level.
    pub fn classify(&self, total: i64) -> RiskLevel {
        let (moderate, high) = self.thresholds();
        if total < moderate {
            RiskLevel::Low
        } else if total < high {
            RiskLevel::Moderate
        } else {
            RiskLevel::High
        }
    }
}

impl fmt::Display for Screening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Screening {
    type Err = ScreeningError;

    /// Accepts the code or display name in any case ("PHQ9", "phq-9", "gad7").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_ascii_uppercase();
        match normalized.as_str() {
            "PHQ9" => Ok(Self::Depression),
            "GAD7" => Ok(Self::Anxiety),
            _ => Err(ScreeningError::UnknownScreening(s.to_string())),
        }
    }
}
