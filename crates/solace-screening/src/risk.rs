//! Risk levels and the combined overall risk.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }

    /// Numeric weight used when combining levels (low=1 .. high=3).
    pub fn weight(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Moderate => 2,
            Self::High => 3,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            other => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Combine the depression and anxiety results into one level.
///
/// Undetermined (`None`) unless both are known. The two weights are
/// averaged: up to 1.5 is low, up to 2.5 moderate, above that high.
pub fn overall_risk(depression: Option<RiskLevel>, anxiety: Option<RiskLevel>) -> Option<RiskLevel> {
    let sum = depression?.weight() + anxiety?.weight();
    // avg <= 1.5 <=> sum <= 3, avg <= 2.5 <=> sum <= 5
    Some(match sum {
        0..=3 => RiskLevel::Low,
        4..=5 => RiskLevel::Moderate,
        _ => RiskLevel::High,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use RiskLevel::*;

    #[test]
    fn test_undetermined_unless_both_known() {
        assert_eq!(overall_risk(None, None), None);
        assert_eq!(overall_risk(Some(High), None), None);
        assert_eq!(overall_risk(None, Some(Low)), None);
    }

    #[test]
    fn test_combinations() {
        assert_eq!(overall_risk(Some(Low), Some(Low)), Some(Low));
        assert_eq!(overall_risk(Some(Low), Some(Moderate)), Some(Low));
        assert_eq!(overall_risk(Some(Low), Some(High)), Some(Moderate));
        assert_eq!(overall_risk(Some(Moderate), Some(Moderate)), Some(Moderate));
        assert_eq!(overall_risk(Some(Moderate), Some(High)), Some(Moderate));
        assert_eq!(overall_risk(Some(High), Some(High)), Some(High));
    }

    #[test]
    fn test_symmetric() {
        for a in [Low, Moderate, High] {
            for b in [Low, Moderate, High] {
                assert_eq!(overall_risk(Some(a), Some(b)), overall_risk(Some(b), Some(a)));
            }
        }
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(Moderate.to_string(), "moderate");
        assert_eq!(serde_json::to_string(&High).unwrap(), "\"high\"");
    }

    #[test]
    fn test_parse() {
        assert_eq!(" HIGH\n".parse::<RiskLevel>().unwrap(), High);
        assert_eq!("moderate".parse::<RiskLevel>().unwrap(), Moderate);
        assert!("severe".parse::<RiskLevel>().is_err());
    }
}
