//! Risk assessment
//!
//! Additive point scoring over mainshock size, day-one rate and the
//! probability of strong aftershocks. Within the magnitude group and the
//! rate group only the highest matching band scores; the two probability
//! rules are independent.

use super::gutenberg_richter::MagnitudeProbabilities;
use serde::Serialize;

/// Score at or above which the level is CRITICAL
pub const CRITICAL_SCORE: u32 = 70;
/// Score at or above which the level is HIGH
pub const HIGH_SCORE: u32 = 50;
/// Score at or above which the level is ELEVATED
pub const ELEVATED_SCORE: u32 = 30;

/// `(minimum magnitude, points, factor)`, highest band first
const MAGNITUDE_BANDS: [(f64, u32, &str); 3] = [
    (7.0, 40, "Very large mainshock (M≥7.0)"),
    (6.0, 25, "Large mainshock (M≥6.0)"),
    (5.0, 15, "Moderate mainshock (M≥5.0)"),
];

/// `(rate strictly above, points, factor)`, highest band first
const RATE_BANDS: [(f64, u32, &str); 3] = [
    (50.0, 30, "Very high aftershock rate expected"),
    (20.0, 20, "High aftershock rate expected"),
    (5.0, 10, "Moderate aftershock rate expected"),
];

/// `(threshold magnitude, probability strictly above, points, factor)`
const PROBABILITY_RULES: [(f64, f64, u32, &str); 2] = [
    (5.0, 0.5, 20, "High probability of M≥5.0 aftershocks"),
    (6.0, 0.2, 10, "Significant probability of M≥6.0 aftershocks"),
];

/// Qualitative risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Moderate,
    Elevated,
    High,
    Critical,
}

/// Fixed presentation data attached to a level
#[derive(Debug)]
pub struct LevelProfile {
    pub color: &'static str,
    pub description: &'static str,
    pub recommendations: [&'static str; 5],
}

static CRITICAL: LevelProfile = LevelProfile {
    color: "#dc2626",
    description: "Extremely high risk of damaging aftershocks",
    recommendations: [
        "Evacuate damaged buildings immediately",
        "Prepare for multiple strong aftershocks",
        "Keep emergency supplies readily accessible",
        "Follow official evacuation orders",
        "Stay away from damaged infrastructure",
    ],
};

static HIGH: LevelProfile = LevelProfile {
    color: "#f59e0b",
    description: "High risk of significant aftershocks",
    recommendations: [
        "Avoid damaged or weakened structures",
        "Keep emergency kit prepared",
        "Monitor official updates frequently",
        "Have evacuation plan ready",
        "Check on vulnerable neighbors",
    ],
};

static ELEVATED: LevelProfile = LevelProfile {
    color: "#fbbf24",
    description: "Elevated risk of aftershocks",
    recommendations: [
        "Stay alert for aftershocks",
        "Inspect buildings for damage",
        "Prepare emergency supplies",
        "Stay informed via local authorities",
        "Plan safe locations in your area",
    ],
};

static MODERATE: LevelProfile = LevelProfile {
    color: "#10b981",
    description: "Moderate aftershock activity expected",
    recommendations: [
        "Be aware of aftershock possibility",
        "Check for any minor damage",
        "Keep emergency contacts handy",
        "Follow standard earthquake safety",
        "Monitor for updates",
    ],
};

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        if score >= CRITICAL_SCORE {
            RiskLevel::Critical
        } else if score >= HIGH_SCORE {
            RiskLevel::High
        } else if score >= ELEVATED_SCORE {
            RiskLevel::Elevated
        } else {
            RiskLevel::Moderate
        }
    }

    pub fn profile(&self) -> &'static LevelProfile {
        match self {
            RiskLevel::Critical => &CRITICAL,
            RiskLevel::High => &HIGH,
            RiskLevel::Elevated => &ELEVATED,
            RiskLevel::Moderate => &MODERATE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::High => "HIGH",
            RiskLevel::Elevated => "ELEVATED",
            RiskLevel::Moderate => "MODERATE",
        }
    }
}

/// Scored risk with its explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u32,
    pub color: &'static str,
    pub description: &'static str,
    pub factors: Vec<&'static str>,
    pub recommendations: &'static [&'static str; 5],
}

/// Score a mainshock from its magnitude, day-one rate and exceedance probabilities
pub fn assess(
    mainshock_magnitude: f64,
    day1_rate: f64,
    probabilities: &MagnitudeProbabilities,
) -> RiskAssessment {
    let mut score: u32 = 0;
    let mut factors = Vec::new();

    if let Some((_, points, factor)) = MAGNITUDE_BANDS
        .iter()
        .find(|(min, _, _)| mainshock_magnitude >= *min)
    {
        score += *points;
        factors.push(*factor);
    }

    if let Some((_, points, factor)) = RATE_BANDS.iter().find(|(above, _, _)| day1_rate > *above) {
        score += *points;
        factors.push(*factor);
    }

    for (magnitude, above, points, factor) in PROBABILITY_RULES {
        let fires = probabilities
            .get(magnitude)
            .map(|entry| entry.probability > above)
            .unwrap_or(false);
        if fires {
            score += points;
            factors.push(factor);
        }
    }

    let level = RiskLevel::from_score(score);
    let profile = level.profile();

    RiskAssessment {
        level,
        score,
        color: profile.color,
        description: profile.description,
        factors,
        recommendations: &profile.recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GrParams, DEFAULT_THRESHOLDS};
    use crate::predictor::gutenberg_richter::magnitude_probabilities;

    fn no_probabilities() -> MagnitudeProbabilities {
        MagnitudeProbabilities::default()
    }

    #[test]
    fn test_score_boundaries() {
        assert_eq!(RiskLevel::from_score(70), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_score(30), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_score(29), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0), RiskLevel::Moderate);
    }

    #[test]
    fn test_magnitude_bands_are_exclusive() {
        assert_eq!(assess(7.5, 0.0, &no_probabilities()).score, 40);
        assert_eq!(assess(7.0, 0.0, &no_probabilities()).score, 40);
        assert_eq!(assess(6.9, 0.0, &no_probabilities()).score, 25);
        assert_eq!(assess(5.0, 0.0, &no_probabilities()).score, 15);
        assert_eq!(assess(4.9, 0.0, &no_probabilities()).score, 0);
    }

    #[test]
    fn test_rate_bands_are_strict_and_exclusive() {
        assert_eq!(assess(4.0, 50.1, &no_probabilities()).score, 30);
        assert_eq!(assess(4.0, 50.0, &no_probabilities()).score, 20);
        assert_eq!(assess(4.0, 20.0, &no_probabilities()).score, 10);
        assert_eq!(assess(4.0, 5.0, &no_probabilities()).score, 0);
    }

    #[test]
    fn test_probability_rules_fire_independently() {
        // a=6: N(5.0)=10, N(6.0)=1 -> both rules fire
        let gr = GrParams { a_value: 6.0, b_value: 1.0 };
        let probabilities = magnitude_probabilities(&gr, 7.5, DEFAULT_THRESHOLDS);
        let risk = assess(7.5, 60.0, &probabilities);

        assert_eq!(risk.score, 40 + 30 + 20 + 10);
        assert_eq!(risk.level, RiskLevel::Critical);
        assert_eq!(risk.factors.len(), 4);
        assert_eq!(risk.factors[2], "High probability of M≥5.0 aftershocks");
        assert_eq!(risk.factors[3], "Significant probability of M≥6.0 aftershocks");
    }

    #[test]
    fn test_probability_rules_need_entries() {
        // mainshock 6.0 excludes the M6.0 threshold entirely
        let gr = GrParams { a_value: 8.0, b_value: 1.0 };
        let probabilities = magnitude_probabilities(&gr, 6.0, DEFAULT_THRESHOLDS);
        let risk = assess(6.0, 0.0, &probabilities);

        assert_eq!(risk.score, 25 + 20);
        assert_eq!(risk.level, RiskLevel::Elevated);
    }

    #[test]
    fn test_level_profile_attached() {
        let risk = assess(4.0, 0.0, &no_probabilities());

        assert_eq!(risk.level, RiskLevel::Moderate);
        assert_eq!(risk.color, "#10b981");
        assert_eq!(risk.description, "Moderate aftershock activity expected");
        assert_eq!(risk.recommendations.len(), 5);
        assert!(risk.factors.is_empty());
    }

    #[test]
    fn test_every_level_has_five_recommendations() {
        for level in [
            RiskLevel::Moderate,
            RiskLevel::Elevated,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            let profile = level.profile();
            assert_eq!(profile.recommendations.len(), 5);
            assert!(profile.color.starts_with('#'));
        }
    }

    #[test]
    fn test_serialized_level_is_uppercase() {
        let risk = assess(7.0, 25.0, &no_probabilities());
        let json = serde_json::to_value(&risk).unwrap();

        assert_eq!(json["level"], "HIGH");
        assert_eq!(json["score"], 60);
        assert_eq!(json["color"], "#f59e0b");
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 5);
    }
}
