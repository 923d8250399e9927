use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Categorical weather condition for a forecast sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Clear,
    Cloudy,
    Rain,
    HeavyRain,
    Thunder,
    Snow,
    Fog,
}

impl WeatherCondition {
    /// Rain-like conditions share candidate vocabulary when matching.
    pub fn is_rainy(&self) -> bool {
        matches!(
            self,
            WeatherCondition::Rain | WeatherCondition::HeavyRain | WeatherCondition::Thunder
        )
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Rain => "rain",
            WeatherCondition::HeavyRain => "heavy_rain",
            WeatherCondition::Thunder => "thunder",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Fog => "fog",
        };
        f.write_str(s)
    }
}

/// One forecast sample for a location at a fixed local time.
/// Immutable once fetched; owned by the run that fetched it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub location_id: String,
    pub at: DateTime<Utc>,
    /// Local hour of the sample (one of the fixed target hours).
    pub local_hour: u8,
    pub temperature_c: f64,
    pub precipitation_mm: f64,
    pub humidity_pct: f64,
    pub wind_speed_ms: f64,
    pub condition: WeatherCondition,
}

/// Discretized precipitation band governing how strong the permitted
/// wording may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    None,
    Light,
    Moderate,
    Heavy,
    VeryHeavy,
}

impl SeverityTier {
    pub fn from_precipitation(mm: f64) -> Self {
        if mm <= 0.5 {
            SeverityTier::None
        } else if mm <= 2.0 {
            SeverityTier::Light
        } else if mm <= 10.0 {
            SeverityTier::Moderate
        } else if mm <= 30.0 {
            SeverityTier::Heavy
        } else {
            SeverityTier::VeryHeavy
        }
    }

    /// Tiers at or below `light` forbid strong-warning vocabulary
    /// regardless of the condition label.
    pub fn forbids_strong_warning(&self) -> bool {
        matches!(self, SeverityTier::None | SeverityTier::Light)
    }
}

/// Season derived from the target month (northern hemisphere).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub fn from_time(at: DateTime<Utc>) -> Self {
        match at.month() {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Autumn,
            _ => Season::Winter,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentCategory {
    Weather,
    Advice,
}

/// A historical comment with the weather metadata it was written for.
/// Immutable; owned by the corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentCandidate {
    pub text: String,
    pub category: CommentCategory,
    pub condition: WeatherCondition,
    pub temp_min_c: f64,
    pub temp_max_c: f64,
    pub precip_min_mm: f64,
    pub precip_max_mm: f64,
    /// Local hour the comment was originally written for.
    pub local_hour: u8,
    pub recorded_at: DateTime<Utc>,
}

impl CommentCandidate {
    pub fn matches_temperature(&self, temp_c: f64) -> bool {
        temp_c >= self.temp_min_c && temp_c <= self.temp_max_c
    }

    pub fn matches_precipitation(&self, mm: f64) -> bool {
        mm >= self.precip_min_mm && mm <= self.precip_max_mm
    }
}

/// Per-factor score contributions recorded with a selected pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    pub condition_score: f64,
    pub temperature_score: f64,
    pub time_score: f64,
}

/// A matched (weather, advice) tuple with its fit score.
/// Created fresh per selection attempt; discarded if rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentPair {
    pub weather: CommentCandidate,
    pub advice: CommentCandidate,
    pub score: f64,
    pub criteria: SelectionCriteria,
}

/// Rule categories in fixed evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    Length,
    Vocabulary,
    Format,
    Relevance,
    Tone,
}

impl RuleCategory {
    pub const ALL: [RuleCategory; 5] = [
        RuleCategory::Length,
        RuleCategory::Vocabulary,
        RuleCategory::Format,
        RuleCategory::Relevance,
        RuleCategory::Tone,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub category: RuleCategory,
    pub reason: String,
}

/// Structured evaluation result. Consumed immediately by the engine;
/// not persisted beyond the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub valid: bool,
    /// All violated categories, ordered by rule priority. The first
    /// entry is the short-circuit headline.
    pub violations: Vec<RuleViolation>,
    /// Fraction of categories passed; 0.0 on any hard failure.
    pub confidence: f64,
}

impl ValidationVerdict {
    pub fn pass() -> Self {
        Self {
            valid: true,
            violations: Vec::new(),
            confidence: 1.0,
        }
    }

    pub fn headline(&self) -> Option<&RuleViolation> {
        self.violations.first()
    }
}

/// Candidate pool sizes captured when the pool snapshot is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateCounts {
    pub weather: usize,
    pub advice: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn severity_tier_boundaries() {
        assert_eq!(SeverityTier::from_precipitation(0.0), SeverityTier::None);
        assert_eq!(SeverityTier::from_precipitation(0.5), SeverityTier::None);
        assert_eq!(SeverityTier::from_precipitation(0.6), SeverityTier::Light);
        assert_eq!(SeverityTier::from_precipitation(2.0), SeverityTier::Light);
        assert_eq!(SeverityTier::from_precipitation(10.0), SeverityTier::Moderate);
        assert_eq!(SeverityTier::from_precipitation(30.0), SeverityTier::Heavy);
        assert_eq!(SeverityTier::from_precipitation(30.1), SeverityTier::VeryHeavy);
    }

    #[test]
    fn low_tiers_forbid_strong_warning() {
        assert!(SeverityTier::None.forbids_strong_warning());
        assert!(SeverityTier::Light.forbids_strong_warning());
        assert!(!SeverityTier::Moderate.forbids_strong_warning());
    }

    #[test]
    fn season_from_month() {
        let t = |m| Utc.with_ymd_and_hms(2025, m, 10, 0, 0, 0).unwrap();
        assert_eq!(Season::from_time(t(4)), Season::Spring);
        assert_eq!(Season::from_time(t(7)), Season::Summer);
        assert_eq!(Season::from_time(t(10)), Season::Autumn);
        assert_eq!(Season::from_time(t(1)), Season::Winter);
        assert_eq!(Season::from_time(t(12)), Season::Winter);
    }

    #[test]
    fn condition_serde_is_snake_case() {
        let json = serde_json::to_string(&WeatherCondition::HeavyRain).unwrap();
        assert_eq!(json, r#""heavy_rain""#);
    }
}
