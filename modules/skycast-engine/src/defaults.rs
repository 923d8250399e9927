//! Pre-approved fallback phrases.
//!
//! Every phrase here satisfies the evaluator's default rule set
//! (length, vocabulary, format) for the condition it is keyed by.

use skycast_common::WeatherCondition;

/// Last-resort phrase when no per-condition default applies.
pub const FINAL_DEFAULT: &str = "空模様にご注意ください";

/// Fixed default comment for a condition bucket, if one is curated.
pub fn for_condition(condition: WeatherCondition) -> Option<&'static str> {
    match condition {
        WeatherCondition::Clear => Some("晴れてお出かけ日和です"),
        WeatherCondition::Cloudy => Some("雲の多い一日です"),
        WeatherCondition::Rain => Some("雨なので傘が安心です"),
        WeatherCondition::HeavyRain => Some("雨脚が強まりそうです"),
        WeatherCondition::Thunder => Some("雷に注意しましょう"),
        WeatherCondition::Snow => Some("雪に備えてお出かけください"),
        WeatherCondition::Fog => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{EvalContext, Evaluator};
    use crate::testing::sample;
    use skycast_common::{RunSettings, Season};

    #[test]
    fn defaults_pass_their_own_condition() {
        let settings = RunSettings::default();
        let cases = [
            (WeatherCondition::Clear, 28.0, 0.0),
            (WeatherCondition::Cloudy, 22.0, 0.0),
            (WeatherCondition::Rain, 20.0, 3.0),
            (WeatherCondition::HeavyRain, 19.0, 15.0),
            (WeatherCondition::Thunder, 24.0, 1.0),
        ];
        for (condition, temp, precip) in cases {
            let dominant = sample(12, condition, temp, precip);
            let ctx = EvalContext {
                dominant: &dominant,
                season: Season::Spring,
                location_id: "tokyo",
                settings: &settings,
            };
            let text = for_condition(condition).unwrap();
            let verdict = Evaluator.evaluate_text(text, &ctx);
            assert!(verdict.valid, "{condition} default failed: {:?}", verdict.violations);
        }
    }

    #[test]
    fn final_default_is_rule_compliant_shape() {
        let len = FINAL_DEFAULT.chars().count();
        assert!((5..=15).contains(&len));
    }
}
