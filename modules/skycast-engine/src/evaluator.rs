//! Deterministic rule evaluation for candidate pairs and generated
//! text.
//!
//! Rules run in fixed priority order. The first failing category is
//! the headline, but every violated category is collected for
//! diagnostics. Length, vocabulary, and format are hard rules: any
//! hit zeroes the verdict confidence.

use skycast_common::vocab;
use skycast_common::{
    CommentPair, ForecastSample, RuleCategory, RuleViolation, RunSettings, Season, SeverityTier,
    ValidationVerdict, WeatherCondition,
};

use crate::selector::THUNDER_STRONG_WARNING_MIN_MM;

/// Location-id fragments for the sub-tropical region bucket, where
/// snow phrasing is invalid regardless of literal temperature.
const SUBTROPICAL_REGIONS: &[&str] = &["okinawa", "naha", "ishigaki", "miyako", "amami"];

/// Casual register markers disallowed under the polite setting.
const CASUAL_MARKERS: &[&str] = &["だね", "だよ", "じゃん", "でしょ", "っす"];

/// Hype terms; more than one reads as overexcited.
const HYPE_TERMS: &[&str] = &["最高", "絶好", "ウキウキ", "ワクワク"];

const ALLOWED_PUNCTUATION: &[char] = &['。', '、', '！', '？', '・', '「', '」'];

pub struct EvalContext<'a> {
    pub dominant: &'a ForecastSample,
    pub season: Season,
    pub location_id: &'a str,
    pub settings: &'a RunSettings,
}

impl EvalContext<'_> {
    fn tier(&self) -> SeverityTier {
        SeverityTier::from_precipitation(self.dominant.precipitation_mm)
    }

    fn is_subtropical(&self) -> bool {
        let loc = self.location_id.to_ascii_lowercase();
        SUBTROPICAL_REGIONS.iter().any(|r| loc.contains(r))
    }
}

#[derive(Debug, Default)]
pub struct Evaluator;

impl Evaluator {
    /// Evaluate a selected corpus pair. The weather text must
    /// positively reference the forecast; the advice text only has to
    /// avoid contradicting it.
    pub fn evaluate_pair(&self, pair: &CommentPair, ctx: &EvalContext) -> ValidationVerdict {
        let mut violations = check_text(&pair.weather.text, ctx, true);
        violations.extend(check_text(&pair.advice.text, ctx, false));
        build_verdict(violations)
    }

    /// Evaluate generated output text against the full rule set.
    pub fn evaluate_text(&self, text: &str, ctx: &EvalContext) -> ValidationVerdict {
        build_verdict(check_text(text, ctx, true))
    }
}

fn build_verdict(mut violations: Vec<RuleViolation>) -> ValidationVerdict {
    let order = |c: RuleCategory| RuleCategory::ALL.iter().position(|x| *x == c).unwrap_or(5);
    violations.sort_by_key(|v| order(v.category));

    if violations.is_empty() {
        return ValidationVerdict::pass();
    }

    let hard = violations.iter().any(|v| {
        matches!(
            v.category,
            RuleCategory::Length | RuleCategory::Vocabulary | RuleCategory::Format
        )
    });
    let failed_categories: usize = {
        let mut cats: Vec<RuleCategory> = violations.iter().map(|v| v.category).collect();
        cats.dedup();
        cats.len()
    };
    let confidence = if hard {
        0.0
    } else {
        (RuleCategory::ALL.len() - failed_categories) as f64 / RuleCategory::ALL.len() as f64
    };

    ValidationVerdict {
        valid: false,
        violations,
        confidence,
    }
}

fn check_text(text: &str, ctx: &EvalContext, require_reference: bool) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    check_length(text, ctx, &mut violations);
    check_vocabulary(text, ctx, &mut violations);
    check_format(text, ctx, &mut violations);
    check_relevance(text, ctx, require_reference, &mut violations);
    check_tone(text, ctx, &mut violations);
    violations
}

fn check_length(text: &str, ctx: &EvalContext, out: &mut Vec<RuleViolation>) {
    let len = text.chars().count();
    let (min, max) = (ctx.settings.min_length, ctx.settings.max_length);
    if len < min || len > max {
        out.push(RuleViolation {
            category: RuleCategory::Length,
            reason: format!("length {len} outside {min}..={max}"),
        });
    }
}

fn check_vocabulary(text: &str, ctx: &EvalContext, out: &mut Vec<RuleViolation>) {
    for (category, term) in vocab::ng_violations(text) {
        out.push(RuleViolation {
            category: RuleCategory::Vocabulary,
            reason: format!("NG term {term:?} ({category:?})"),
        });
    }

    if vocab::contains_strong_warning(text) {
        let tier = ctx.tier();
        if tier.forbids_strong_warning() {
            out.push(RuleViolation {
                category: RuleCategory::Vocabulary,
                reason: format!("strong-warning wording under {tier:?} precipitation tier"),
            });
        } else if ctx.dominant.condition == WeatherCondition::Thunder
            && ctx.dominant.precipitation_mm < THUNDER_STRONG_WARNING_MIN_MM
        {
            out.push(RuleViolation {
                category: RuleCategory::Vocabulary,
                reason: "thunder without heavy precipitation permits only mild caution".to_string(),
            });
        }
    }
}

fn check_format(text: &str, ctx: &EvalContext, out: &mut Vec<RuleViolation>) {
    if text.chars().any(|c| c.is_ascii_alphabetic()) {
        out.push(RuleViolation {
            category: RuleCategory::Format,
            reason: "latin-script word in output".to_string(),
        });
    }

    if let Some(bad) = text.chars().find(|c| !is_allowed_char(*c)) {
        out.push(RuleViolation {
            category: RuleCategory::Format,
            reason: format!("disallowed character {bad:?}"),
        });
    }

    let exclamations = text.chars().filter(|c| *c == '！' || *c == '!').count();
    let max_exclamations = usize::from(ctx.settings.allow_expressive_punctuation);
    if exclamations > max_exclamations {
        out.push(RuleViolation {
            category: RuleCategory::Format,
            reason: format!("{exclamations} exclamation terminators (max {max_exclamations})"),
        });
    }

    if ctx.settings.enforce_polite && !ends_polite(text) {
        out.push(RuleViolation {
            category: RuleCategory::Format,
            reason: "polite register required".to_string(),
        });
    }
}

fn check_relevance(
    text: &str,
    ctx: &EvalContext,
    require_reference: bool,
    out: &mut Vec<RuleViolation>,
) {
    let dominant = ctx.dominant;
    let dry = dominant.precipitation_mm <= 0.5
        && !dominant.condition.is_rainy()
        && dominant.condition != WeatherCondition::Snow;
    if dry && vocab::contains_any(text, vocab::RAIN_TERMS) {
        out.push(RuleViolation {
            category: RuleCategory::Relevance,
            reason: "rain vocabulary for a dry forecast".to_string(),
        });
    }

    if vocab::contains_any(text, vocab::SNOW_TERMS) {
        if ctx.is_subtropical() {
            out.push(RuleViolation {
                category: RuleCategory::Relevance,
                reason: "snow vocabulary for a sub-tropical region".to_string(),
            });
        } else if dominant.condition != WeatherCondition::Snow && ctx.season == Season::Summer {
            out.push(RuleViolation {
                category: RuleCategory::Relevance,
                reason: "snow vocabulary in summer".to_string(),
            });
        }
    }

    if require_reference && !references_forecast(text, ctx) {
        out.push(RuleViolation {
            category: RuleCategory::Relevance,
            reason: "does not reference the dominant condition or season".to_string(),
        });
    }
}

fn check_tone(text: &str, ctx: &EvalContext, out: &mut Vec<RuleViolation>) {
    let casual = CASUAL_MARKERS.iter().filter(|m| text.contains(*m)).count();
    let max_casual = if ctx.settings.enforce_polite { 0 } else { 1 };
    if casual > max_casual {
        out.push(RuleViolation {
            category: RuleCategory::Tone,
            reason: format!("{casual} casual register markers"),
        });
    }

    let hype = HYPE_TERMS.iter().filter(|m| text.contains(*m)).count();
    if hype > 1 {
        out.push(RuleViolation {
            category: RuleCategory::Tone,
            reason: "overexcited phrasing".to_string(),
        });
    }
}

/// Vocabulary that counts as referencing the dominant condition.
fn condition_terms(condition: WeatherCondition, temperature_c: f64) -> Vec<&'static [&'static str]> {
    let mut terms: Vec<&[&str]> = match condition {
        WeatherCondition::Clear => vec![vocab::CLEAR_TERMS],
        WeatherCondition::Cloudy => vec![vocab::CLOUDY_TERMS],
        WeatherCondition::Rain | WeatherCondition::HeavyRain => vec![vocab::RAIN_TERMS],
        WeatherCondition::Thunder => vec![vocab::THUNDER_TERMS, vocab::RAIN_TERMS],
        WeatherCondition::Snow => vec![vocab::SNOW_TERMS],
        WeatherCondition::Fog => vec![vocab::FOG_TERMS, vocab::CLOUDY_TERMS],
    };
    if temperature_c >= 30.0 {
        terms.push(vocab::HEAT_TERMS);
    }
    terms
}

fn references_forecast(text: &str, ctx: &EvalContext) -> bool {
    let by_condition = condition_terms(ctx.dominant.condition, ctx.dominant.temperature_c)
        .iter()
        .any(|terms| vocab::contains_any(text, terms));
    let by_season = match ctx.season {
        Season::Spring => vocab::contains_any(text, vocab::SPRING_TERMS),
        Season::Summer => vocab::contains_any(text, vocab::SUMMER_TERMS),
        Season::Autumn => vocab::contains_any(text, vocab::AUTUMN_TERMS),
        Season::Winter => vocab::contains_any(text, vocab::WINTER_TERMS),
    };
    by_condition || by_season
}

fn is_allowed_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'        // hiragana
        | '\u{30A0}'..='\u{30FF}'      // katakana (incl. ー, ・)
        | '\u{4E00}'..='\u{9FFF}'      // kanji
        | '\u{3005}'                   // 々
        | '0'..='9' | '％' | '℃'
    ) || ALLOWED_PUNCTUATION.contains(&c)
}

fn ends_polite(text: &str) -> bool {
    let trimmed = text.trim_end_matches(['。', '！', '？', '!']);
    ["です", "ます", "ましょう", "ません", "ください", "でしょう"]
        .iter()
        .any(|suffix| trimmed.ends_with(suffix))
}
