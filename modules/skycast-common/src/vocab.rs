//! Vocabulary tables for candidate filtering and output validation.
//!
//! Comments are surfaced in Japanese; all matching is plain substring
//! containment over the candidate/generated text.

use serde::{Deserialize, Serialize};

/// NG-word categories. Presence of any listed term is a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NgCategory {
    /// Disaster/alarm terms reserved for official advisories.
    Disaster,
    /// Absolute or definitive claims a forecast cannot make.
    Absolute,
    /// Informal or negative register.
    Informal,
}

pub const DISASTER_TERMS: &[&str] = &[
    "警報", "避難", "災害", "大荒れ", "猛烈", "緊急", "暴風雨", "土砂崩れ", "氾濫",
];

pub const ABSOLUTE_TERMS: &[&str] = &[
    "絶対", "必ず", "間違いなく", "確実に", "100%",
];

pub const INFORMAL_TERMS: &[&str] = &[
    "やばい", "最悪", "うざい", "ダルい", "マジ", "超",
];

/// Strong-warning terms: permitted only for genuinely severe
/// precipitation (see `SeverityTier::forbids_strong_warning` and the
/// thunder rule in the evaluator).
pub const STRONG_WARNING_TERMS: &[&str] = &[
    "警戒", "厳重", "危険", "警報", "大荒れ", "激しい雨", "荒れ",
];

/// Mild-caution terms, always allowed.
pub const MILD_CAUTION_TERMS: &[&str] = &[
    "注意", "念のため", "お気をつけ", "折りたたみ傘", "ご用心",
];

pub const RAIN_TERMS: &[&str] = &[
    "雨", "傘", "降り", "にわか雨", "ぐずつ", "雨具",
];

pub const THUNDER_TERMS: &[&str] = &["雷", "雷雨", "ゴロゴロ"];

pub const SNOW_TERMS: &[&str] = &["雪", "吹雪", "積雪", "雪かき", "粉雪"];

pub const HEAT_TERMS: &[&str] = &["暑", "猛暑", "熱中症", "真夏日", "水分補給", "日差し"];

pub const CLEAR_TERMS: &[&str] = &["晴", "青空", "日差し", "日和", "お出かけ"];

pub const CLOUDY_TERMS: &[&str] = &["曇", "雲", "すっきりしない"];

pub const FOG_TERMS: &[&str] = &["霧", "視界", "見通し"];

pub const SPRING_TERMS: &[&str] = &["春", "桜", "花粉", "ぽかぽか"];
pub const SUMMER_TERMS: &[&str] = &["夏", "熱中症", "真夏", "蒸し暑"];
pub const AUTUMN_TERMS: &[&str] = &["秋", "紅葉", "秋晴れ", "肌寒"];
pub const WINTER_TERMS: &[&str] = &["冬", "冷え込み", "防寒", "雪"];

/// Keywords that mark two comments as near-duplicates when both
/// contain the same one, independent of character overlap.
pub const SALIENT_KEYWORDS: &[&str] = &[
    "にわか雨", "急な雨", "熱中症", "紫外線", "花粉", "洗濯",
];

pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}

pub fn contains_strong_warning(text: &str) -> bool {
    contains_any(text, STRONG_WARNING_TERMS)
}

pub fn contains_mild_caution(text: &str) -> bool {
    contains_any(text, MILD_CAUTION_TERMS)
}

/// All NG terms present in the text, with their category.
pub fn ng_violations(text: &str) -> Vec<(NgCategory, &'static str)> {
    let mut found = Vec::new();
    for term in DISASTER_TERMS {
        if text.contains(term) {
            found.push((NgCategory::Disaster, *term));
        }
    }
    for term in ABSOLUTE_TERMS {
        if text.contains(term) {
            found.push((NgCategory::Absolute, *term));
        }
    }
    for term in INFORMAL_TERMS {
        if text.contains(term) {
            found.push((NgCategory::Informal, *term));
        }
    }
    found
}

/// Salient keywords shared by both texts, if any.
pub fn shared_salient_keyword(a: &str, b: &str) -> Option<&'static str> {
    SALIENT_KEYWORDS
        .iter()
        .find(|k| a.contains(*k) && b.contains(*k))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ng_detection_by_category() {
        let found = ng_violations("絶対に晴れます、やばい暑さ");
        assert!(found.contains(&(NgCategory::Absolute, "絶対")));
        assert!(found.contains(&(NgCategory::Informal, "やばい")));
        assert!(!found.iter().any(|(c, _)| *c == NgCategory::Disaster));
    }

    #[test]
    fn clean_text_has_no_ng_terms() {
        assert!(ng_violations("傘をお持ちください").is_empty());
    }

    #[test]
    fn strong_warning_vs_mild_caution() {
        assert!(contains_strong_warning("大雨に厳重警戒です"));
        assert!(!contains_strong_warning("にわか雨にご注意ください"));
        assert!(contains_mild_caution("にわか雨にご注意ください"));
    }

    #[test]
    fn shared_salient_keyword_detected() {
        assert_eq!(
            shared_salient_keyword("にわか雨に注意", "午後はにわか雨も"),
            Some("にわか雨")
        );
        assert_eq!(shared_salient_keyword("晴れです", "傘は不要です"), None);
    }
}
