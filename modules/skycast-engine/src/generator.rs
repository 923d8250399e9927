//! Prompt construction, provider invocation, and the fallback chain.

use std::time::Duration;

use tracing::warn;

use llm_client::{GenerationConfig, TextGenerator};
use skycast_common::{CommentPair, ForecastSample, RunSettings};

use crate::defaults;

/// Upper bound on prompt size, in characters.
pub const PROMPT_MAX_CHARS: usize = 2000;

pub struct Generator {
    timeout: Duration,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
        }
    }
}

/// Generation result plus any degradation notes for the run log.
pub struct Generated {
    pub text: String,
    pub warnings: Vec<String>,
}

impl Generator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Produce usable text, falling through the chain on provider
    /// failure: secondary provider, per-condition default, the corpus
    /// weather candidate, then the hard-coded final default. Never
    /// errors.
    pub async fn generate(
        &self,
        dominant: &ForecastSample,
        pair: &CommentPair,
        settings: &RunSettings,
        primary: &dyn TextGenerator,
        secondary: Option<&dyn TextGenerator>,
    ) -> Generated {
        let prompt = build_prompt(dominant, pair, settings);
        let config = GenerationConfig {
            temperature: 0.7,
            max_tokens: 128,
            timeout: self.timeout,
        };
        let mut warnings = Vec::new();

        match self.invoke(primary, &prompt, &config).await {
            Ok(text) => return Generated { text, warnings },
            Err(e) => {
                warn!(error = %e, "Primary provider failed, trying fallback chain");
                warnings.push(format!("primary provider failed: {e}"));
            }
        }

        if let Some(backup) = secondary {
            match self.invoke(backup, &prompt, &config).await {
                Ok(text) => return Generated { text, warnings },
                Err(e) => {
                    warn!(error = %e, "Secondary provider failed");
                    warnings.push(format!("secondary provider failed: {e}"));
                }
            }
        }

        if let Some(text) = defaults::for_condition(dominant.condition) {
            warnings.push("fell back to per-condition default phrase".to_string());
            return Generated {
                text: text.to_string(),
                warnings,
            };
        }

        if !pair.weather.text.is_empty() {
            warnings.push("fell back to the selected corpus candidate".to_string());
            return Generated {
                text: pair.weather.text.clone(),
                warnings,
            };
        }

        warnings.push("fell back to the final default phrase".to_string());
        Generated {
            text: defaults::FINAL_DEFAULT.to_string(),
            warnings,
        }
    }

    /// Single bounded call; empty post-processed output is an error so
    /// the chain moves on.
    async fn invoke(
        &self,
        provider: &dyn TextGenerator,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, String> {
        let result = tokio::time::timeout(self.timeout, provider.generate(prompt, config)).await;
        match result {
            Ok(Ok(raw)) => {
                let text = postprocess(&raw);
                if text.is_empty() {
                    Err("provider returned empty text".to_string())
                } else {
                    Ok(text)
                }
            }
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("request timed out".to_string()),
        }
    }
}

/// Bounded prompt with the forecast summary, the selected pair as
/// style examples, and the active constraint set.
pub fn build_prompt(dominant: &ForecastSample, pair: &CommentPair, settings: &RunSettings) -> String {
    let politeness = if settings.enforce_polite {
        "です・ます調の丁寧語で書く"
    } else {
        "自然な口調で書く"
    };
    let punctuation = if settings.allow_expressive_punctuation {
        "感嘆符は1つまで"
    } else {
        "感嘆符は使わない"
    };
    let prompt = format!(
        "あなたは天気予報のひとことコメントの編集者です。\n\
         予報: 天気={} 気温={:.0}℃ 降水量={:.1}mm 時刻={}時\n\
         文体の参考例:\n\
         - 天気コメント: {}\n\
         - アドバイス: {}\n\
         制約:\n\
         - {}〜{}文字\n\
         - {}\n\
         - {}\n\
         - 警報などの強い表現、断定、俗語は使わない\n\
         コメント本文だけを1行で出力してください。",
        dominant.condition,
        dominant.temperature_c,
        dominant.precipitation_mm,
        dominant.local_hour,
        pair.weather.text,
        pair.advice.text,
        settings.min_length,
        settings.max_length,
        politeness,
        punctuation,
    );
    truncate_chars(&prompt, PROMPT_MAX_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

/// First line, trimmed, wrapping quotes/brackets stripped.
fn postprocess(raw: &str) -> String {
    let line = raw.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut text = line.trim();
    for (open, close) in [('「', '」'), ('『', '』'), ('"', '"'), ('\'', '\'')] {
        if text.starts_with(open) && text.ends_with(close) && text.chars().count() >= 2 {
            let inner: Vec<char> = text.chars().collect();
            return inner[1..inner.len() - 1].iter().collect::<String>().trim().to_string();
        }
    }
    text = text.trim();
    text.to_string()
}
