//! Comment corpus access.

use async_trait::async_trait;

use skycast_common::{
    CandidateCounts, CommentCandidate, CommentCategory, SkycastError, WeatherCondition,
};

/// Candidate pool for one retrieval, split by category.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub weather: Vec<CommentCandidate>,
    pub advice: Vec<CommentCandidate>,
}

impl CandidatePool {
    pub fn from_candidates(candidates: Vec<CommentCandidate>) -> Self {
        let mut pool = Self::default();
        for c in candidates {
            match c.category {
                CommentCategory::Weather => pool.weather.push(c),
                CommentCategory::Advice => pool.advice.push(c),
            }
        }
        pool
    }

    pub fn counts(&self) -> CandidateCounts {
        CandidateCounts {
            weather: self.weather.len(),
            advice: self.advice.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weather.is_empty() || self.advice.is_empty()
    }
}

/// Read-only access to historical comments tagged with weather
/// metadata. Safe for concurrent reads.
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    async fn retrieve(
        &self,
        location_id: &str,
        condition: WeatherCondition,
    ) -> Result<CandidatePool, SkycastError>;
}

/// Explicitly constructed in-memory corpus. Retrieval keeps exact
/// condition matches plus the compatible rain bucket, falling back to
/// the full set when nothing matches.
pub struct InMemoryCorpus {
    candidates: Vec<CommentCandidate>,
}

impl InMemoryCorpus {
    pub fn new(candidates: Vec<CommentCandidate>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[async_trait]
impl CorpusProvider for InMemoryCorpus {
    async fn retrieve(
        &self,
        _location_id: &str,
        condition: WeatherCondition,
    ) -> Result<CandidatePool, SkycastError> {
        if self.candidates.is_empty() {
            return Err(SkycastError::UpstreamFetch("comment corpus is empty".to_string()));
        }

        let matching: Vec<CommentCandidate> = self
            .candidates
            .iter()
            .filter(|c| {
                c.condition == condition || (c.condition.is_rainy() && condition.is_rainy())
            })
            .cloned()
            .collect();

        let pool = CandidatePool::from_candidates(matching);
        if pool.is_empty() {
            // Nothing condition-specific — let the selector score the whole set.
            return Ok(CandidatePool::from_candidates(self.candidates.clone()));
        }
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::candidate;

    #[tokio::test]
    async fn retrieval_filters_by_condition_bucket() {
        let corpus = InMemoryCorpus::new(vec![
            candidate("晴れの一日です", CommentCategory::Weather, WeatherCondition::Clear),
            candidate("雨が降りそうです", CommentCategory::Weather, WeatherCondition::Rain),
            candidate("雷雨に注意です", CommentCategory::Weather, WeatherCondition::Thunder),
            candidate("傘をお持ちください", CommentCategory::Advice, WeatherCondition::Rain),
        ]);

        let pool = corpus.retrieve("tokyo", WeatherCondition::Rain).await.unwrap();
        // Thunder is in the compatible rain bucket; clear is not.
        assert_eq!(pool.weather.len(), 2);
        assert_eq!(pool.advice.len(), 1);
    }

    #[tokio::test]
    async fn empty_corpus_is_an_upstream_error() {
        let corpus = InMemoryCorpus::new(vec![]);
        assert!(matches!(
            corpus.retrieve("tokyo", WeatherCondition::Clear).await,
            Err(SkycastError::UpstreamFetch(_))
        ));
    }

    #[tokio::test]
    async fn no_condition_match_falls_back_to_full_set() {
        let corpus = InMemoryCorpus::new(vec![
            candidate("晴れの一日です", CommentCategory::Weather, WeatherCondition::Clear),
            candidate("お出かけ日和です", CommentCategory::Advice, WeatherCondition::Clear),
        ]);
        let pool = corpus.retrieve("tokyo", WeatherCondition::Snow).await.unwrap();
        assert_eq!(pool.counts().weather, 1);
        assert_eq!(pool.counts().advice, 1);
    }
}
