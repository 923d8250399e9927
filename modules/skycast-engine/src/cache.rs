//! Shared forecast cache.
//!
//! Reads are lock-free via `ArcSwap`; a refresh builds a complete new
//! map and swaps it in atomically, so readers always observe whole
//! entries — never a partially written one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};

use skycast_common::{ForecastSample, SkycastError};

use crate::forecast::ForecastProvider;

#[derive(Clone)]
struct CacheEntry {
    samples: Vec<ForecastSample>,
    fetched_at: DateTime<Utc>,
}

pub struct ForecastCache {
    inner: ArcSwap<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ForecastCache {
    /// TTL-bounded cache; entries older than `ttl` miss.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: ArcSwap::new(Arc::new(HashMap::new())),
            ttl,
        }
    }

    /// Fresh samples for a location, if cached.
    pub fn get(&self, location_id: &str) -> Option<Vec<ForecastSample>> {
        let map = self.inner.load();
        let entry = map.get(location_id)?;
        let age = (Utc::now() - entry.fetched_at).to_std().unwrap_or_default();
        if age > self.ttl {
            return None;
        }
        Some(entry.samples.clone())
    }

    /// Cache hit or provider fetch. Concurrent callers may both fetch;
    /// the last insert wins, which is harmless for identical data.
    pub async fn get_or_fetch(
        &self,
        provider: &dyn ForecastProvider,
        location_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ForecastSample>, SkycastError> {
        if let Some(samples) = self.get(location_id) {
            return Ok(samples);
        }
        let samples = provider.fetch(location_id, date).await?;
        self.insert(location_id, samples.clone());
        Ok(samples)
    }

    /// Swap in a new map containing the entry. Whole-map replacement,
    /// never field-by-field mutation of a live entry; concurrent
    /// inserts retry via `rcu` rather than dropping each other.
    pub fn insert(&self, location_id: &str, samples: Vec<ForecastSample>) {
        let entry = CacheEntry {
            samples,
            fetched_at: Utc::now(),
        };
        self.inner.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(location_id.to_string(), entry.clone());
            next
        });
    }

    pub fn len(&self) -> usize {
        self.inner.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.load().is_empty()
    }

    /// Background loop re-fetching every known location on an interval.
    pub fn spawn_refresh_loop(
        self: &Arc<Self>,
        provider: Arc<dyn ForecastProvider>,
        interval: Duration,
    ) {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let locations: Vec<String> =
                    cache.inner.load().keys().cloned().collect();
                let today = Utc::now().date_naive();
                for location in locations {
                    match provider.fetch(&location, today).await {
                        Ok(samples) => cache.insert(&location, samples),
                        Err(e) => {
                            warn!(location = location.as_str(), error = %e,
                                "Forecast refresh failed, keeping stale entry");
                        }
                    }
                }
            }
        });
        info!(interval_secs = interval.as_secs(), "Forecast refresh loop started");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample, StaticForecast};
    use skycast_common::WeatherCondition;

    #[tokio::test]
    async fn miss_fetches_then_hits() {
        let cache = ForecastCache::new(Duration::from_secs(3600));
        let provider = StaticForecast::new(vec![sample(9, WeatherCondition::Clear, 20.0, 0.0)]);

        assert!(cache.get("tokyo").is_none());
        let samples = cache
            .get_or_fetch(&provider, "tokyo", Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(provider.fetch_count(), 1);

        cache
            .get_or_fetch(&provider, "tokyo", Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(provider.fetch_count(), 1, "second call must hit the cache");
    }

    #[tokio::test]
    async fn zero_ttl_always_misses() {
        let cache = ForecastCache::new(Duration::from_secs(0));
        cache.insert("tokyo", vec![sample(9, WeatherCondition::Clear, 20.0, 0.0)]);
        // fetched_at == now is within a zero TTL only for the same instant;
        // sleep past it
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.get("tokyo").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn racing_inserts_keep_every_location() {
        let cache = Arc::new(ForecastCache::new(Duration::from_secs(3600)));
        let mut handles = Vec::new();
        for (location, hour) in [("tokyo", 9u8), ("osaka", 12u8)] {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    cache.insert(location, vec![sample(hour, WeatherCondition::Clear, 20.0, 0.0)]);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(cache.get("tokyo").is_some());
        assert!(cache.get("osaka").is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_replaces_whole_entry() {
        let cache = ForecastCache::new(Duration::from_secs(3600));
        cache.insert("tokyo", vec![sample(9, WeatherCondition::Clear, 20.0, 0.0)]);
        cache.insert("tokyo", vec![sample(12, WeatherCondition::Rain, 18.0, 3.0)]);

        let samples = cache.get("tokyo").unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].local_hour, 12);
        assert_eq!(cache.len(), 1);
    }
}
