//! Forecast access and the dominant-sample rule.

use async_trait::async_trait;
use chrono::NaiveDate;

use skycast_common::{ForecastSample, SeverityTier, SkycastError, WeatherCondition};

/// Fixed local sample times for a forecast day.
pub const TARGET_HOURS: [u8; 4] = [9, 12, 15, 18];

/// Upstream forecast source. Returns one sample per target hour.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn fetch(
        &self,
        location_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<ForecastSample>, SkycastError>;
}

/// Normalized view of a location's forecast samples for one day.
pub struct ForecastContext {
    samples: Vec<ForecastSample>,
}

impl ForecastContext {
    pub fn new(mut samples: Vec<ForecastSample>) -> Result<Self, SkycastError> {
        if samples.is_empty() {
            return Err(SkycastError::UpstreamFetch(
                "forecast returned no samples".to_string(),
            ));
        }
        samples.sort_by_key(|s| s.local_hour);
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    /// The single sample that represents "the" weather for the day.
    ///
    /// Priority: thunder, heavy rain (any sample ≥ 10 mm), snow,
    /// extreme heat (max ≥ 35 °C), rain, cloudy/fog, clear. Ties
    /// within a category resolve to the most extreme sample: max
    /// precipitation for the wet buckets, max temperature for heat
    /// and clear, max humidity for cloudy.
    pub fn dominant_sample(&self) -> &ForecastSample {
        if let Some(s) = self.most_precip(|s| s.condition == WeatherCondition::Thunder) {
            return s;
        }
        if let Some(s) = self.most_precip(|s| s.precipitation_mm >= 10.0) {
            return s;
        }
        if let Some(s) = self.most_precip(|s| s.condition == WeatherCondition::Snow) {
            return s;
        }
        let hottest = self
            .samples
            .iter()
            .max_by(|a, b| a.temperature_c.total_cmp(&b.temperature_c))
            .expect("context is non-empty");
        if hottest.temperature_c >= 35.0 {
            return hottest;
        }
        if let Some(s) = self.most_precip(|s| {
            s.condition == WeatherCondition::Rain || s.condition == WeatherCondition::HeavyRain
        }) {
            return s;
        }
        if let Some(s) = self
            .samples
            .iter()
            .filter(|s| {
                s.condition == WeatherCondition::Cloudy || s.condition == WeatherCondition::Fog
            })
            .max_by(|a, b| a.humidity_pct.total_cmp(&b.humidity_pct))
        {
            return s;
        }
        hottest
    }

    pub fn severity_tier(&self) -> SeverityTier {
        SeverityTier::from_precipitation(self.dominant_sample().precipitation_mm)
    }

    fn most_precip(&self, pred: impl Fn(&ForecastSample) -> bool) -> Option<&ForecastSample> {
        self.samples
            .iter()
            .filter(|s| pred(s))
            .max_by(|a, b| a.precipitation_mm.total_cmp(&b.precipitation_mm))
    }
}
