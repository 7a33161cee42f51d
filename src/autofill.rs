//! Environmental autofill: weather and soil readings merged into a form.
//!
//! Two independent sub-pipelines feed the same [`FormState`]:
//!
//! - **Weather**: once per mount, if a cached location exists, fetch current
//!   conditions and fill temperature, humidity, and rainfall.
//! - **Soil**: on an attached soil photo, run a timed analysis and fill
//!   nitrogen, phosphorus, potassium, and pH.
//!
//! Both are split into a start step and a resolve step. The resolve step
//! checks each field's provenance when the result arrives, so a field the
//! user edited while a fill was in flight keeps the user's value.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::http::TransportError;
use crate::model::{Coordinates, Field, FormState, LocationSample};
use crate::weather::{self, CurrentWeather, WeatherProvider};

/// Errors starting an autofill.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AutofillError {
    #[error("soil analysis already running")]
    SoilAnalysisBusy,
}

/// Which fields a resolution wrote and which it dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: Vec<Field>,
    pub discarded: Vec<Field>,
}

/// A weather fetch the driver should perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherRequest {
    pub at: Coordinates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WeatherStage {
    NotStarted,
    InFlight,
    Settled,
}

/// A pseudo-random soil reading, at the sensor's native precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoilReading {
    pub nitrogen: u32,
    pub phosphorus: u32,
    pub potassium: u32,
    pub ph: f64,
}

impl SoilReading {
    /// Draw a bounded reading: N in `[40, 120)`, P and K in `[20, 80)`.
    /// pH is drawn from `[5.5, 7.5)` and then rounded to one decimal, so
    /// `7.5` itself can come out.
    pub fn simulate(rng: &mut impl Rng) -> Self {
        let ph: f64 = rng.gen_range(5.5..7.5);
        Self {
            nitrogen: rng.gen_range(40..120),
            phosphorus: rng.gen_range(20..80),
            potassium: rng.gen_range(20..80),
            ph: (ph * 10.0).round() / 10.0,
        }
    }

    fn values(&self) -> [(Field, String); 4] {
        [
            (Field::Nitrogen, self.nitrogen.to_string()),
            (Field::Phosphorus, self.phosphorus.to_string()),
            (Field::Potassium, self.potassium.to_string()),
            (Field::Ph, format!("{:.1}", self.ph)),
        ]
    }
}

/// Field values derived from current weather.
///
/// Rain defaults to zero when the provider omits it; temperature and
/// humidity are only produced when present.
pub fn weather_values(current: &CurrentWeather) -> Vec<(Field, String)> {
    let mut values = Vec::new();
    if let Some(t) = current.temperature_2m {
        values.push((Field::Temperature, t.to_string()));
    }
    if let Some(h) = current.relative_humidity_2m {
        values.push((Field::Humidity, h.to_string()));
    }
    values.push((Field::Rainfall, current.rain.unwrap_or(0.0).to_string()));
    values
}

/// Sequences both autofill sub-pipelines for one mounted view.
#[derive(Debug)]
pub struct AutofillPipeline {
    weather: WeatherStage,
    soil_ready_at: Option<Instant>,
    soil_latency: Duration,
}

impl AutofillPipeline {
    pub fn new(soil_latency: Duration) -> Self {
        Self {
            weather: WeatherStage::NotStarted,
            soil_ready_at: None,
            soil_latency,
        }
    }

    /// Start the weather sub-pipeline. Only the first call per pipeline
    /// does anything, and only when a location has been cached.
    pub fn begin_weather(&mut self, location: Option<&LocationSample>) -> Option<WeatherRequest> {
        if self.weather != WeatherStage::NotStarted {
            return None;
        }
        let Some(sample) = location else {
            tracing::debug!("no cached location; weather autofill skipped");
            self.weather = WeatherStage::Settled;
            return None;
        };
        self.weather = WeatherStage::InFlight;
        Some(WeatherRequest {
            at: sample.coordinates(),
        })
    }

    /// Merge a weather answer into the form.
    ///
    /// Failures are logged and swallowed; the fields stay as they are.
    pub fn resolve_weather(
        &mut self,
        form: &mut FormState,
        outcome: Result<CurrentWeather, TransportError>,
    ) -> Option<MergeReport> {
        if self.weather != WeatherStage::InFlight {
            return None;
        }
        self.weather = WeatherStage::Settled;
        match outcome {
            Ok(current) => Some(merge(form, weather_values(&current))),
            Err(e) => {
                tracing::warn!(error = %e, "weather autofill failed");
                None
            }
        }
    }

    /// Begin and resolve the weather sub-pipeline in one go.
    pub fn run_weather(
        &mut self,
        form: &mut FormState,
        location: Option<&LocationSample>,
        provider: &dyn WeatherProvider,
    ) -> Option<MergeReport> {
        let request = self.begin_weather(location)?;
        let outcome = provider.current(request.at, weather::AUTOFILL_VARIABLES);
        self.resolve_weather(form, outcome)
    }

    /// Start a soil analysis for an attached photo.
    ///
    /// Returns when the result will be ready. Rejected while one is running.
    pub fn attach_soil_sample(&mut self, now: Instant) -> Result<Instant, AutofillError> {
        if self.soil_busy() {
            return Err(AutofillError::SoilAnalysisBusy);
        }
        let ready_at = now + self.soil_latency;
        self.soil_ready_at = Some(ready_at);
        Ok(ready_at)
    }

    /// Whether a soil analysis is running.
    pub fn soil_busy(&self) -> bool {
        self.soil_ready_at.is_some()
    }

    /// When the running soil analysis completes.
    pub fn soil_ready_at(&self) -> Option<Instant> {
        self.soil_ready_at
    }

    /// Complete the soil analysis if its latency window has passed.
    pub fn poll_soil(
        &mut self,
        form: &mut FormState,
        now: Instant,
        rng: &mut impl Rng,
    ) -> Option<MergeReport> {
        let ready_at = self.soil_ready_at?;
        if now < ready_at {
            return None;
        }
        self.soil_ready_at = None;
        let reading = SoilReading::simulate(rng);
        tracing::debug!(?reading, "soil analysis complete");
        Some(merge(form, reading.values()))
    }
}

/// Write each value into its field only if the field is still `Unset`.
fn merge(form: &mut FormState, values: impl IntoIterator<Item = (Field, String)>) -> MergeReport {
    let mut report = MergeReport::default();
    for (field, value) in values {
        if !form.contains(field) {
            continue;
        }
        if form.autofill(field, value) {
            report.applied.push(field);
        } else {
            report.discarded.push(field);
        }
    }
    if !report.discarded.is_empty() {
        tracing::debug!(discarded = ?report.discarded, "autofill kept existing values");
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::model::Provenance;
    use crate::weather::testing::FakeWeather;

    fn sample() -> LocationSample {
        LocationSample {
            latitude: 13.08,
            longitude: 80.27,
            captured_at_least_once: true,
            captured_at: Timestamp::now(),
        }
    }

    fn spec_weather() -> CurrentWeather {
        CurrentWeather {
            temperature_2m: Some(28.4),
            relative_humidity_2m: Some(63.0),
            rain: None,
            weathercode: None,
        }
    }

    fn pipeline() -> AutofillPipeline {
        AutofillPipeline::new(Duration::from_secs(2))
    }

    #[test]
    fn weather_fills_unset_fields_with_rain_default() {
        let mut form = FormState::new(&Field::CROP);
        let provider = FakeWeather::ok(spec_weather());

        let report = pipeline()
            .run_weather(&mut form, Some(&sample()), &provider)
            .unwrap();

        assert_eq!(
            report.applied,
            vec![Field::Temperature, Field::Humidity, Field::Rainfall]
        );
        assert_eq!(form.value(Field::Temperature), Some("28.4"));
        assert_eq!(form.value(Field::Humidity), Some("63"));
        assert_eq!(form.value(Field::Rainfall), Some("0"));
        assert_eq!(form.provenance(Field::Rainfall), Provenance::AutoFilled);
    }

    #[test]
    fn weather_runs_once_per_mount() {
        let mut form = FormState::new(&Field::CROP);
        let provider = FakeWeather::ok(spec_weather());
        let mut pipeline = pipeline();

        assert!(pipeline.run_weather(&mut form, Some(&sample()), &provider).is_some());
        assert!(pipeline.run_weather(&mut form, Some(&sample()), &provider).is_none());
        assert_eq!(provider.requests.borrow().len(), 1);
    }

    #[test]
    fn no_location_skips_weather() {
        let mut form = FormState::new(&Field::CROP);
        let provider = FakeWeather::ok(spec_weather());

        assert!(pipeline().run_weather(&mut form, None, &provider).is_none());
        assert!(provider.requests.borrow().is_empty());
        assert_eq!(form.provenance(Field::Temperature), Provenance::Unset);
    }

    #[test]
    fn weather_failure_is_swallowed() {
        let mut form = FormState::new(&Field::CROP);
        let provider = FakeWeather::failing();

        assert!(pipeline().run_weather(&mut form, Some(&sample()), &provider).is_none());
        for field in [Field::Temperature, Field::Humidity, Field::Rainfall] {
            assert_eq!(form.provenance(field), Provenance::Unset);
        }
    }

    #[test]
    fn edit_during_weather_fetch_wins() {
        let mut form = FormState::new(&Field::CROP);
        let mut pipeline = pipeline();

        let request = pipeline.begin_weather(Some(&sample())).unwrap();
        assert_eq!(request.at.latitude, 13.08);

        // The user types while the fetch is in flight.
        form.edit(Field::Humidity, "80");

        let report = pipeline
            .resolve_weather(&mut form, Ok(spec_weather()))
            .unwrap();
        assert_eq!(report.discarded, vec![Field::Humidity]);
        assert_eq!(form.value(Field::Humidity), Some("80"));
        assert_eq!(form.value(Field::Temperature), Some("28.4"));
    }

    #[test]
    fn soil_fills_after_latency() {
        let mut form = FormState::new(&Field::CROP);
        let mut pipeline = pipeline();
        let mut rng = StdRng::seed_from_u64(7);
        let t0 = Instant::now();

        pipeline.attach_soil_sample(t0).unwrap();
        assert!(pipeline.soil_busy());
        assert!(pipeline.poll_soil(&mut form, t0 + Duration::from_millis(500), &mut rng).is_none());

        let report = pipeline
            .poll_soil(&mut form, t0 + Duration::from_secs(2), &mut rng)
            .unwrap();
        assert_eq!(report.applied.len(), 4);
        assert!(!pipeline.soil_busy());

        let n: u32 = form.value(Field::Nitrogen).unwrap().parse().unwrap();
        assert!((40..120).contains(&n));
        let ph = form.value(Field::Ph).unwrap();
        assert_eq!(ph.split('.').nth(1).map(str::len), Some(1));
    }

    #[test]
    fn soil_rejects_duplicate_trigger() {
        let mut pipeline = pipeline();
        let t0 = Instant::now();
        pipeline.attach_soil_sample(t0).unwrap();
        assert_eq!(
            pipeline.attach_soil_sample(t0),
            Err(AutofillError::SoilAnalysisBusy)
        );
    }

    #[test]
    fn edit_during_soil_analysis_wins() {
        let mut form = FormState::new(&Field::CROP);
        let mut pipeline = pipeline();
        let mut rng = StdRng::seed_from_u64(1);
        let t0 = Instant::now();

        pipeline.attach_soil_sample(t0).unwrap();
        form.edit(Field::Nitrogen, "abc");

        let report = pipeline
            .poll_soil(&mut form, t0 + Duration::from_secs(3), &mut rng)
            .unwrap();
        assert_eq!(report.discarded, vec![Field::Nitrogen]);
        assert_eq!(form.value(Field::Nitrogen), Some("abc"));
        assert_eq!(form.provenance(Field::Phosphorus), Provenance::AutoFilled);
    }

    #[test]
    fn soil_only_touches_fields_the_form_has() {
        let mut form = FormState::new(&Field::NUTRIENTS);
        let mut pipeline = pipeline();
        let mut rng = StdRng::seed_from_u64(3);
        let t0 = Instant::now();

        pipeline.attach_soil_sample(t0).unwrap();
        let report = pipeline
            .poll_soil(&mut form, t0 + Duration::from_secs(2), &mut rng)
            .unwrap();
        assert_eq!(report.applied, Field::NUTRIENTS.to_vec());
        assert!(!form.contains(Field::Ph));
    }

    #[test]
    fn simulated_readings_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let r = SoilReading::simulate(&mut rng);
            assert!((40..120).contains(&r.nitrogen));
            assert!((20..80).contains(&r.phosphorus));
            assert!((20..80).contains(&r.potassium));
            assert!((5.5..=7.5).contains(&r.ph));
        }
    }
}
