//! Location provider: one process-wide cached position.
//!
//! The application root owns the provider, acquires a reading once per
//! permission grant, and hands shared references to any view that needs
//! coordinates. Views never ask the sensor themselves.

use jiff::Timestamp;

use crate::model::{Coordinates, ErrorKind, LocationSample};

/// Errors from a geolocation sensor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorError {
    #[error("geolocation is not supported on this device")]
    Unsupported,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

impl SensorError {
    /// Where this failure sits in the user-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unsupported => ErrorKind::UnsupportedCapability,
            Self::Unavailable(_) => ErrorKind::TransientSensor,
        }
    }
}

/// A device that can report the current position.
pub trait GeolocationSensor {
    fn current_position(&mut self) -> Result<Coordinates, SensorError>;
}

/// A sensor with a fixed, configured position.
///
/// Used on devices without a positioning chip; with no configured
/// position it reports the capability as unsupported. A position off the
/// globe is reported as unavailable.
#[derive(Debug, Clone)]
pub struct FixedSensor {
    position: Option<Coordinates>,
}

impl FixedSensor {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }
}

impl GeolocationSensor for FixedSensor {
    fn current_position(&mut self) -> Result<Coordinates, SensorError> {
        let position = self.position.ok_or(SensorError::Unsupported)?;
        if !(-90.0..=90.0).contains(&position.latitude)
            || !(-180.0..=180.0).contains(&position.longitude)
        {
            return Err(SensorError::Unavailable(format!(
                "{}, {} is not a valid position",
                position.latitude, position.longitude
            )));
        }
        Ok(position)
    }
}

/// Init-once, read-many holder of the cached [`LocationSample`].
#[derive(Debug, Default)]
pub struct LocationProvider {
    sample: Option<LocationSample>,
}

impl LocationProvider {
    /// Starts with a previously persisted sample, if any.
    pub fn new(cached: Option<LocationSample>) -> Self {
        Self { sample: cached }
    }

    /// The cached sample, if a reading has ever succeeded.
    pub fn sample(&self) -> Option<&LocationSample> {
        self.sample.as_ref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.sample.as_ref().map(LocationSample::coordinates)
    }

    /// Ask the sensor for a reading and cache it on success.
    ///
    /// A failure leaves any earlier sample in place.
    pub fn acquire(
        &mut self,
        sensor: &mut dyn GeolocationSensor,
    ) -> Result<&LocationSample, SensorError> {
        match sensor.current_position() {
            Ok(position) => {
                tracing::info!(
                    latitude = position.latitude,
                    longitude = position.longitude,
                    "location obtained"
                );
                Ok(self.record(position))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to get location");
                Err(e)
            }
        }
    }

    /// Record a successful reading.
    pub fn record(&mut self, position: Coordinates) -> &LocationSample {
        self.sample.insert(LocationSample {
            latitude: position.latitude,
            longitude: position.longitude,
            captured_at_least_once: true,
            captured_at: Timestamp::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakySensor {
        answers: Vec<Result<Coordinates, SensorError>>,
    }

    impl GeolocationSensor for FlakySensor {
        fn current_position(&mut self) -> Result<Coordinates, SensorError> {
            self.answers.remove(0)
        }
    }

    const CHENNAI: Coordinates = Coordinates {
        latitude: 13.08,
        longitude: 80.27,
    };

    #[test]
    fn acquire_caches_sample() {
        let mut provider = LocationProvider::default();
        let mut sensor = FixedSensor::new(Some(CHENNAI));

        let sample = provider.acquire(&mut sensor).unwrap();
        assert!(sample.captured_at_least_once);
        assert_eq!(provider.coordinates(), Some(CHENNAI));
    }

    #[test]
    fn unsupported_without_position() {
        let mut provider = LocationProvider::default();
        let err = provider
            .acquire(&mut FixedSensor::new(None))
            .unwrap_err();
        assert_eq!(err, SensorError::Unsupported);
        assert!(provider.sample().is_none());
    }

    #[test]
    fn failure_keeps_previous_sample() {
        let mut provider = LocationProvider::default();
        let mut sensor = FlakySensor {
            answers: vec![Ok(CHENNAI), Err(SensorError::Unavailable("timeout".to_string()))],
        };
        provider.acquire(&mut sensor).unwrap();
        assert_eq!(
            provider.acquire(&mut sensor).unwrap_err(),
            SensorError::Unavailable("timeout".to_string())
        );
        assert_eq!(provider.coordinates(), Some(CHENNAI));
    }

    #[test]
    fn off_globe_position_is_unavailable() {
        let mut sensor = FixedSensor::new(Some(Coordinates {
            latitude: 130.0,
            longitude: 80.27,
        }));
        let err = sensor.current_position().unwrap_err();
        assert!(matches!(err, SensorError::Unavailable(_)));
        assert_eq!(err.kind(), ErrorKind::TransientSensor);
        assert_eq!(SensorError::Unsupported.kind(), ErrorKind::UnsupportedCapability);
    }
}
