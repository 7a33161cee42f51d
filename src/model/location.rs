//! Location: the cached position shared by every view.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair as reported by a geolocation sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The last successful geolocation reading.
///
/// Written once per permission grant, read by any view that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at_least_once: bool,
    pub captured_at: Timestamp,
}

impl LocationSample {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
