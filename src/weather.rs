//! Current weather from the forecast provider, keyed by coordinates.

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::http::{self, TransportError};
use crate::model::Coordinates;

/// Current-conditions variables the assistant reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    Temperature,
    RelativeHumidity,
    Rain,
    WeatherCode,
}

impl Variable {
    fn name(self) -> &'static str {
        match self {
            Self::Temperature => "temperature_2m",
            Self::RelativeHumidity => "relative_humidity_2m",
            Self::Rain => "rain",
            Self::WeatherCode => "weathercode",
        }
    }
}

/// Variables the crop form autofills from.
pub const AUTOFILL_VARIABLES: &[Variable] = &[
    Variable::Temperature,
    Variable::RelativeHumidity,
    Variable::Rain,
];

/// Variables the home view's weather widget shows.
pub const WIDGET_VARIABLES: &[Variable] = &[Variable::Temperature, Variable::WeatherCode];

/// The provider's `current` block. Any variable may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub temperature_2m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
    pub rain: Option<f64>,
    pub weathercode: Option<u16>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

/// A source of current weather.
pub trait WeatherProvider {
    fn current(
        &self,
        at: Coordinates,
        variables: &[Variable],
    ) -> Result<CurrentWeather, TransportError>;
}

/// Open-Meteo forecast API client.
pub struct OpenMeteo {
    client: Client,
    base_url: String,
}

impl OpenMeteo {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl WeatherProvider for OpenMeteo {
    fn current(
        &self,
        at: Coordinates,
        variables: &[Variable],
    ) -> Result<CurrentWeather, TransportError> {
        let current: Vec<&str> = variables.iter().map(|v| v.name()).collect();
        let request = self.client.get(&self.base_url).query(&[
            ("latitude", at.latitude.to_string()),
            ("longitude", at.longitude.to_string()),
            ("current", current.join(",")),
            ("timezone", "auto".to_string()),
        ]);
        let forecast: ForecastResponse = http::send_json(request)?;
        Ok(forecast.current)
    }
}

/// Describe a WMO weather interpretation code.
pub fn describe_code(code: u16) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 | 77 => "Snow",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown conditions",
    }
}
