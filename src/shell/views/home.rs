//! Home: greeting, local weather, market prices, and the tool list.

use crate::market;
use crate::model::{MarketRecord, ViewId};
use crate::shell::Context;
use crate::weather::{self, CurrentWeather};

pub struct HomeView {
    greeting: &'static str,
    weather: Option<CurrentWeather>,
    located: bool,
    market_state: String,
    prices: Vec<MarketRecord>,
}

/// Greeting for a local hour of the day.
pub fn greeting(hour: i8) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

impl HomeView {
    pub fn mount(ctx: &mut Context<'_>, hour: i8) -> Self {
        let located = ctx.location.coordinates().is_some();
        let weather = ctx.location.coordinates().and_then(|at| {
            ctx.weather
                .current(at, weather::WIDGET_VARIABLES)
                .map_err(|e| tracing::warn!(error = %e, "failed to fetch weather"))
                .ok()
        });
        let prices = market::load_or_empty(ctx.market, &ctx.market_query);
        Self {
            greeting: greeting(hour),
            weather,
            located,
            market_state: ctx
                .market_query
                .filters
                .get("State")
                .cloned()
                .unwrap_or_else(|| "India".to_string()),
            prices,
        }
    }

    pub fn render(&self, out: &mut Vec<String>) {
        out.push(format!("{}, Farmer", self.greeting));
        out.push(String::new());
        out.push(format!("Current weather: {}", self.weather_line()));
        out.push(String::new());
        out.push(format!("Market prices ({}):", self.market_state));
        out.extend(market::render(&self.prices).into_iter().map(|l| format!("  {l}")));
        out.push(String::new());
        out.push("Tools:".to_string());
        for view in [ViewId::Disease, ViewId::Crop, ViewId::Fertilizer] {
            out.push(format!("  go {:<11} {}", view.path().trim_start_matches('/'), view.title()));
        }
    }

    fn weather_line(&self) -> String {
        match &self.weather {
            Some(CurrentWeather {
                temperature_2m: Some(t),
                weathercode,
                ..
            }) => {
                let description = weathercode.map_or("Unknown conditions", weather::describe_code);
                format!("{}°C, {description}", t.round())
            }
            Some(_) => "unavailable".to_string(),
            None if self.located => "unavailable".to_string(),
            None => "enable location to see local weather".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_by_hour() {
        assert_eq!(greeting(0), "Good morning");
        assert_eq!(greeting(11), "Good morning");
        assert_eq!(greeting(12), "Good afternoon");
        assert_eq!(greeting(17), "Good afternoon");
        assert_eq!(greeting(18), "Good evening");
        assert_eq!(greeting(23), "Good evening");
    }

    #[test]
    fn weather_line_without_location() {
        let view = HomeView {
            greeting: "Good morning",
            weather: None,
            located: false,
            market_state: "Tamil Nadu".to_string(),
            prices: Vec::new(),
        };
        assert_eq!(view.weather_line(), "enable location to see local weather");
    }

    #[test]
    fn weather_line_rounds_temperature() {
        let view = HomeView {
            greeting: "Good evening",
            weather: Some(CurrentWeather {
                temperature_2m: Some(31.6),
                weathercode: Some(61),
                ..CurrentWeather::default()
            }),
            located: true,
            market_state: "Tamil Nadu".to_string(),
            prices: Vec::new(),
        };
        assert_eq!(view.weather_line(), "32°C, Rain");
    }
}
