//! CLI interface for Krishi.
//!
//! With no subcommand, `krishi` opens the interactive shell. The other
//! subcommands are one-shot: arguments in, rendered result out.
//!
//! Settings come from `~/.krishi/config.toml`, then `KRISHI_*` environment
//! variables, then flags.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::blocking::Client;

use crate::autofill::AutofillPipeline;
use crate::config::Config;
use crate::deferred::DeferredActionChannel;
use crate::http;
use crate::location::{FixedSensor, GeolocationSensor, LocationProvider};
use crate::market::{self, DataGovMarket, MarketPrices, MarketQuery};
use crate::model::{Coordinates, Field, FormState, Route, SubmissionResult};
use crate::service::{HttpAgronomyService, ImageUpload};
use crate::shell::{Context, Shell};
use crate::speech::{CommandSpeaker, ConsoleSpeaker, MutedSpeaker, PromptRecognizer, Speaker};
use crate::storage::{self, Storage};
use crate::submission::{AdviceForm, CropForm, DiagnosisForm, FertilizerForm, SubmissionOrchestrator};
use crate::voice::{Navigator, VoiceSessionController};
use crate::weather::{self, OpenMeteo, Variable, WeatherProvider};

/// Krishi: a voice-driven farming assistant.
#[derive(Debug, Parser)]
#[command(name = "krishi", version, after_long_help = USAGE_HELP)]
pub struct Cli {
    /// Backend base URL. Overrides the config file and `KRISHI_API_URL`.
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Diagnostics on stderr: -v info, -vv debug, -vvv trace.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Append JSON trace lines to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Don't read feedback aloud.
    #[arg(long, global = true)]
    pub mute: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

const USAGE_HELP: &str = r#"Shell:
  krishi                          open the home view
  krishi shell --view /crop       start on the crop advisor
  krishi shell --view "/disease?camera=true"

One-shot:
  krishi diagnose leaf.jpg
  krishi crop --nitrogen 90 --phosphorus 42 --potassium 43 --ph 6.5
  krishi fertilizer --crop "Kidney Beans" --nitrogen 50 --phosphorus 40 --potassium 30
  krishi locate --lat 13.08 --lon 80.27
  krishi weather
  krishi market --state Kerala --commodity Banana
  krishi classify open the camera to check for disease"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive shell (the default).
    Shell {
        /// Starting route, e.g. `/crop` or `/disease?camera=true`.
        #[arg(long, default_value = "/")]
        view: String,
    },

    /// Diagnose a plant disease from a leaf photo.
    Diagnose {
        /// Path to the photo.
        image: PathBuf,
    },

    /// Recommend a crop from soil and climate readings.
    ///
    /// Temperature, humidity, and rainfall left out are filled from current
    /// weather at the cached location.
    Crop {
        #[arg(long, allow_negative_numbers = true)]
        nitrogen: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        phosphorus: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        potassium: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        humidity: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        rainfall: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        ph: Option<String>,
    },

    /// Fertilizer advice for a crop and its N/P/K readings.
    Fertilizer {
        /// Crop name, e.g. "Kidney Beans".
        #[arg(long)]
        crop: String,
        #[arg(long, allow_negative_numbers = true)]
        nitrogen: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        phosphorus: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        potassium: Option<String>,
    },

    /// Show mandi prices.
    Market {
        /// State filter. Defaults to `market-state` from config.
        #[arg(long)]
        state: Option<String>,

        /// Commodity filter, e.g. "Tomato".
        #[arg(long)]
        commodity: Option<String>,

        #[arg(long)]
        limit: Option<u32>,

        #[arg(long, default_value_t = 0)]
        offset: u32,
    },

    /// Show current weather at the cached location.
    Weather,

    /// Record the current position.
    ///
    /// With `--lat` and `--lon` the given position is recorded; otherwise
    /// the configured sensor position is read.
    Locate {
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Classify a spoken command and show where it leads.
    Classify {
        /// The utterance, e.g. `open crop advisor`.
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },
}

/// Shared runtime pieces built from configuration.
struct App {
    config: Config,
    storage: Option<Storage>,
    client: Client,
    mute: bool,
}

impl App {
    fn new(cli: &Cli) -> Result<Self, String> {
        let mut config = Config::load().map_err(|e| e.to_string())?;
        if let Some(url) = &cli.api_url {
            config.api_base_url.clone_from(url);
        }
        let storage = Storage::default_root().and_then(|root| match Storage::new(&root) {
            Ok(storage) => Some(storage),
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "storage unavailable");
                None
            }
        });
        let client = http::build_client(config.timeout_ms)
            .map_err(|e| format!("failed to set up HTTP client: {e}"))?;
        Ok(Self {
            config,
            storage,
            client,
            mute: cli.mute,
        })
    }

    fn service(&self) -> HttpAgronomyService {
        HttpAgronomyService::new(self.client.clone(), &self.config.api_base_url)
    }

    fn weather(&self) -> OpenMeteo {
        OpenMeteo::new(self.client.clone(), &self.config.weather_base_url)
    }

    fn market(&self) -> DataGovMarket {
        DataGovMarket::new(
            self.client.clone(),
            &self.config.market_base_url,
            &self.config.market_api_key,
        )
    }

    fn speaker(&self) -> Box<dyn Speaker> {
        if self.mute {
            return Box::new(MutedSpeaker);
        }
        match self
            .config
            .speech_command
            .as_deref()
            .and_then(CommandSpeaker::from_command_line)
        {
            Some(speaker) => Box::new(speaker),
            None => Box::new(ConsoleSpeaker::stderr()),
        }
    }

    fn sensor(&self) -> FixedSensor {
        FixedSensor::new(self.config.fixed_position())
    }

    fn cached_location(&self) -> LocationProvider {
        LocationProvider::new(storage::restore_location(self.storage.as_ref()))
    }
}

/// Run the parsed command, returning an error message on failure.
pub fn run(cli: Cli) -> Result<(), String> {
    let app = App::new(&cli)?;

    match cli.command {
        None => cmd_shell(&app, "/"),
        Some(Command::Shell { view }) => cmd_shell(&app, &view),
        Some(Command::Diagnose { image }) => cmd_diagnose(&app, &image),
        Some(Command::Crop {
            nitrogen,
            phosphorus,
            potassium,
            temperature,
            humidity,
            rainfall,
            ph,
        }) => {
            let readings = [
                (Field::Nitrogen, nitrogen),
                (Field::Phosphorus, phosphorus),
                (Field::Potassium, potassium),
                (Field::Temperature, temperature),
                (Field::Humidity, humidity),
                (Field::Rainfall, rainfall),
                (Field::Ph, ph),
            ];
            cmd_crop(&app, readings)
        }
        Some(Command::Fertilizer {
            crop,
            nitrogen,
            phosphorus,
            potassium,
        }) => {
            let mut form = FertilizerForm::new();
            form.crop = Some(crop);
            apply_readings(
                &mut form.nutrients,
                [
                    (Field::Nitrogen, nitrogen),
                    (Field::Phosphorus, phosphorus),
                    (Field::Potassium, potassium),
                ],
            );
            submit_once(&app, &form)
        }
        Some(Command::Market {
            state,
            commodity,
            limit,
            offset,
        }) => cmd_market(&app, state, commodity, limit, offset),
        Some(Command::Weather) => cmd_weather(&app),
        Some(Command::Locate { lat, lon }) => cmd_locate(&app, lat.zip(lon)),
        Some(Command::Classify { words }) => cmd_classify(&app, &words.join(" ")),
    }
}

fn cmd_shell(app: &App, view: &str) -> Result<(), String> {
    let mut channel = DeferredActionChannel::new();
    let start = Route::parse(view, 0).ok_or_else(|| {
        format!("unknown view '{view}'; expected /, /disease, /crop, or /fertilizer")
    })?;
    let start = channel.renavigate(start);

    let service = app.service();
    let weather = app.weather();
    let market = app.market();
    let mut sensor = app.sensor();
    let mut speaker = app.speaker();

    let ctx = Context {
        service: &service,
        weather: &weather,
        market: &market,
        market_query: MarketQuery::for_state(&app.config.market_state, app.config.market_limit),
        sensor: &mut sensor,
        speaker: speaker.as_mut(),
        storage: app.storage.as_ref(),
        location: app.cached_location(),
        channel,
        soil_latency: Duration::from_millis(app.config.soil_analysis_ms),
        rng: StdRng::from_entropy(),
    };
    let recognizer = app
        .config
        .voice_enabled
        .then(|| PromptRecognizer::new(app.config.language.clone()));

    let mut shell = Shell::new(ctx, VoiceSessionController::new(recognizer), start);
    shell
        .run(io::stdin().lock(), &mut io::stdout())
        .map_err(|e| format!("terminal error: {e}"))
}

fn cmd_diagnose(app: &App, path: &Path) -> Result<(), String> {
    let image = ImageUpload::from_path(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    submit_once(app, &DiagnosisForm { image: Some(image) })
}

fn cmd_crop(app: &App, readings: [(Field, Option<String>); 7]) -> Result<(), String> {
    let mut form = CropForm::new();
    apply_readings(&mut form.fields, readings);

    let location = app.cached_location();
    let mut pipeline = AutofillPipeline::new(Duration::ZERO);
    let report = pipeline.run_weather(&mut form.fields, location.sample(), &app.weather());
    if let Some(report) = report.filter(|r| !r.applied.is_empty()) {
        let names: Vec<&str> = report.applied.iter().map(|f| f.name()).collect();
        eprintln!("Filled from current weather: {}", names.join(", "));
    }

    submit_once(app, &form)
}

/// Typed values are user edits.
fn apply_readings<const N: usize>(form: &mut FormState, readings: [(Field, Option<String>); N]) {
    for (field, value) in readings {
        if let Some(value) = value {
            form.edit(field, value);
        }
    }
}

/// Submit one form and print the rendered result.
fn submit_once<F: AdviceForm>(app: &App, form: &F) -> Result<(), String> {
    let service = app.service();
    let mut speaker = app.speaker();
    let mut orchestrator = SubmissionOrchestrator::<F>::new();

    let failure = match orchestrator.submit(form, &service, speaker.as_mut()) {
        Some(SubmissionResult::Failure { message, .. }) => Some(message.clone()),
        _ => None,
    };
    if let Some(message) = failure {
        return Err(message);
    }
    for line in orchestrator.render() {
        println!("{line}");
    }
    Ok(())
}

fn cmd_market(
    app: &App,
    state: Option<String>,
    commodity: Option<String>,
    limit: Option<u32>,
    offset: u32,
) -> Result<(), String> {
    if app.config.market_api_key.trim().is_empty() {
        return Err(format!(
            "no market API key configured\n\
             Set market-api-key in {} or {}.",
            Config::path().map_or_else(|| "config.toml".to_string(), |p| p.display().to_string()),
            crate::config::MARKET_KEY_ENV,
        ));
    }
    let state = state.unwrap_or_else(|| app.config.market_state.clone());
    let mut query = MarketQuery::for_state(&state, limit.unwrap_or(app.config.market_limit));
    query.offset = offset;
    if let Some(commodity) = commodity {
        query.filters.insert("Commodity".to_string(), commodity);
    }

    let records = app
        .market()
        .fetch(&query)
        .map_err(|e| format!("failed to load market prices: {e}"))?;
    for line in market::render(&records) {
        println!("{line}");
    }
    Ok(())
}

/// The cached position, or a fresh sensor reading that is then persisted.
fn known_position(
    mut location: LocationProvider,
    sensor: &mut dyn GeolocationSensor,
    storage: Option<&Storage>,
) -> Result<Coordinates, String> {
    if location.sample().is_none() {
        match location.acquire(sensor) {
            Ok(sample) => storage::persist_location(storage, sample),
            Err(e) => {
                return Err(format!(
                    "no location known ({e})\n\
                     Record one with: krishi locate --lat <latitude> --lon <longitude>"
                ));
            }
        }
    }
    location
        .coordinates()
        .ok_or_else(|| "no location known".to_string())
}

fn cmd_weather(app: &App) -> Result<(), String> {
    let at = known_position(
        app.cached_location(),
        &mut app.sensor(),
        app.storage.as_ref(),
    )?;

    let current = app
        .weather()
        .current(
            at,
            &[
                Variable::Temperature,
                Variable::RelativeHumidity,
                Variable::Rain,
                Variable::WeatherCode,
            ],
        )
        .map_err(|e| format!("failed to fetch weather: {e}"))?;

    println!("Location:    {:.4}, {:.4}", at.latitude, at.longitude);
    if let Some(t) = current.temperature_2m {
        println!("Temperature: {t}°C");
    }
    if let Some(h) = current.relative_humidity_2m {
        println!("Humidity:    {h}%");
    }
    println!("Rain:        {} mm", current.rain.unwrap_or(0.0));
    if let Some(code) = current.weathercode {
        println!("Conditions:  {}", weather::describe_code(code));
    }
    Ok(())
}

fn cmd_locate(app: &App, position: Option<(f64, f64)>) -> Result<(), String> {
    let mut location = LocationProvider::default();
    let sample = match position {
        Some((latitude, longitude)) => location.record(Coordinates {
            latitude,
            longitude,
        }),
        None => location
            .acquire(&mut app.sensor())
            .map_err(|e| e.to_string())?,
    };

    let storage = app
        .storage
        .as_ref()
        .ok_or("could not determine home directory")?;
    storage
        .save_location(sample)
        .map_err(|e| format!("failed to save location: {e}"))?;
    println!("{:.4}, {:.4}", sample.latitude, sample.longitude);
    Ok(())
}

/// Remembers the route a voice command produced.
#[derive(Default)]
struct Destination(Option<Route>);

impl Navigator for Destination {
    fn navigate(&mut self, route: Route) {
        self.0 = Some(route);
    }
}

fn cmd_classify(app: &App, transcript: &str) -> Result<(), String> {
    let mut voice = VoiceSessionController::new(Some(PromptRecognizer::new(
        app.config.language.clone(),
    )));
    let mut channel = DeferredActionChannel::new();
    let mut destination = Destination::default();
    let mut speaker = app.speaker();

    voice.start();
    let intent = voice
        .on_result(transcript, &mut channel, &mut destination, speaker.as_mut())
        .ok_or("voice session was not listening")?;

    println!("intent: {intent:?}");
    match destination.0 {
        Some(route) => println!("route:  {}", route.to_url()),
        None => println!("route:  (stays on the current view)"),
    }
    Ok(())
}
