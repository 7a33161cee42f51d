//! Interactive shell: a line-oriented front end showing one view at a time.
//!
//! The shell owns the voice session and the shared context (providers,
//! cached location, deferred-action channel). Views are mounted on
//! navigation and dropped when the next one mounts.

mod views;

use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;

use crate::deferred::DeferredActionChannel;
use crate::location::{GeolocationSensor, LocationProvider, SensorError};
use crate::market::{MarketPrices, MarketQuery};
use crate::model::{ErrorKind, Route};
use crate::service::AgronomyService;
use crate::speech::{Recognizer, Speaker, SpeechError};
use crate::storage::{self, Storage};
use crate::voice::{Navigator, SessionState, StartOutcome, VoiceSessionController};
use crate::weather::WeatherProvider;

use views::Screen;

/// Everything a mounted view may use.
pub struct Context<'a> {
    pub service: &'a dyn AgronomyService,
    pub weather: &'a dyn WeatherProvider,
    pub market: &'a dyn MarketPrices,
    pub market_query: MarketQuery,
    pub sensor: &'a mut dyn GeolocationSensor,
    pub speaker: &'a mut dyn Speaker,
    pub storage: Option<&'a Storage>,
    pub location: LocationProvider,
    pub channel: DeferredActionChannel,
    pub soil_latency: Duration,
    pub rng: StdRng,
}

impl Context<'_> {
    /// Ask the sensor for a position. Success is cached and persisted.
    fn locate(&mut self, out: &mut Vec<String>) {
        match self.location.acquire(&mut *self.sensor) {
            Ok(sample) => {
                out.push(format!(
                    "📍 Location set: {:.4}, {:.4}",
                    sample.latitude, sample.longitude
                ));
                storage::persist_location(self.storage, sample);
            }
            Err(e) => out.push(format!("✗ {}", sensor_message(&e))),
        }
    }
}

fn sensor_message(err: &SensorError) -> &'static str {
    match err.kind() {
        ErrorKind::UnsupportedCapability => "Geolocation is not supported on this device.",
        _ => "Please enable location services for accurate recommendations.",
    }
}

/// Holds the route a voice command asked for until the shell mounts it.
#[derive(Default)]
struct PendingNavigation(Option<Route>);

impl Navigator for PendingNavigation {
    fn navigate(&mut self, route: Route) {
        self.0 = Some(route);
    }
}

/// Whether the shell should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

const HELP: &[&str] = &[
    "go <view>        open home, disease, crop, or fertilizer",
    "listen [words]   voice command; without words the next line is heard",
    "locate           read the current position",
    "show             redraw the current view",
    "help             this list",
    "quit             leave",
];

pub struct Shell<'a, R: Recognizer> {
    ctx: Context<'a>,
    voice: VoiceSessionController<R>,
    screen: Screen,
    route: Route,
    outbox: Vec<String>,
}

impl<'a, R: Recognizer> Shell<'a, R> {
    /// Acquire a position, then mount the starting view.
    pub fn new(mut ctx: Context<'a>, voice: VoiceSessionController<R>, start: Route) -> Self {
        let mut outbox = Vec::new();
        ctx.locate(&mut outbox);
        outbox.push(header(&start));
        let screen = Screen::mount(&start, &mut ctx, &mut outbox);
        Self {
            ctx,
            voice,
            screen,
            route: start,
            outbox,
        }
    }

    /// The mounted view.
    #[cfg(test)]
    pub fn view(&self) -> crate::model::ViewId {
        self.route.view
    }

    #[cfg(test)]
    pub fn voice_state(&self) -> SessionState {
        self.voice.state()
    }

    /// Take the output produced since the last call.
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// Handle one line of input.
    pub fn execute(&mut self, line: &str) -> Flow {
        self.screen.tick(&mut self.ctx, Instant::now(), &mut self.outbox);

        if self.voice.state() == SessionState::Listening {
            self.hear(line);
            return Flow::Continue;
        }

        let line = line.trim();
        let (command, args) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, rest)| (c, rest.trim()));
        match command {
            "" => {}
            "quit" | "exit" | "q" => return Flow::Quit,
            "help" | "?" => {
                self.outbox.extend(HELP.iter().map(|l| l.to_string()));
                self.outbox
                    .extend(self.screen.help().iter().map(|l| l.to_string()));
            }
            "go" => self.go(args),
            "listen" => self.listen(args),
            "locate" => self.ctx.locate(&mut self.outbox),
            "show" => self.screen.render(&mut self.outbox),
            _ => {
                if !self
                    .screen
                    .handle(command, args, &mut self.ctx, &mut self.outbox)
                {
                    self.outbox
                        .push(format!("Unknown command {command:?}. Type `help`."));
                }
            }
        }
        Flow::Continue
    }

    /// Read commands until end of input or `quit`.
    ///
    /// While listening, the input is the recognition device: a read error
    /// ends the voice session instead of the shell.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        self.flush(out)?;
        self.prompt(out)?;
        for line in input.lines() {
            let flow = match line {
                Ok(line) => self.execute(&line),
                Err(e) if self.voice.state() == SessionState::Listening => {
                    self.recognition_failed(&SpeechError::Device(e.to_string()));
                    Flow::Continue
                }
                Err(e) => return Err(e),
            };
            self.flush(out)?;
            if flow == Flow::Quit {
                break;
            }
            self.prompt(out)?;
        }
        if self.voice.state() == SessionState::Listening {
            self.voice.on_end();
        }
        Ok(())
    }

    /// The device failed mid-utterance. The session ends and may be restarted.
    fn recognition_failed(&mut self, error: &SpeechError) {
        self.voice.on_error(error);
        self.voice.on_end();
        self.outbox
            .push(format!("✗ {error}. Say `listen` to try again."));
    }

    fn flush(&mut self, out: &mut impl Write) -> io::Result<()> {
        for line in self.drain() {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn prompt(&self, out: &mut impl Write) -> io::Result<()> {
        if self.voice.state() == SessionState::Listening {
            write!(out, "🎙 > ")?;
        } else {
            write!(out, "krishi:{}> ", self.route.to_url())?;
        }
        out.flush()
    }

    fn go(&mut self, target: &str) {
        let target = if target.is_empty() { "/" } else { target };
        match Route::parse(target, 0) {
            Some(route) => {
                let route = self.ctx.channel.renavigate(route);
                self.navigate(route);
            }
            None => self.outbox.push(format!(
                "Unknown view {target:?}. Try home, disease, crop, or fertilizer."
            )),
        }
    }

    fn navigate(&mut self, route: Route) {
        self.outbox.push(header(&route));
        self.screen = Screen::mount(&route, &mut self.ctx, &mut self.outbox);
        self.route = route;
    }

    fn listen(&mut self, utterance: &str) {
        match self.voice.start() {
            StartOutcome::Started if utterance.is_empty() => {
                self.outbox
                    .push("🎙 Listening... say a command (empty line to cancel).".to_string());
            }
            StartOutcome::Started => self.hear(utterance),
            StartOutcome::AlreadyListening => {}
            StartOutcome::Unsupported => self
                .outbox
                .push("✗ Voice commands are not supported on this device.".to_string()),
            StartOutcome::Failed(e) => self.outbox.push(format!("✗ {e}")),
        }
    }

    /// Deliver a line to the listening session.
    fn hear(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            self.voice.on_end();
            self.outbox.push("Stopped listening.".to_string());
            return;
        }
        if line == "stop" {
            self.voice.stop();
            self.outbox.push("Stopped listening.".to_string());
            return;
        }
        let mut pending = PendingNavigation::default();
        self.voice.on_result(
            line,
            &mut self.ctx.channel,
            &mut pending,
            &mut *self.ctx.speaker,
        );
        if let Some(route) = pending.0 {
            self.navigate(route);
        }
    }
}

fn header(route: &Route) -> String {
    format!("── {} ({}) ──", route.view.title(), route.view.path())
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use tempfile::TempDir;

    use crate::location::FixedSensor;
    use crate::market::testing::{FakeMarket, record};
    use crate::model::{Coordinates, Field, Provenance, ViewId};
    use crate::service::testing::FakeService;
    use crate::speech::testing::{FakeRecognizer, RecordingSpeaker};
    use crate::weather::CurrentWeather;
    use crate::weather::testing::FakeWeather;

    const CHENNAI: Coordinates = Coordinates {
        latitude: 13.08,
        longitude: 80.27,
    };

    struct Rig {
        service: FakeService,
        weather: FakeWeather,
        market: FakeMarket,
        sensor: FixedSensor,
        speaker: RecordingSpeaker,
        soil_latency: Duration,
    }

    impl Rig {
        fn new(position: Option<Coordinates>) -> Self {
            Self {
                service: FakeService::default(),
                weather: FakeWeather::ok(CurrentWeather {
                    temperature_2m: Some(28.4),
                    relative_humidity_2m: Some(63.0),
                    rain: None,
                    weathercode: Some(2),
                }),
                market: FakeMarket::with(vec![record("Tomato", "1800")]),
                sensor: FixedSensor::new(position),
                speaker: RecordingSpeaker::default(),
                soil_latency: Duration::ZERO,
            }
        }

        fn shell(&mut self, start: &str) -> Shell<'_, FakeRecognizer> {
            self.shell_with(start, Some(FakeRecognizer::default()), None)
        }

        fn shell_with<'a>(
            &'a mut self,
            start: &str,
            recognizer: Option<FakeRecognizer>,
            storage: Option<&'a Storage>,
        ) -> Shell<'a, FakeRecognizer> {
            let mut channel = DeferredActionChannel::new();
            let start = channel.renavigate(Route::parse(start, 0).unwrap());
            let ctx = Context {
                service: &self.service,
                weather: &self.weather,
                market: &self.market,
                market_query: MarketQuery::for_state("Tamil Nadu", 5),
                sensor: &mut self.sensor,
                speaker: &mut self.speaker,
                storage,
                location: LocationProvider::default(),
                channel,
                soil_latency: self.soil_latency,
                rng: StdRng::seed_from_u64(7),
            };
            Shell::new(ctx, VoiceSessionController::new(recognizer), start)
        }
    }

    fn contains(lines: &[String], needle: &str) -> bool {
        lines.iter().any(|l| l.contains(needle))
    }

    #[test]
    fn voice_diagnosis_opens_capture_once() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");
        shell.drain();

        shell.execute("listen please check my leaf for disease");
        let out = shell.drain();
        assert_eq!(shell.view(), ViewId::Disease);
        assert!(contains(&out, "Camera opened"));
        assert_eq!(shell.voice_state(), SessionState::Idle);

        shell.execute("show");
        assert!(!contains(&shell.drain(), "Camera opened"));
        drop(shell);

        assert_eq!(rig.speaker.spoken, vec!["Opening disease prediction camera."]);
    }

    #[test]
    fn manual_navigation_to_disease_has_no_capture() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");
        shell.execute("go disease");
        let out = shell.drain();
        assert_eq!(shell.view(), ViewId::Disease);
        assert!(!contains(&out, "Camera opened"));
    }

    #[test]
    fn listen_then_next_line_is_the_utterance() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");

        shell.execute("listen");
        assert_eq!(shell.voice_state(), SessionState::Listening);
        shell.execute("I need fertilizer for my crop");
        assert_eq!(shell.view(), ViewId::Fertilizer);
        assert_eq!(shell.voice_state(), SessionState::Idle);
    }

    #[test]
    fn empty_line_cancels_listening() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/crop");
        shell.execute("listen");
        shell.execute("");
        assert_eq!(shell.voice_state(), SessionState::Idle);
        assert_eq!(shell.view(), ViewId::Crop);
        assert!(contains(&shell.drain(), "Stopped listening."));
    }

    #[test]
    fn unrecognized_speech_stays_put() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/crop");
        shell.execute("listen what a lovely day");
        assert_eq!(shell.view(), ViewId::Crop);
        drop(shell);
        assert_eq!(
            rig.speaker.spoken,
            vec!["I didn't catch that. Please try again."]
        );
    }

    #[test]
    fn no_recognizer_reports_unsupported() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell_with("/", None, None);
        shell.drain();
        shell.execute("listen go home");
        assert!(contains(
            &shell.drain(),
            "Voice commands are not supported on this device."
        ));
    }

    #[test]
    fn crop_view_autofills_weather_on_mount() {
        let mut rig = Rig::new(Some(CHENNAI));
        let mut shell = rig.shell("/crop");
        let out = shell.drain();
        assert!(contains(&out, "Location set"));
        assert!(contains(&out, "temperature (°C): 28.4 (auto)"));
        assert!(contains(&out, "rainfall (mm): 0 (auto)"));
        drop(shell);
        assert_eq!(rig.weather.requests.borrow().as_slice(), &[CHENNAI]);
    }

    #[test]
    fn crop_reset_refills_from_weather() {
        let mut rig = Rig::new(Some(CHENNAI));
        let mut shell = rig.shell("/crop");
        shell.execute("set temperature 31");
        shell.drain();

        shell.execute("reset");
        let out = shell.drain();
        assert!(contains(&out, "Cleared."));
        assert!(contains(&out, "Filled from current weather"));
        let form = shell.screen.crop_form().unwrap();
        assert_eq!(form.value(Field::Temperature), Some("28.4"));
        assert_eq!(form.provenance(Field::Temperature), Provenance::AutoFilled);
        drop(shell);
        assert_eq!(rig.weather.requests.borrow().len(), 2);
    }

    #[test]
    fn without_location_crop_view_skips_weather() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/crop");
        let out = shell.drain();
        assert!(contains(&out, "Geolocation is not supported on this device."));
        drop(shell);
        assert!(rig.weather.requests.borrow().is_empty());
    }

    #[test]
    fn user_edit_survives_soil_analysis() {
        let dir = TempDir::new().unwrap();
        let photo = dir.path().join("soil.jpg");
        std::fs::write(&photo, b"jpg").unwrap();

        let mut rig = Rig::new(None);
        rig.soil_latency = Duration::from_millis(300);
        let mut shell = rig.shell("/crop");
        shell.execute(&format!("soil {}", photo.display()));
        shell.execute("set nitrogen 55");
        shell.execute("wait");
        shell.execute("show");
        let out = shell.drain();
        assert!(contains(&out, "nitrogen (kg/ha): 55"));
        assert!(!contains(&out, "nitrogen (kg/ha): 55 (auto)"));
        assert!(contains(&out, "Soil analysis complete"));
        assert!(contains(&out, "kept your nitrogen"));
    }

    #[test]
    fn crop_submission_speaks_and_renders() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/crop");
        for (field, value) in [
            (Field::Nitrogen, "90"),
            (Field::Phosphorus, "42"),
            (Field::Potassium, "43"),
            (Field::Temperature, "20.8"),
            (Field::Humidity, "82"),
            (Field::Rainfall, "202.9"),
            (Field::Ph, "6.5"),
        ] {
            shell.execute(&format!("set {field} {value}"));
        }
        shell.drain();
        shell.execute("submit");
        assert!(contains(&shell.drain(), "Recommended crop: rice"));
        drop(shell);
        assert_eq!(rig.speaker.spoken, vec!["I recommend planting rice."]);
        assert_eq!(rig.service.calls(), 1);
    }

    #[test]
    fn disease_submit_without_image_is_validation_error() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/disease");
        shell.execute("submit");
        assert!(contains(&shell.drain(), "✗ Please select an image first."));
        drop(shell);
        assert_eq!(rig.service.calls(), 0);
    }

    #[test]
    fn fertilizer_flow_end_to_end() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/fertilizer");
        shell.execute("crop Kidney Beans");
        shell.execute("set n 50");
        shell.execute("set p 40");
        shell.execute("set k 30");
        shell.execute("set ph 6");
        assert!(contains(&shell.drain(), "ph is not on this form."));
        shell.execute("submit");
        let out = shell.drain();
        assert!(contains(&out, "Status: Low"));
        assert!(contains(&out, "Add manure."));
    }

    #[test]
    fn home_view_shows_weather_and_market() {
        let mut rig = Rig::new(Some(CHENNAI));
        let mut shell = rig.shell("/");
        let out = shell.drain();
        assert!(contains(&out, "28°C, Partly cloudy"));
        assert!(contains(&out, "Tomato at Koyambedu, Tamil Nadu: ₹1800/quintal"));
        drop(shell);
        assert_eq!(
            rig.market.queries.borrow()[0].filters.get("State").map(String::as_str),
            Some("Tamil Nadu")
        );
    }

    #[test]
    fn location_is_persisted() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let mut rig = Rig::new(Some(CHENNAI));
        let shell = rig.shell_with("/", None, Some(&storage));
        drop(shell);

        let saved = storage.load_location().unwrap().unwrap();
        assert_eq!(saved.coordinates(), CHENNAI);
    }

    #[test]
    fn run_reads_until_quit() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");
        let mut out = Vec::new();
        shell
            .run("go crop\nquit\ngo disease\n".as_bytes(), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("krishi:/crop> "));
        assert_eq!(shell.view(), ViewId::Crop);
    }

    #[test]
    fn device_error_while_listening_allows_restart() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");
        let mut out = Vec::new();
        let input: &[u8] = b"listen\n\xff\xfe\nlisten fertilizer\nquit\n";

        shell.run(input, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✗ recognition device failed"));
        assert_eq!(shell.view(), ViewId::Fertilizer);
        assert_eq!(shell.voice_state(), SessionState::Idle);
    }

    #[test]
    fn read_error_outside_listening_ends_the_shell() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");
        let input: &[u8] = b"\xff\nquit\n";
        assert!(shell.run(input, &mut Vec::<u8>::new()).is_err());
    }

    #[test]
    fn end_of_input_while_listening_closes_session() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");
        shell.run("listen\n".as_bytes(), &mut Vec::<u8>::new()).unwrap();
        assert_eq!(shell.voice_state(), SessionState::Idle);
    }

    #[test]
    fn unknown_view_and_command() {
        let mut rig = Rig::new(None);
        let mut shell = rig.shell("/");
        shell.drain();
        shell.execute("go market");
        shell.execute("dance");
        let out = shell.drain();
        assert!(contains(&out, "Unknown view \"market\""));
        assert!(contains(&out, "Unknown command \"dance\""));
        assert_eq!(shell.view(), ViewId::Home);
    }

    #[test]
    fn typed_edit_marks_user_provenance() {
        let mut rig = Rig::new(Some(CHENNAI));
        let mut shell = rig.shell("/crop");
        shell.execute("set temperature 31");
        assert_eq!(
            shell.screen.crop_form().unwrap().provenance(Field::Temperature),
            Provenance::UserEdited
        );
    }
}
