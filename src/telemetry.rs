//! Diagnostic logging.
//!
//! Human-readable lines on stderr by default; JSON lines appended to a file
//! when a trace log path is given.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing::Level;

pub const TRACE_LOG_ENV: &str = "KRISHI_TRACE_LOG";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Max level for a `-v` count.
pub fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// The JSON log path: the flag wins over the environment.
pub fn trace_log_path(
    flag: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| {
        lookup(TRACE_LOG_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    })
}

fn init_tracing_once(level: Level, log_file: Option<&Path>, once: &OnceLock<()>) {
    let _ = once.get_or_init(|| {
        let Some(path) = log_file else {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
            return;
        };
        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("warning: cannot open trace log {}: {e}", path.display());
                return;
            }
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(level)
            .with_writer(file)
            .with_current_span(false)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

/// Install the global subscriber. Later calls do nothing.
pub fn init(verbosity: u8, log_file: Option<&Path>) {
    init_tracing_once(level_for(verbosity), log_file, &TRACING_INIT);
}
