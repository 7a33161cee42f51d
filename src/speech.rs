//! Speech devices: the recognizer that hears commands and the speaker
//! that reads feedback aloud.
//!
//! Both are capabilities injected into the voice session and the
//! submission flow, so tests can swap in recording fakes.

use std::io::{self, Write};
use std::process::{Command, Stdio};

/// Errors raised by a speech device.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("recognition device failed: {0}")]
    Device(String),
}

/// A speech-recognition device that can be opened for one utterance at a time.
///
/// Transcripts and errors come back through the voice session's
/// `on_result` / `on_error` / `on_end` handlers, not through this trait.
pub trait Recognizer {
    /// Start recording.
    fn open(&mut self) -> Result<(), SpeechError>;

    /// Stop recording and release the device. Idempotent.
    fn close(&mut self);
}

/// Spoken feedback output.
pub trait Speaker {
    fn speak(&mut self, text: &str);
}

/// A recognizer whose "device" is the terminal prompt.
///
/// Opening it announces that the next typed line is the utterance.
#[derive(Debug)]
pub struct PromptRecognizer {
    language: String,
    open: bool,
}

impl PromptRecognizer {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            open: false,
        }
    }
}

impl Recognizer for PromptRecognizer {
    fn open(&mut self) -> Result<(), SpeechError> {
        self.open = true;
        tracing::debug!(language = %self.language, "recognizer opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            tracing::debug!("recognizer closed");
        }
    }
}

/// Prints spoken feedback to a writer, prefixed with a speaker mark.
pub struct ConsoleSpeaker<W: Write> {
    out: W,
}

impl ConsoleSpeaker<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write> ConsoleSpeaker<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Speaker for ConsoleSpeaker<W> {
    fn speak(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "🔊 {text}") {
            tracing::warn!(error = %e, "failed to write spoken feedback");
        }
    }
}

/// Speaks through an external text-to-speech program (e.g. `espeak`, `say`).
///
/// The text is passed as the last argument. When the program cannot be
/// run, the text is printed instead so feedback is never lost.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
    fallback: ConsoleSpeaker<io::Stderr>,
}

impl CommandSpeaker {
    /// Parse a command line such as `"espeak -s 150"`.
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            fallback: ConsoleSpeaker::stderr(),
        })
    }
}

impl Speaker for CommandSpeaker {
    fn speak(&mut self, text: &str) {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => {
                tracing::warn!(program = %self.program, status = %s, "speech program failed");
                self.fallback.speak(text);
            }
            Err(e) => {
                tracing::warn!(program = %self.program, error = %e, "failed to run speech program");
                self.fallback.speak(text);
            }
        }
    }
}

/// Discards all feedback.
pub struct MutedSpeaker;

impl Speaker for MutedSpeaker {
    fn speak(&mut self, _text: &str) {}
}
