//! Voice session: one recognition device, an explicit state machine, and
//! the wiring from classified intents to navigation and spoken feedback.
//!
//! ```text
//! Idle ──start──▶ Listening ──result──▶ Idle
//!                     │ ──error───▶ Error ──end──▶ Idle
//!                     └──stop / end──▶ Idle
//! ```
//!
//! `Error` is transient: `start` is accepted from it just as from `Idle`.

use crate::deferred::{DeferredActionChannel, Instruction};
use crate::intent;
use crate::model::{Intent, Route};
use crate::speech::{Recognizer, Speaker, SpeechError};

/// Receives navigation requests.
pub trait Navigator {
    fn navigate(&mut self, route: Route);
}

/// Where the voice session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
    Error,
}

/// The single voice session of a client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSession {
    pub state: SessionState,
    pub last_transcript: Option<String>,
}

/// What happened when the session was asked to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The device is recording.
    Started,

    /// A session is already listening; nothing changed.
    AlreadyListening,

    /// No recognition capability on this device.
    Unsupported,

    /// The device refused to open. The session is back to `Idle`.
    Failed(String),
}

/// Owns the recognizer and drives the session through its states.
pub struct VoiceSessionController<R: Recognizer> {
    recognizer: Option<R>,
    session: VoiceSession,
}

impl<R: Recognizer> VoiceSessionController<R> {
    /// Creates the controller. `None` means the device has no recognizer.
    pub fn new(recognizer: Option<R>) -> Self {
        Self {
            recognizer,
            session: VoiceSession {
                state: SessionState::Idle,
                last_transcript: None,
            },
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &VoiceSession {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    #[cfg(test)]
    pub fn is_supported(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Begin listening for one utterance.
    ///
    /// Rejected as a no-op while already listening, so at most one device
    /// session is ever open.
    pub fn start(&mut self) -> StartOutcome {
        let Some(recognizer) = self.recognizer.as_mut() else {
            tracing::info!("voice start requested without a recognizer");
            return StartOutcome::Unsupported;
        };
        if self.session.state == SessionState::Listening {
            return StartOutcome::AlreadyListening;
        }
        match recognizer.open() {
            Ok(()) => {
                self.session.state = SessionState::Listening;
                StartOutcome::Started
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to open recognizer");
                recognizer.close();
                self.session.state = SessionState::Idle;
                StartOutcome::Failed(e.to_string())
            }
        }
    }

    /// Stop listening and release the device.
    pub fn stop(&mut self) {
        self.release();
        self.session.state = SessionState::Idle;
    }

    /// Handle a final transcript from the device.
    ///
    /// Classifies it, speaks exactly one acknowledgment, and performs at
    /// most one navigation. A diagnosis request carries the capture
    /// instruction across the navigation. Results arriving while not
    /// listening are stale and ignored.
    pub fn on_result(
        &mut self,
        transcript: &str,
        channel: &mut DeferredActionChannel,
        navigator: &mut dyn Navigator,
        speaker: &mut dyn Speaker,
    ) -> Option<Intent> {
        if self.session.state != SessionState::Listening {
            tracing::debug!(transcript, "ignoring result outside a listening session");
            return None;
        }
        self.release();
        self.session.state = SessionState::Idle;

        let transcript = transcript.trim().to_lowercase();
        let intent = intent::classify(&transcript);
        tracing::info!(%transcript, ?intent, "voice command");
        self.session.last_transcript = Some(transcript);

        speaker.speak(intent.acknowledgment());
        let route = match (intent, intent.destination()) {
            (Intent::OpenDiagnosis, Some(view)) => {
                Some(channel.encode(view, Instruction::AutoOpenCapture))
            }
            (_, Some(view)) => Some(channel.route(view)),
            (_, None) => None,
        };
        if let Some(route) = route {
            navigator.navigate(route);
        }
        Some(intent)
    }

    /// Handle a device error. The session passes through `Error` and the
    /// device is released; the next `start` is always permitted.
    pub fn on_error(&mut self, error: &SpeechError) {
        tracing::warn!(%error, "speech recognition error");
        self.release();
        self.session.state = SessionState::Error;
    }

    /// Handle the device ending (silence, timeout, or after an error).
    pub fn on_end(&mut self) {
        self.release();
        self.session.state = SessionState::Idle;
    }

    fn release(&mut self) {
        if let Some(recognizer) = self.recognizer.as_mut() {
            recognizer.close();
        }
    }
}

impl<R: Recognizer> Drop for VoiceSessionController<R> {
    fn drop(&mut self) {
        self.release();
    }
}
