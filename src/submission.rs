//! Submission: validate a form, call its remote advisor, and reduce the
//! answer into a result plus an optional spoken summary.
//!
//! Every error is caught here and becomes a [`SubmissionResult::Failure`];
//! nothing escapes to the caller as a raw error.

mod crop;
mod disease;
mod fertilizer;

use std::marker::PhantomData;

use crate::http::TransportError;
use crate::model::{ErrorKind, Field, FormState, SubmissionResult};
use crate::service::AgronomyService;
use crate::speech::Speaker;

pub use crop::CropForm;
pub use disease::DiagnosisForm;
pub use fertilizer::{CROPS, FertilizerForm};

/// Shown when no response arrives at all.
pub const NETWORK_ERROR: &str = "Network error. Please try again.";

/// Form input that cannot be sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(Field),

    #[error("{field} must be a number (got {value:?})")]
    NotANumber { field: Field, value: String },

    #[error("Please select an image first.")]
    NoImage,

    #[error("Please choose a crop.")]
    NoCrop,

    #[error("unknown crop {0:?}; choose one of the supported crops")]
    UnknownCrop(String),
}

/// A form that can be submitted to one of the remote advisors.
pub trait AdviceForm {
    type Request;
    type Payload;

    /// Shown when the server rejects the request without a detail message.
    const REJECTION_FALLBACK: &'static str;

    /// Coerce the form into a request, or explain why it can't be sent.
    fn validate(&self) -> Result<Self::Request, ValidationError>;

    /// Call the advisor.
    fn send(
        service: &dyn AgronomyService,
        request: &Self::Request,
    ) -> Result<Self::Payload, TransportError>;

    /// One sentence read aloud on success.
    fn spoken_summary(payload: &Self::Payload) -> Option<String>;

    /// Lines to display on success.
    fn render(payload: &Self::Payload) -> Vec<String>;
}

/// What `begin` decided.
#[derive(Debug)]
pub enum Begin<R> {
    /// A submission is already in flight; the call was ignored.
    Busy,

    /// The form failed validation. The failure is stored; nothing was sent.
    Invalid,

    /// Send this request, then call `settle`.
    Ready(R),
}

/// Owns one view's submission state: the busy flag and the latest result.
pub struct SubmissionOrchestrator<F: AdviceForm> {
    busy: bool,
    result: Option<SubmissionResult<F::Payload>>,
    form: PhantomData<F>,
}

impl<F: AdviceForm> Default for SubmissionOrchestrator<F> {
    fn default() -> Self {
        Self {
            busy: false,
            result: None,
            form: PhantomData,
        }
    }
}

impl<F: AdviceForm> SubmissionOrchestrator<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a submission is in flight. Callers check this before submitting.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The latest result, if any attempt has been made.
    #[cfg(test)]
    pub fn result(&self) -> Option<&SubmissionResult<F::Payload>> {
        self.result.as_ref()
    }

    /// Forget the latest result.
    pub fn clear(&mut self) {
        self.result = None;
    }

    /// Start an attempt: validate and mark busy.
    pub fn begin(&mut self, form: &F) -> Begin<F::Request> {
        if self.busy {
            tracing::debug!("submission already in flight; ignoring");
            return Begin::Busy;
        }
        match form.validate() {
            Ok(request) => {
                self.busy = true;
                self.result = None;
                Begin::Ready(request)
            }
            Err(e) => {
                tracing::debug!(error = %e, "form failed validation");
                self.result = Some(SubmissionResult::failure(
                    ErrorKind::Validation,
                    e.to_string(),
                ));
                Begin::Invalid
            }
        }
    }

    /// Finish an attempt with the advisor's answer.
    pub fn settle(
        &mut self,
        outcome: Result<F::Payload, TransportError>,
        speaker: &mut dyn Speaker,
    ) -> &SubmissionResult<F::Payload> {
        self.busy = false;
        let result = match outcome {
            Ok(payload) => {
                if let Some(summary) = F::spoken_summary(&payload) {
                    speaker.speak(&summary);
                }
                SubmissionResult::Success(payload)
            }
            Err(e) => {
                tracing::warn!(error = %e, "submission failed");
                failure_from_transport(e, F::REJECTION_FALLBACK)
            }
        };
        self.result.insert(result)
    }

    /// Validate, send, and settle in one call.
    ///
    /// Returns `None` when ignored because a submission is already in flight.
    pub fn submit(
        &mut self,
        form: &F,
        service: &dyn AgronomyService,
        speaker: &mut dyn Speaker,
    ) -> Option<&SubmissionResult<F::Payload>> {
        match self.begin(form) {
            Begin::Busy => None,
            Begin::Invalid => self.result.as_ref(),
            Begin::Ready(request) => {
                let outcome = F::send(service, &request);
                Some(self.settle(outcome, speaker))
            }
        }
    }

    /// Display lines for the latest result.
    pub fn render(&self) -> Vec<String> {
        match &self.result {
            None => Vec::new(),
            Some(SubmissionResult::Success(payload)) => F::render(payload),
            Some(SubmissionResult::Failure { message, .. }) => vec![format!("✗ {message}")],
        }
    }
}

/// Map a transport failure to the user-facing failure.
fn failure_from_transport<T>(err: TransportError, fallback: &str) -> SubmissionResult<T> {
    match err {
        TransportError::Rejected {
            detail: Some(detail),
            ..
        } => SubmissionResult::failure(ErrorKind::RemoteRejection, detail),
        TransportError::Rejected { detail: None, .. } | TransportError::Decode(_) => {
            SubmissionResult::failure(ErrorKind::RemoteRejection, fallback)
        }
        TransportError::NoResponse(_) => {
            SubmissionResult::failure(ErrorKind::Connectivity, NETWORK_ERROR)
        }
    }
}

/// Coerce one required numeric field.
fn number(form: &FormState, field: Field) -> Result<f64, ValidationError> {
    let raw = form.value(field).ok_or(ValidationError::Missing(field))?;
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        }),
    }
}

/// Turn literal `<br/>` markers into newlines.
fn line_breaks(text: &str) -> String {
    text.replace("<br/>", "\n")
        .replace("<br />", "\n")
        .replace("<br>", "\n")
}
