//! Intent: the classified purpose of a spoken utterance.

use super::ViewId;

/// What a spoken command asks for.
///
/// Derived from a transcript, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Open the disease view with the capture device ready.
    OpenDiagnosis,

    /// Open the crop recommendation view.
    OpenCropAdvisor,

    /// Open the fertilizer recommendation view.
    OpenFertilizerAdvisor,

    /// Return to the home view.
    GoHome,

    /// No rule matched.
    Unrecognized,
}

impl Intent {
    /// The view this intent navigates to, if any.
    pub fn destination(self) -> Option<ViewId> {
        match self {
            Self::OpenDiagnosis => Some(ViewId::Disease),
            Self::OpenCropAdvisor => Some(ViewId::Crop),
            Self::OpenFertilizerAdvisor => Some(ViewId::Fertilizer),
            Self::GoHome => Some(ViewId::Home),
            Self::Unrecognized => None,
        }
    }

    /// The spoken acknowledgment for this intent.
    pub fn acknowledgment(self) -> &'static str {
        match self {
            Self::OpenDiagnosis => "Opening disease prediction camera.",
            Self::OpenCropAdvisor => "Opening crop recommendation.",
            Self::OpenFertilizerAdvisor => "Opening fertilizer recommendation.",
            Self::GoHome => "Going home.",
            Self::Unrecognized => "I didn't catch that. Please try again.",
        }
    }
}
