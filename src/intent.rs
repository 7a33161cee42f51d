//! Intent classification for spoken commands.
//!
//! A transcript is matched case-insensitively against an ordered rule list.
//! The first rule with a keyword contained in the transcript wins, so
//! fertilizer is checked ahead of the generic "recommend".

use crate::model::Intent;

/// Ordered rules: the first rule with any matching keyword wins.
const RULES: &[(&[&str], Intent)] = &[
    (&["disease", "predict"], Intent::OpenDiagnosis),
    (&["fertilizer"], Intent::OpenFertilizerAdvisor),
    (&["crop", "recommend"], Intent::OpenCropAdvisor),
    (&["home"], Intent::GoHome),
];

/// Classify a transcript into an intent.
pub fn classify(transcript: &str) -> Intent {
    let transcript = transcript.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| transcript.contains(k)))
        .map_or(Intent::Unrecognized, |&(_, intent)| intent)
}
