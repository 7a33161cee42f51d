//! Core data model for Krishi.
//!
//! These types are shared by every view and pipeline:
//! navigation routes, voice intents, form state with provenance,
//! the cached location, and the payloads returned by the remote advisors.

mod advice;
mod form;
mod intent;
mod location;
mod market;
mod outcome;
mod view;

pub use advice::{CropRecommendation, DiseaseDiagnosis, FertilizerAdvice, NutrientAnalysis};
pub use form::{Field, FormState, Provenance};
pub use intent::Intent;
pub use location::{Coordinates, LocationSample};
pub use market::MarketRecord;
pub use outcome::{ErrorKind, SubmissionResult};
pub use view::{Route, ViewId};
