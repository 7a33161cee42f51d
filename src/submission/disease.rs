//! Disease diagnosis form: a single leaf photo.

use crate::http::TransportError;
use crate::model::DiseaseDiagnosis;
use crate::service::{AgronomyService, ImageUpload};

use super::{AdviceForm, ValidationError, line_breaks};

/// The attached photo, if any.
#[derive(Debug, Clone, Default)]
pub struct DiagnosisForm {
    pub image: Option<ImageUpload>,
}

impl AdviceForm for DiagnosisForm {
    type Request = ImageUpload;
    type Payload = DiseaseDiagnosis;

    const REJECTION_FALLBACK: &'static str = "Error predicting disease. Please try again.";

    fn validate(&self) -> Result<ImageUpload, ValidationError> {
        self.image.clone().ok_or(ValidationError::NoImage)
    }

    fn send(
        service: &dyn AgronomyService,
        request: &ImageUpload,
    ) -> Result<DiseaseDiagnosis, TransportError> {
        service.predict_disease(request)
    }

    fn spoken_summary(payload: &DiseaseDiagnosis) -> Option<String> {
        Some(format!(
            "I found {} on the {}. Confidence is {} percent.",
            payload.disease, payload.crop, payload.confidence
        ))
    }

    fn render(payload: &DiseaseDiagnosis) -> Vec<String> {
        let mut lines = vec![
            format!("Crop:     {}", payload.crop),
            format!("Disease:  {}", payload.disease),
            format!("Match:    {}%", payload.confidence),
            String::new(),
        ];
        lines.extend(line_breaks(&payload.recommendation).lines().map(String::from));
        lines
    }
}
