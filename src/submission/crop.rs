//! Crop recommendation form.

use crate::http::TransportError;
use crate::model::{CropRecommendation, Field, FormState};
use crate::service::{AgronomyService, CropRequest};

use super::{AdviceForm, ValidationError, number};

/// The seven soil and climate inputs.
#[derive(Debug, Clone)]
pub struct CropForm {
    pub fields: FormState,
}

impl CropForm {
    pub fn new() -> Self {
        Self {
            fields: FormState::new(&Field::CROP),
        }
    }
}

impl Default for CropForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AdviceForm for CropForm {
    type Request = CropRequest;
    type Payload = CropRecommendation;

    const REJECTION_FALLBACK: &'static str =
        "Error getting recommendation. Please check if all fields are filled correctly.";

    fn validate(&self) -> Result<CropRequest, ValidationError> {
        let f = &self.fields;
        Ok(CropRequest {
            nitrogen: number(f, Field::Nitrogen)?,
            phosphorus: number(f, Field::Phosphorus)?,
            potassium: number(f, Field::Potassium)?,
            temperature: number(f, Field::Temperature)?,
            humidity: number(f, Field::Humidity)?,
            rainfall: number(f, Field::Rainfall)?,
            ph: number(f, Field::Ph)?,
        })
    }

    fn send(
        service: &dyn AgronomyService,
        request: &CropRequest,
    ) -> Result<CropRecommendation, TransportError> {
        service.recommend_crop(request)
    }

    fn spoken_summary(payload: &CropRecommendation) -> Option<String> {
        payload
            .top()
            .map(|crop| format!("I recommend planting {crop}."))
    }

    fn render(payload: &CropRecommendation) -> Vec<String> {
        match payload.top() {
            Some(crop) => vec![format!("Recommended crop: {crop}")],
            None => vec!["No recommendation returned.".to_string()],
        }
    }
}
