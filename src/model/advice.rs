//! Advice payloads returned by the remote agronomy endpoints.

use serde::{Deserialize, Serialize};

/// Result of the disease diagnosis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseDiagnosis {
    pub crop: String,
    pub disease: String,

    /// Percentage in `0..=100`.
    pub confidence: f64,

    /// Free text. May contain `<br/>` markers meant as line breaks.
    pub recommendation: String,
}

/// Result of the crop recommendation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    /// Ranked crop names; the first is the top recommendation.
    pub recommended_crops: Vec<String>,
}

impl CropRecommendation {
    pub fn top(&self) -> Option<&str> {
        self.recommended_crops.first().map(String::as_str)
    }
}

/// Result of the fertilizer recommendation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerAdvice {
    pub analysis: NutrientAnalysis,

    /// HTML-ish advice text.
    pub recommendation: String,
}

/// The nutrient assessment behind a fertilizer recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientAnalysis {
    /// `High` or `Low`.
    pub status: String,

    /// The nutrient with the largest deviation: `N`, `P`, or `K`.
    #[serde(default)]
    pub nutrient_focus: Option<String>,
}
