//! Remote agronomy endpoints: disease diagnosis, crop and fertilizer
//! recommendation.
//!
//! The inference behind them is opaque; this module only speaks their
//! request and response shapes.

use std::path::Path;
use std::{fs, io};

use reqwest::blocking::Client;
use reqwest::blocking::multipart::{Form, Part};
use serde::Serialize;

use crate::http::{self, TransportError};
use crate::model::{CropRecommendation, DiseaseDiagnosis, FertilizerAdvice};

/// An image ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Read an image from disk. The content type is guessed from the extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        let file_name = path
            .file_name()
            .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
        let content_type = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("jpg" | "jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("gif") => "image/gif",
            Some("bmp") => "image/bmp",
            _ => "application/octet-stream",
        };
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }
}

/// Crop recommendation request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropRequest {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub ph: f64,
}

/// Fertilizer recommendation request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FertilizerRequest {
    /// Crop slug: lowercase, whitespace removed.
    pub crop: String,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

/// The three remote advisors.
pub trait AgronomyService {
    fn predict_disease(&self, image: &ImageUpload) -> Result<DiseaseDiagnosis, TransportError>;

    fn recommend_crop(&self, request: &CropRequest) -> Result<CropRecommendation, TransportError>;

    fn recommend_fertilizer(
        &self,
        request: &FertilizerRequest,
    ) -> Result<FertilizerAdvice, TransportError>;
}

/// HTTP client for the agronomy backend.
pub struct HttpAgronomyService {
    client: Client,
    base_url: String,
}

impl HttpAgronomyService {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        T: serde::de::DeserializeOwned,
        B: Serialize,
    {
        http::send_json(self.client.post(self.url(path)).json(body))
    }
}

impl AgronomyService for HttpAgronomyService {
    fn predict_disease(&self, image: &ImageUpload) -> Result<DiseaseDiagnosis, TransportError> {
        let form = Form::new().part("file", image_part(image));
        http::send_json(self.client.post(self.url("/predict-disease")).multipart(form))
    }

    fn recommend_crop(&self, request: &CropRequest) -> Result<CropRecommendation, TransportError> {
        self.post_json("/recommend-crop", request)
    }

    fn recommend_fertilizer(
        &self,
        request: &FertilizerRequest,
    ) -> Result<FertilizerAdvice, TransportError> {
        self.post_json("/recommend-fertilizer", request)
    }
}

/// The upload's file part. Control characters never reach the part headers.
fn image_part(image: &ImageUpload) -> Part {
    let file_name: String = image.file_name.chars().filter(|c| !c.is_control()).collect();
    let part = || Part::bytes(image.bytes.clone()).file_name(file_name.clone());
    part().mime_str(image.content_type).unwrap_or_else(|_| part())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::Cell;

    use super::{AgronomyService, CropRequest, FertilizerRequest, ImageUpload};
    use crate::http::TransportError;
    use crate::model::{CropRecommendation, DiseaseDiagnosis, FertilizerAdvice, NutrientAnalysis};

    /// Answers every endpoint from canned results and counts calls.
    pub struct FakeService {
        pub diagnosis: Result<DiseaseDiagnosis, TransportError>,
        pub crop: Result<CropRecommendation, TransportError>,
        pub fertilizer: Result<FertilizerAdvice, TransportError>,
        pub calls: Cell<usize>,
    }

    impl Default for FakeService {
        fn default() -> Self {
            Self {
                diagnosis: Ok(DiseaseDiagnosis {
                    crop: "Tomato".to_string(),
                    disease: "Early blight".to_string(),
                    confidence: 92.0,
                    recommendation: "Remove infected leaves.<br/>Apply copper fungicide."
                        .to_string(),
                }),
                crop: Ok(CropRecommendation {
                    recommended_crops: vec!["rice".to_string(), "maize".to_string()],
                }),
                fertilizer: Ok(FertilizerAdvice {
                    analysis: NutrientAnalysis {
                        status: "Low".to_string(),
                        nutrient_focus: Some("N".to_string()),
                    },
                    recommendation: "<b>Nitrogen is low.</b><br/>Add manure.".to_string(),
                }),
                calls: Cell::new(0),
            }
        }
    }

    impl FakeService {
        pub fn calls(&self) -> usize {
            self.calls.get()
        }
    }

    impl AgronomyService for FakeService {
        fn predict_disease(&self, _: &ImageUpload) -> Result<DiseaseDiagnosis, TransportError> {
            self.calls.set(self.calls.get() + 1);
            self.diagnosis.clone()
        }

        fn recommend_crop(&self, _: &CropRequest) -> Result<CropRecommendation, TransportError> {
            self.calls.set(self.calls.get() + 1);
            self.crop.clone()
        }

        fn recommend_fertilizer(
            &self,
            _: &FertilizerRequest,
        ) -> Result<FertilizerAdvice, TransportError> {
            self.calls.set(self.calls.get() + 1);
            self.fertilizer.clone()
        }
    }
}
