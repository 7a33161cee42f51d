//! Fertilizer advice form: a crop plus its N/P/K readings.

use crate::http::TransportError;
use crate::model::{FertilizerAdvice, Field, FormState, NutrientAnalysis};
use crate::service::{AgronomyService, FertilizerRequest};

use super::{AdviceForm, ValidationError, number};

/// Crops the fertilizer advisor knows about, in display order.
pub const CROPS: [&str; 22] = [
    "Rice",
    "Maize",
    "Chickpea",
    "Kidney Beans",
    "Pigeon Peas",
    "Moth Beans",
    "Mung Bean",
    "Black Gram",
    "Lentil",
    "Pomegranate",
    "Banana",
    "Mango",
    "Grapes",
    "Watermelon",
    "Muskmelon",
    "Apple",
    "Orange",
    "Papaya",
    "Coconut",
    "Cotton",
    "Jute",
    "Coffee",
];

/// The identifier the advisor expects: lowercase, whitespace removed.
pub fn crop_slug(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Resolve user input (display name or slug, any case) to a catalogue slug.
fn resolve_crop(input: &str) -> Option<String> {
    let wanted = crop_slug(input);
    CROPS
        .iter()
        .map(|name| crop_slug(name))
        .find(|slug| *slug == wanted)
}

#[derive(Debug, Clone)]
pub struct FertilizerForm {
    pub crop: Option<String>,
    pub nutrients: FormState,
}

impl FertilizerForm {
    pub fn new() -> Self {
        Self {
            crop: None,
            nutrients: FormState::new(&Field::NUTRIENTS),
        }
    }
}

impl Default for FertilizerForm {
    fn default() -> Self {
        Self::new()
    }
}

impl AdviceForm for FertilizerForm {
    type Request = FertilizerRequest;
    type Payload = FertilizerAdvice;

    const REJECTION_FALLBACK: &'static str =
        "Failed to get advice. Make sure all fields are filled.";

    fn validate(&self) -> Result<FertilizerRequest, ValidationError> {
        let raw = self
            .crop
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or(ValidationError::NoCrop)?;
        let crop = resolve_crop(raw).ok_or_else(|| ValidationError::UnknownCrop(raw.to_string()))?;
        let n = &self.nutrients;
        Ok(FertilizerRequest {
            crop,
            nitrogen: number(n, Field::Nitrogen)?,
            phosphorus: number(n, Field::Phosphorus)?,
            potassium: number(n, Field::Potassium)?,
        })
    }

    fn send(
        service: &dyn AgronomyService,
        request: &FertilizerRequest,
    ) -> Result<FertilizerAdvice, TransportError> {
        service.recommend_fertilizer(request)
    }

    fn spoken_summary(payload: &FertilizerAdvice) -> Option<String> {
        Some(format!(
            "The status is {}. Check the screen for detailed recommendations.",
            payload.analysis.status
        ))
    }

    fn render(payload: &FertilizerAdvice) -> Vec<String> {
        let mut lines = analysis_lines(&payload.analysis);
        lines.push(String::new());
        lines.extend(
            strip_markup(&payload.recommendation)
                .lines()
                .map(str::trim_end)
                .map(String::from),
        );
        lines
    }
}

fn analysis_lines(analysis: &NutrientAnalysis) -> Vec<String> {
    let mut lines = vec![format!("Status: {}", analysis.status)];
    if let Some(focus) = &analysis.nutrient_focus {
        lines.push(format!("Focus:  {focus}"));
    }
    lines
}

/// Reduce the advisor's HTML fragment to plain text.
///
/// Line breaks and block ends become newlines; every other tag is dropped.
fn strip_markup(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let tag = rest[open + 1..open + close]
            .trim()
            .trim_end_matches('/')
            .trim()
            .to_ascii_lowercase();
        let name = tag.split_whitespace().next().unwrap_or_default();
        if matches!(name, "br" | "/p" | "/div" | "/li" | "/h1" | "/h2" | "/h3" | "/h4") {
            out.push('\n');
        } else if name == "li" {
            out.push_str("- ");
        }
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    decode_entities(&out)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
