//! Disease detection: attach a leaf photo and ask for a diagnosis.

use std::path::Path;

use crate::deferred::Instruction;
use crate::model::Route;
use crate::service::ImageUpload;
use crate::shell::Context;
use crate::submission::{DiagnosisForm, SubmissionOrchestrator};

pub const HELP: &[&str] = &[
    "image <path>     attach a leaf photo",
    "reset            clear the photo and result",
    "submit           diagnose the attached photo",
];

#[derive(Default)]
pub struct DiseaseView {
    form: DiagnosisForm,
    orchestrator: SubmissionOrchestrator<DiagnosisForm>,
    capture_open: bool,
}

impl DiseaseView {
    /// Mount, honoring a capture instruction carried by the route.
    pub fn mount(route: &Route, ctx: &mut Context<'_>, out: &mut Vec<String>) -> Self {
        let mut view = Self::default();
        if ctx.channel.consume(route) == Some(Instruction::AutoOpenCapture) {
            view.capture_open = true;
            out.push("📷 Camera opened. Attach a photo with `image <path>`.".to_string());
        }
        view
    }

    pub fn handle(
        &mut self,
        command: &str,
        args: &str,
        ctx: &mut Context<'_>,
        out: &mut Vec<String>,
    ) -> bool {
        match command {
            "image" => self.attach(args, out),
            "reset" => {
                self.form.image = None;
                self.orchestrator.clear();
                out.push("Cleared.".to_string());
            }
            "submit" => super::submit(&mut self.orchestrator, &self.form, ctx, out),
            _ => return false,
        }
        true
    }

    fn attach(&mut self, path: &str, out: &mut Vec<String>) {
        if path.is_empty() {
            out.push("Usage: image <path>".to_string());
            return;
        }
        match ImageUpload::from_path(Path::new(path)) {
            Ok(image) => {
                out.push(format!("Attached {} ({} bytes).", image.file_name, image.bytes.len()));
                self.form.image = Some(image);
                self.orchestrator.clear();
                self.capture_open = false;
            }
            Err(e) => out.push(format!("✗ cannot read {path}: {e}")),
        }
    }

    pub fn render(&self, out: &mut Vec<String>) {
        match &self.form.image {
            Some(image) => out.push(format!("Photo: {}", image.file_name)),
            None if self.capture_open => out.push("Photo: waiting for capture".to_string()),
            None => out.push("Photo: none (use `image <path>`)".to_string()),
        }
        out.extend(self.orchestrator.render());
    }
}
