//! Crop advisor: soil and climate inputs, autofilled from weather and a
//! soil photo.

use std::path::Path;
use std::time::Instant;

use crate::autofill::{AutofillPipeline, MergeReport};
use crate::model::Field;
use crate::shell::Context;
use crate::submission::{CropForm, SubmissionOrchestrator};

pub const HELP: &[&str] = &[
    "set <field> <v>  edit a field (n, p, k, temperature, humidity, rainfall, ph)",
    "soil <path>      analyze a soil photo to fill N, P, K and pH",
    "wait             let a running soil analysis finish",
    "reset            start over and refill from current weather",
    "submit           ask for a crop recommendation",
];

pub struct CropView {
    form: CropForm,
    pipeline: AutofillPipeline,
    orchestrator: SubmissionOrchestrator<CropForm>,
}

impl CropView {
    /// Mount and run the weather autofill once.
    pub fn mount(ctx: &mut Context<'_>, out: &mut Vec<String>) -> Self {
        let mut view = Self {
            form: CropForm::new(),
            pipeline: AutofillPipeline::new(ctx.soil_latency),
            orchestrator: SubmissionOrchestrator::new(),
        };
        let report = view
            .pipeline
            .run_weather(&mut view.form.fields, ctx.location.sample(), ctx.weather);
        if let Some(report) = report {
            report_merge("Filled from current weather", &report, out);
        }
        view
    }

    #[cfg(test)]
    pub fn form(&self) -> &crate::model::FormState {
        &self.form.fields
    }

    pub fn tick(&mut self, ctx: &mut Context<'_>, now: Instant, out: &mut Vec<String>) {
        if let Some(report) = self
            .pipeline
            .poll_soil(&mut self.form.fields, now, &mut ctx.rng)
        {
            report_merge("Soil analysis complete", &report, out);
        }
    }

    pub fn handle(
        &mut self,
        command: &str,
        args: &str,
        ctx: &mut Context<'_>,
        out: &mut Vec<String>,
    ) -> bool {
        match command {
            "set" => super::set_field(&mut self.form.fields, args, out),
            "soil" => self.attach_soil(args, out),
            "wait" => self.wait(ctx, out),
            "reset" => {
                out.push("Cleared.".to_string());
                *self = Self::mount(ctx, out);
            }
            "submit" => super::submit(&mut self.orchestrator, &self.form, ctx, out),
            _ => return false,
        }
        true
    }

    fn attach_soil(&mut self, path: &str, out: &mut Vec<String>) {
        if path.is_empty() {
            out.push("Usage: soil <path>".to_string());
            return;
        }
        if !Path::new(path).is_file() {
            out.push(format!("✗ cannot read {path}"));
            return;
        }
        match self.pipeline.attach_soil_sample(Instant::now()) {
            Ok(_) => out.push("Analyzing soil sample...".to_string()),
            Err(e) => out.push(format!("✗ {e}")),
        }
    }

    fn wait(&mut self, ctx: &mut Context<'_>, out: &mut Vec<String>) {
        let Some(ready_at) = self.pipeline.soil_ready_at() else {
            out.push("Nothing to wait for.".to_string());
            return;
        };
        let now = Instant::now();
        if ready_at > now {
            std::thread::sleep(ready_at - now);
        }
        self.tick(ctx, Instant::now(), out);
    }

    pub fn render(&self, out: &mut Vec<String>) {
        if self.pipeline.soil_busy() {
            out.push("  (analyzing soil sample...)".to_string());
        }
        super::render_form(&self.form.fields, out);
        out.extend(self.orchestrator.render());
    }
}

fn report_merge(what: &str, report: &MergeReport, out: &mut Vec<String>) {
    let names = |fields: &[Field]| {
        fields
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut line = format!("{what}: filled {}", names(&report.applied));
    if report.applied.is_empty() {
        line = format!("{what}: nothing filled");
    }
    if !report.discarded.is_empty() {
        line.push_str(&format!("; kept your {}", names(&report.discarded)));
    }
    out.push(format!("{line}."));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_report_mentions_kept_fields() {
        let mut out = Vec::new();
        report_merge(
            "Soil analysis complete",
            &MergeReport {
                applied: vec![Field::Phosphorus, Field::Ph],
                discarded: vec![Field::Nitrogen],
            },
            &mut out,
        );
        assert_eq!(
            out,
            vec!["Soil analysis complete: filled phosphorus, ph; kept your nitrogen."]
        );
    }
}
