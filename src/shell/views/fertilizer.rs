//! Fertilizer guide: a crop plus its soil nutrient readings.

use crate::shell::Context;
use crate::submission::{CROPS, FertilizerForm, SubmissionOrchestrator};

pub const HELP: &[&str] = &[
    "crop <name>      choose the crop (`crop` alone lists them)",
    "set <n|p|k> <v>  enter a nutrient reading",
    "reset            clear the form and result",
    "submit           ask for fertilizer advice",
];

#[derive(Default)]
pub struct FertilizerView {
    form: FertilizerForm,
    orchestrator: SubmissionOrchestrator<FertilizerForm>,
}

impl FertilizerView {
    pub fn handle(
        &mut self,
        command: &str,
        args: &str,
        ctx: &mut Context<'_>,
        out: &mut Vec<String>,
    ) -> bool {
        match command {
            "crop" if args.is_empty() => out.push(format!("Crops: {}", CROPS.join(", "))),
            "crop" => {
                self.form.crop = Some(args.to_string());
                out.push(format!("crop = {args}"));
            }
            "set" => super::set_field(&mut self.form.nutrients, args, out),
            "reset" => {
                self.form = FertilizerForm::default();
                self.orchestrator.clear();
                out.push("Cleared.".to_string());
            }
            "submit" => super::submit(&mut self.orchestrator, &self.form, ctx, out),
            _ => return false,
        }
        true
    }

    pub fn render(&self, out: &mut Vec<String>) {
        out.push(format!(
            "  crop: {}",
            self.form.crop.as_deref().unwrap_or("Choose a crop...")
        ));
        super::render_form(&self.form.nutrients, out);
        out.extend(self.orchestrator.render());
    }
}
