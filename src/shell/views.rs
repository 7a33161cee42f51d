//! The four views. Exactly one is mounted at a time.

mod crop;
mod disease;
mod fertilizer;
mod home;

use std::time::Instant;

use crate::model::{Field, FormState, Provenance, Route, ViewId};
use crate::submission::{AdviceForm, SubmissionOrchestrator};

use super::Context;

use crop::CropView;
use disease::DiseaseView;
use fertilizer::FertilizerView;
use home::HomeView;

/// Which view is currently mounted.
pub enum Screen {
    Home(HomeView),
    Disease(DiseaseView),
    Crop(CropView),
    Fertilizer(FertilizerView),
}

impl Screen {
    /// Mount the view a route names, run its mount-time work, and render it.
    pub fn mount(route: &Route, ctx: &mut Context<'_>, out: &mut Vec<String>) -> Self {
        let screen = match route.view {
            ViewId::Home => Self::Home(HomeView::mount(ctx, jiff::Zoned::now().hour())),
            ViewId::Disease => Self::Disease(DiseaseView::mount(route, ctx, out)),
            ViewId::Crop => Self::Crop(CropView::mount(ctx, out)),
            ViewId::Fertilizer => Self::Fertilizer(FertilizerView::default()),
        };
        screen.render(out);
        screen
    }

    /// Let timed work finish. Called before every command.
    pub fn tick(&mut self, ctx: &mut Context<'_>, now: Instant, out: &mut Vec<String>) {
        if let Self::Crop(view) = self {
            view.tick(ctx, now, out);
        }
    }

    /// Handle a view-specific command. Returns `false` if the view has no such command.
    pub fn handle(
        &mut self,
        command: &str,
        args: &str,
        ctx: &mut Context<'_>,
        out: &mut Vec<String>,
    ) -> bool {
        match self {
            Self::Home(_) => false,
            Self::Disease(view) => view.handle(command, args, ctx, out),
            Self::Crop(view) => view.handle(command, args, ctx, out),
            Self::Fertilizer(view) => view.handle(command, args, ctx, out),
        }
    }

    pub fn render(&self, out: &mut Vec<String>) {
        match self {
            Self::Home(view) => view.render(out),
            Self::Disease(view) => view.render(out),
            Self::Crop(view) => view.render(out),
            Self::Fertilizer(view) => view.render(out),
        }
    }

    pub fn help(&self) -> &'static [&'static str] {
        match self {
            Self::Home(_) => &[],
            Self::Disease(_) => disease::HELP,
            Self::Crop(_) => crop::HELP,
            Self::Fertilizer(_) => fertilizer::HELP,
        }
    }

    #[cfg(test)]
    pub fn crop_form(&self) -> Option<&FormState> {
        match self {
            Self::Crop(view) => Some(view.form()),
            _ => None,
        }
    }
}

/// `set <field> <value>`: a direct user edit.
fn set_field(form: &mut FormState, args: &str, out: &mut Vec<String>) {
    let Some((name, value)) = args.split_once(char::is_whitespace) else {
        out.push("Usage: set <field> <value>".to_string());
        return;
    };
    let Some(field) = Field::parse(name) else {
        out.push(format!("Unknown field {name:?}."));
        return;
    };
    let value = value.trim();
    if form.edit(field, value) {
        out.push(format!("{field} = {value}"));
    } else {
        out.push(format!("{field} is not on this form."));
    }
}

/// One line per field, marking machine-filled values.
fn render_form(form: &FormState, out: &mut Vec<String>) {
    for field in form.fields() {
        let value = form.value(field).unwrap_or("-");
        let label = match field.unit() {
            "" => field.name().to_string(),
            unit => format!("{field} ({unit})"),
        };
        let mark = match form.provenance(field) {
            Provenance::AutoFilled => " (auto)",
            Provenance::Unset | Provenance::UserEdited => "",
        };
        out.push(format!("  {label}: {value}{mark}"));
    }
}

fn submit<F: AdviceForm>(
    orchestrator: &mut SubmissionOrchestrator<F>,
    form: &F,
    ctx: &mut Context<'_>,
    out: &mut Vec<String>,
) {
    if orchestrator.is_busy() {
        out.push("A submission is already in progress.".to_string());
        return;
    }
    orchestrator.submit(form, ctx.service, &mut *ctx.speaker);
    out.extend(orchestrator.render());
}
