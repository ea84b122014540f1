//! Drives one fill request through the form: scroll, highlight, type or
//! select, then check the declaration and press submit.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::accessor::{Control, ControlKind, FormAccessor, FormEvent, Locator, SelectOption};
use crate::config::FillerConfig;
use crate::error::Result;
use crate::request::FillRequest;
use crate::state::{CycleGuard, FillPhase};
use crate::typing::TypingPlan;
use crate::viewport;

/// What happened to one requested field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Typed character by character.
    Typed,
    /// Option with this value selected.
    Selected(String),
    /// Select control had no option matching the requested value.
    NoMatchingOption,
    /// No control with this id or name.
    Missing,
    /// Control exists but is neither a select nor free text.
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    /// Requested fields in fill order.
    pub fields: Vec<(String, FieldOutcome)>,
    pub declaration_checked: bool,
    pub submitted: bool,
}

impl FillReport {
    pub fn outcome(&self, field: &str) -> Option<&FieldOutcome> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, outcome)| outcome)
    }
}

/// First option whose value or label matches `wanted`, ignoring case.
pub fn match_option<'a>(options: &'a [SelectOption], wanted: &str) -> Option<&'a SelectOption> {
    let wanted = wanted.to_lowercase();
    options
        .iter()
        .find(|opt| opt.value.to_lowercase() == wanted || opt.text.to_lowercase() == wanted)
}

pub struct FormFillEngine<A> {
    form: A,
    config: FillerConfig,
}

impl<A: FormAccessor> FormFillEngine<A> {
    pub fn new(form: A, config: FillerConfig) -> Self {
        Self { form, config }
    }

    pub fn form(&self) -> &A {
        &self.form
    }

    pub fn config(&self) -> &FillerConfig {
        &self.config
    }

    /// Fill every requested field, tick the declaration and press submit.
    ///
    /// Stops at the first accessor error; the caller's guard still resets the
    /// shared state when it is dropped.
    pub async fn run(&self, cycle: &CycleGuard, request: &FillRequest) -> Result<FillReport> {
        let timing = &self.config.timing;
        cycle.advance(FillPhase::Filling);
        info!(request_id = %request.id, fields = request.fields.len(), "filling form");

        let mut report = FillReport::default();
        for name in &self.config.field_order {
            let Some(value) = request.value(name) else {
                continue;
            };
            let outcome = self.fill_field(name, value).await?;
            debug!(field = %name, ?outcome, "field done");
            report.fields.push((name.clone(), outcome));
            sleep(timing.field_delay).await;
        }

        if request.declaration {
            report.declaration_checked = self.check_declaration().await?;
        }

        sleep(timing.final_settle).await;

        cycle.advance(FillPhase::Submitting);
        report.submitted = self.submit().await?;
        Ok(report)
    }

    async fn fill_field(&self, name: &str, value: &str) -> Result<FieldOutcome> {
        let Some(control) = self.form.locate(&Locator::field(name)).await? else {
            warn!(field = %name, "field not found, skipping");
            return Ok(FieldOutcome::Missing);
        };

        self.scroll_into_view(&control).await?;
        self.form.set_highlight(&control, true).await?;

        let outcome = match control.kind {
            ControlKind::Select => self.select_option(&control, value).await?,
            kind if kind.is_free_text() => {
                self.type_value(&control, value).await?;
                FieldOutcome::Typed
            }
            kind => {
                debug!(field = %name, ?kind, "control is not fillable, leaving it alone");
                FieldOutcome::Unsupported
            }
        };

        sleep(self.config.timing.highlight_hold).await;
        self.form.set_highlight(&control, false).await?;
        Ok(outcome)
    }

    async fn select_option(&self, control: &Control, value: &str) -> Result<FieldOutcome> {
        let options = self.form.options(control).await?;
        let Some(option) = match_option(&options, value) else {
            debug!(value, "no option matches");
            return Ok(FieldOutcome::NoMatchingOption);
        };
        self.form.set_value(control, &option.value).await?;
        self.form.dispatch(control, FormEvent::Change).await?;
        Ok(FieldOutcome::Selected(option.value.clone()))
    }

    async fn type_value(&self, control: &Control, value: &str) -> Result<()> {
        let plan = TypingPlan::for_text(value);
        self.form.set_value(control, "").await?;
        self.form.focus(control).await?;

        let mut buf = [0u8; 4];
        for ch in value.chars() {
            self.form.append_value(control, ch.encode_utf8(&mut buf)).await?;
            self.form.dispatch(control, FormEvent::Input).await?;
            sleep(plan.per_char()).await;
        }
        Ok(())
    }

    async fn check_declaration(&self) -> Result<bool> {
        let locator = Locator::name(&self.config.declaration_field);
        let Some(checkbox) = self.form.locate(&locator).await? else {
            warn!(field = %self.config.declaration_field, "declaration checkbox not found");
            return Ok(false);
        };

        sleep(self.config.timing.field_delay).await;
        self.scroll_into_view(&checkbox).await?;

        let container = self
            .form
            .locate(&locator.parent())
            .await?
            .unwrap_or_else(|| checkbox.clone());
        self.form.set_highlight(&container, true).await?;
        self.form.activate(&checkbox).await?;
        sleep(self.config.timing.checkbox_hold).await;
        self.form.set_highlight(&container, false).await?;
        Ok(true)
    }

    async fn submit(&self) -> Result<bool> {
        let locator = Locator::selector(&self.config.submit_selector);
        let Some(button) = self.form.locate(&locator).await? else {
            warn!(selector = %self.config.submit_selector, "submit control not found");
            return Ok(false);
        };

        info!("submitting form");
        self.scroll_into_view(&button).await?;
        self.form.focus(&button).await?;
        sleep(self.config.timing.submit_focus_hold).await;
        self.form.activate(&button).await?;
        Ok(true)
    }

    /// Center the control if it is hidden; returns whether a scroll happened.
    async fn scroll_into_view(&self, control: &Control) -> Result<bool> {
        let geometry = self.form.geometry(control).await?;
        if !viewport::is_out_of_view(&geometry, self.config.header_margin) {
            return Ok(false);
        }
        self.form
            .scroll_to(viewport::centered_scroll_top(&geometry))
            .await?;
        sleep(self.config.timing.scroll_settle).await;
        Ok(true)
    }
}
