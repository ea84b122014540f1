//! The capability boundary between the fill engine and a live document.
//!
//! The engine never touches a DOM directly. Everything it needs (finding a
//! control, reading its geometry, writing values, firing events) goes through
//! [`FormAccessor`], so the same state machine drives a Chromium page in
//! production and an in-memory form in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How to find a control in the document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Element id first, then the first element with a matching `name`.
    Field(String),
    /// First element with a matching `name` attribute.
    Name(String),
    /// CSS selector.
    Selector(String),
    /// Parent element of whatever the inner locator resolves to.
    ParentOf(Box<Locator>),
}

impl Locator {
    pub fn field(name: impl Into<String>) -> Self {
        Locator::Field(name.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Locator::Name(name.into())
    }

    pub fn selector(selector: impl Into<String>) -> Self {
        Locator::Selector(selector.into())
    }

    pub fn parent(&self) -> Self {
        Locator::ParentOf(Box::new(self.clone()))
    }
}

/// Kind of form control, as far as filling is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// `<select>`: closed set of options.
    Select,
    /// Single-line text-like `<input>`.
    TextInput,
    /// `<textarea>`.
    TextArea,
    Checkbox,
    Button,
    /// Anything else (radio buttons, numeric inputs, plain elements).
    Other,
}

impl ControlKind {
    /// Classify an element from its lowercase tag name and `type` attribute.
    pub fn classify(tag: &str, input_type: &str) -> Self {
        match tag {
            "select" => ControlKind::Select,
            "textarea" => ControlKind::TextArea,
            "button" => ControlKind::Button,
            "input" => match input_type {
                "" | "text" | "search" | "email" | "tel" | "url" => ControlKind::TextInput,
                "checkbox" => ControlKind::Checkbox,
                "submit" | "button" => ControlKind::Button,
                _ => ControlKind::Other,
            },
            _ => ControlKind::Other,
        }
    }

    /// Whether values are typed into this control character by character.
    pub fn is_free_text(self) -> bool {
        matches!(self, ControlKind::TextInput | ControlKind::TextArea)
    }
}

/// A located control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub locator: Locator,
    pub kind: ControlKind,
}

/// Where a control sits relative to the viewport, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// Bounding box top, relative to the viewport.
    pub top: f64,
    /// Bounding box bottom, relative to the viewport.
    pub bottom: f64,
    /// Offset from the top of the document.
    pub offset_top: f64,
    pub offset_height: f64,
    pub viewport_height: f64,
}

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// Semantic events dispatched to a control after it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    Input,
    Change,
}

impl FormEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            FormEvent::Input => "input",
            FormEvent::Change => "change",
        }
    }
}

/// Everything the fill engine needs from a document.
#[async_trait]
pub trait FormAccessor: Send + Sync {
    /// Resolve a locator, returning `None` if nothing matches.
    async fn locate(&self, locator: &Locator) -> Result<Option<Control>>;

    async fn geometry(&self, control: &Control) -> Result<Geometry>;

    /// Smoothly scroll the window so its top edge sits at `top`.
    async fn scroll_to(&self, top: f64) -> Result<()>;

    /// Turn the "being edited" highlight on or off.
    async fn set_highlight(&self, control: &Control, on: bool) -> Result<()>;

    async fn options(&self, control: &Control) -> Result<Vec<SelectOption>>;

    async fn value(&self, control: &Control) -> Result<String>;

    async fn set_value(&self, control: &Control, value: &str) -> Result<()>;

    /// Append `text` to the current value.
    async fn append_value(&self, control: &Control, text: &str) -> Result<()>;

    async fn dispatch(&self, control: &Control, event: FormEvent) -> Result<()>;

    async fn focus(&self, control: &Control) -> Result<()>;

    /// Activate the control the way a user click would, firing its handlers.
    async fn activate(&self, control: &Control) -> Result<()>;

    /// Value of the hidden input called `field_name`, if present.
    async fn hidden_value(&self, field_name: &str) -> Result<Option<String>>;
}
