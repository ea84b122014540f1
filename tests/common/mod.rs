#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use autofill_agent::{
    Control, ControlKind, Error, FillRequest, FormAccessor, FormEvent, Geometry, Locator,
    RequestId, Result, SelectOption, WorkQueue,
};

pub const VIEWPORT_HEIGHT: f64 = 800.0;

/// One control of the in-memory form.
#[derive(Debug, Clone)]
pub struct FakeControl {
    pub key: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub selector: Option<String>,
    pub kind: ControlKind,
    pub value: String,
    pub options: Vec<SelectOption>,
    pub offset_top: f64,
    pub checked: bool,
}

impl FakeControl {
    fn new(key: &str, kind: ControlKind) -> Self {
        Self {
            key: key.to_string(),
            id: Some(key.to_string()),
            name: Some(key.to_string()),
            selector: None,
            kind,
            value: String::new(),
            options: Vec::new(),
            offset_top: 300.0,
            checked: false,
        }
    }

    pub fn text(key: &str) -> Self {
        Self::new(key, ControlKind::TextInput)
    }

    pub fn textarea(key: &str) -> Self {
        Self::new(key, ControlKind::TextArea)
    }

    pub fn select(key: &str, options: &[(&str, &str)]) -> Self {
        let mut control = Self::new(key, ControlKind::Select);
        control.options = options
            .iter()
            .map(|(value, text)| SelectOption {
                value: value.to_string(),
                text: text.to_string(),
            })
            .collect();
        control
    }

    pub fn checkbox(name: &str) -> Self {
        let mut control = Self::new(name, ControlKind::Checkbox);
        control.id = None;
        control
    }

    pub fn submit(selector: &str) -> Self {
        let mut control = Self::new("submit", ControlKind::Button);
        control.id = None;
        control.name = None;
        control.selector = Some(selector.to_string());
        control
    }

    /// Reachable only through its `name` attribute.
    pub fn name_only(mut self) -> Self {
        self.id = None;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }

    /// Place the control `offset_top` pixels down the document.
    pub fn at(mut self, offset_top: f64) -> Self {
        self.offset_top = offset_top;
        self
    }
}

/// Everything the engine did to the form, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ScrollTo(f64),
    Highlight(String, bool),
    SetValue(String, String),
    Append(String, String),
    Dispatch(String, FormEvent),
    Focus(String),
    Activate(String),
}

impl Action {
    pub fn key(&self) -> Option<&str> {
        match self {
            Action::ScrollTo(_) => None,
            Action::Highlight(k, _)
            | Action::SetValue(k, _)
            | Action::Append(k, _)
            | Action::Dispatch(k, _)
            | Action::Focus(k)
            | Action::Activate(k) => Some(k),
        }
    }
}

#[derive(Debug, Default)]
struct FormInner {
    controls: Vec<FakeControl>,
    actions: Vec<Action>,
    hidden: HashMap<String, String>,
    scroll_top: f64,
    fail_on: Option<String>,
}

/// In-memory document implementing [`FormAccessor`]. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeForm {
    inner: Arc<Mutex<FormInner>>,
}

impl FakeForm {
    pub fn new(controls: Vec<FakeControl>) -> Self {
        let form = Self::default();
        form.inner.lock().unwrap().controls = controls;
        form
    }

    pub fn with_hidden(self, name: &str, value: &str) -> Self {
        self.inner
            .lock()
            .unwrap()
            .hidden
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Make every accessor call touching `key` fail.
    pub fn failing_on(self, key: &str) -> Self {
        self.inner.lock().unwrap().fail_on = Some(key.to_string());
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.lock().unwrap().actions.clone()
    }

    pub fn actions_for(&self, key: &str) -> Vec<Action> {
        self.actions()
            .into_iter()
            .filter(|a| a.key() == Some(key))
            .collect()
    }

    pub fn control(&self, key: &str) -> FakeControl {
        self.inner
            .lock()
            .unwrap()
            .controls
            .iter()
            .find(|c| c.key == key)
            .cloned()
            .unwrap_or_else(|| panic!("no control {key}"))
    }

    fn find(inner: &FormInner, locator: &Locator) -> Option<usize> {
        let by_name = |n: &str| inner.controls.iter().position(|c| c.name.as_deref() == Some(n));
        match locator {
            Locator::Field(n) => inner
                .controls
                .iter()
                .position(|c| c.id.as_deref() == Some(n.as_str()))
                .or_else(|| by_name(n.as_str())),
            Locator::Name(n) => by_name(n.as_str()),
            Locator::Selector(s) => inner
                .controls
                .iter()
                .position(|c| c.selector.as_deref() == Some(s.as_str())),
            Locator::ParentOf(inner_locator) => Self::find(inner, inner_locator),
        }
    }

    fn key_of(inner: &FormInner, locator: &Locator) -> Result<String> {
        let idx = Self::find(inner, locator)
            .ok_or_else(|| Error::ElementNotFound(format!("{locator:?}")))?;
        let key = &inner.controls[idx].key;
        if inner.fail_on.as_deref() == Some(key.as_str()) {
            return Err(Error::JsError(format!("{key} detached")));
        }
        Ok(match locator {
            Locator::ParentOf(_) => format!("{key}:parent"),
            _ => key.clone(),
        })
    }

    fn record(&self, control: &Control, action: impl FnOnce(String) -> Action) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let key = Self::key_of(&inner, &control.locator)?;
        inner.actions.push(action(key));
        Ok(())
    }

    fn with_control<T>(
        &self,
        control: &Control,
        f: impl FnOnce(&mut FakeControl) -> T,
    ) -> Result<T> {
        let mut inner = self.inner.lock().unwrap();
        Self::key_of(&inner, &control.locator)?;
        let idx = Self::find(&inner, &control.locator)
            .ok_or_else(|| Error::ElementNotFound(format!("{:?}", control.locator)))?;
        Ok(f(&mut inner.controls[idx]))
    }
}

#[async_trait]
impl FormAccessor for FakeForm {
    async fn locate(&self, locator: &Locator) -> Result<Option<Control>> {
        let inner = self.inner.lock().unwrap();
        let Some(idx) = Self::find(&inner, locator) else {
            return Ok(None);
        };
        Self::key_of(&inner, locator)?;
        let kind = match locator {
            Locator::ParentOf(_) => ControlKind::Other,
            _ => inner.controls[idx].kind,
        };
        Ok(Some(Control {
            locator: locator.clone(),
            kind,
        }))
    }

    async fn geometry(&self, control: &Control) -> Result<Geometry> {
        let scroll_top = self.inner.lock().unwrap().scroll_top;
        let offset_top = self.with_control(control, |c| c.offset_top)?;
        let top = offset_top - scroll_top;
        Ok(Geometry {
            top,
            bottom: top + 40.0,
            offset_top,
            offset_height: 40.0,
            viewport_height: VIEWPORT_HEIGHT,
        })
    }

    async fn scroll_to(&self, top: f64) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.scroll_top = top;
        inner.actions.push(Action::ScrollTo(top));
        Ok(())
    }

    async fn set_highlight(&self, control: &Control, on: bool) -> Result<()> {
        self.record(control, |k| Action::Highlight(k, on))
    }

    async fn options(&self, control: &Control) -> Result<Vec<SelectOption>> {
        self.with_control(control, |c| c.options.clone())
    }

    async fn value(&self, control: &Control) -> Result<String> {
        self.with_control(control, |c| c.value.clone())
    }

    async fn set_value(&self, control: &Control, value: &str) -> Result<()> {
        self.with_control(control, |c| c.value = value.to_string())?;
        self.record(control, |k| Action::SetValue(k, value.to_string()))
    }

    async fn append_value(&self, control: &Control, text: &str) -> Result<()> {
        self.with_control(control, |c| c.value.push_str(text))?;
        self.record(control, |k| Action::Append(k, text.to_string()))
    }

    async fn dispatch(&self, control: &Control, event: FormEvent) -> Result<()> {
        self.record(control, |k| Action::Dispatch(k, event))
    }

    async fn focus(&self, control: &Control) -> Result<()> {
        self.record(control, Action::Focus)
    }

    async fn activate(&self, control: &Control) -> Result<()> {
        self.with_control(control, |c| {
            if c.kind == ControlKind::Checkbox {
                c.checked = !c.checked;
            }
        })?;
        self.record(control, Action::Activate)
    }

    async fn hidden_value(&self, field_name: &str) -> Result<Option<String>> {
        Ok(self.inner.lock().unwrap().hidden.get(field_name).cloned())
    }
}

/// Scripted answer to one poll.
#[derive(Debug, Clone)]
pub enum Poll {
    Work(FillRequest),
    Empty,
    Fail,
}

#[derive(Debug, Default)]
struct QueueInner {
    polls: VecDeque<Poll>,
    poll_count: usize,
    acks: Vec<(RequestId, String)>,
    fail_acks: bool,
}

/// Scripted [`WorkQueue`]. Once the script runs out every poll is empty.
#[derive(Debug, Clone, Default)]
pub struct FakeQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl FakeQueue {
    pub fn new(polls: Vec<Poll>) -> Self {
        let queue = Self::default();
        queue.inner.lock().unwrap().polls = polls.into();
        queue
    }

    pub fn failing_acks(self) -> Self {
        self.inner.lock().unwrap().fail_acks = true;
        self
    }

    pub fn poll_count(&self) -> usize {
        self.inner.lock().unwrap().poll_count
    }

    pub fn acks(&self) -> Vec<(RequestId, String)> {
        self.inner.lock().unwrap().acks.clone()
    }
}

#[async_trait]
impl WorkQueue for FakeQueue {
    async fn next_request(&self) -> Result<Option<FillRequest>> {
        let mut inner = self.inner.lock().unwrap();
        inner.poll_count += 1;
        match inner.polls.pop_front().unwrap_or(Poll::Empty) {
            Poll::Work(request) => Ok(Some(request)),
            Poll::Empty => Ok(None),
            Poll::Fail => Err(Error::UnexpectedStatus {
                status: 500,
                url: "/api/next-request/".into(),
            }),
        }
    }

    async fn mark_processed(&self, id: &RequestId, csrf_token: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.acks.push((id.clone(), csrf_token.to_string()));
        if inner.fail_acks {
            return Err(Error::UnexpectedStatus {
                status: 403,
                url: "/api/mark-processed/".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SlowInner {
    pending: Option<FillRequest>,
    first_delay: Option<std::time::Duration>,
    poll_count: usize,
    acks: Vec<RequestId>,
}

/// [`WorkQueue`] that keeps handing out one request until it is acknowledged.
///
/// The first poll answers after `first_delay`, or never when it is `None`.
#[derive(Debug, Clone)]
pub struct SlowQueue {
    inner: Arc<Mutex<SlowInner>>,
}

impl SlowQueue {
    pub fn new(request: FillRequest, first_delay: Option<std::time::Duration>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlowInner {
                pending: Some(request),
                first_delay,
                poll_count: 0,
                acks: Vec::new(),
            })),
        }
    }

    pub fn poll_count(&self) -> usize {
        self.inner.lock().unwrap().poll_count
    }

    pub fn acks(&self) -> Vec<RequestId> {
        self.inner.lock().unwrap().acks.clone()
    }
}

#[async_trait]
impl WorkQueue for SlowQueue {
    async fn next_request(&self) -> Result<Option<FillRequest>> {
        let first = {
            let mut inner = self.inner.lock().unwrap();
            inner.poll_count += 1;
            inner.poll_count == 1
        };
        if first {
            let delay = self.inner.lock().unwrap().first_delay;
            match delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        }
        Ok(self.inner.lock().unwrap().pending.clone())
    }

    async fn mark_processed(&self, id: &RequestId, _csrf_token: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.acks.push(id.clone());
        if inner.pending.as_ref().map(|r| &r.id) == Some(id) {
            inner.pending = None;
        }
        Ok(())
    }
}
