use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::page::Page as CrPage;
use serde::de::DeserializeOwned;

use crate::accessor::{
    Control, ControlKind, FormAccessor, FormEvent, Geometry, Locator, SelectOption,
};
use crate::error::{Error, Result};

/// Inline style applied to a control while it is being filled.
const HIGHLIGHT_ON: &str = "el.style.transition = 'all 0.3s ease'; \
    el.style.backgroundColor = '#ffffcc'; \
    el.style.borderColor = '#ff9900'; \
    el.style.boxShadow = '0 0 10px rgba(255, 153, 0, 0.5)';";

const HIGHLIGHT_OFF: &str = "el.style.backgroundColor = ''; \
    el.style.borderColor = ''; \
    el.style.boxShadow = '';";

/// Quote a Rust string as a JavaScript string literal.
fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::JsError(e.to_string()))
}

/// JavaScript expression evaluating to the element `locator` points at, or null.
fn resolve_js(locator: &Locator) -> Result<String> {
    Ok(match locator {
        Locator::Field(name) => {
            let name = js_string(name)?;
            format!(
                "(document.getElementById({name}) || \
                 document.querySelector('[name=\"' + CSS.escape({name}) + '\"]'))"
            )
        }
        Locator::Name(name) => {
            let name = js_string(name)?;
            format!("document.querySelector('[name=\"' + CSS.escape({name}) + '\"]')")
        }
        Locator::Selector(selector) => {
            format!("document.querySelector({})", js_string(selector)?)
        }
        Locator::ParentOf(inner) => {
            format!("((e) => e ? e.parentElement : null)({})", resolve_js(inner)?)
        }
    })
}

/// Wrap `body` so it runs with `el` bound to the control, failing if it vanished.
fn with_element_js(locator: &Locator, body: &str) -> Result<String> {
    let resolve = resolve_js(locator)?;
    Ok(format!(
        r#"
        (() => {{
            const el = {resolve};
            if (!el) throw new Error('Element not found');
            {body}
        }})()
        "#,
    ))
}

#[derive(serde::Deserialize)]
struct ElementTag {
    tag: String,
    r#type: String,
}

/// A live form page in Chromium.
pub struct Page {
    inner: CrPage,
    default_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, default_timeout: Duration) -> Self {
        Self { inner, default_timeout }
    }

    /// Wait until an element matching `selector` exists.
    /// Polls every 100ms up to the configured default timeout.
    pub async fn wait_for_selector(&self, selector: &str) -> Result<()> {
        let interval = Duration::from_millis(100);
        let start = std::time::Instant::now();

        loop {
            match self.inner.find_element(selector).await {
                Ok(_) => return Ok(()),
                Err(_) if start.elapsed() < self.default_timeout => {
                    tokio::time::sleep(interval).await;
                }
                Err(_) => {
                    return Err(Error::ElementNotFound(format!(
                        "Timed out waiting for selector: {selector}"
                    )));
                }
            }
        }
    }

    /// Evaluate a JavaScript expression without caring about the return value.
    async fn eval_void(&self, js: String) -> Result<()> {
        self.inner.evaluate(js).await?;
        Ok(())
    }

    /// Evaluate an expression that returns `JSON.stringify(...)` and decode it.
    async fn eval_json<T: DeserializeOwned>(&self, js: String) -> Result<T> {
        let result = self.inner.evaluate(js).await?;
        let json_str: String = result
            .into_value()
            .map_err(|e| Error::JsError(e.to_string()))?;
        serde_json::from_str(&json_str).map_err(|e| Error::JsError(e.to_string()))
    }
}

#[async_trait]
impl FormAccessor for Page {
    async fn locate(&self, locator: &Locator) -> Result<Option<Control>> {
        let js = format!(
            r#"
            (() => {{
                const el = {};
                return JSON.stringify(el
                    ? {{ tag: el.tagName.toLowerCase(), type: (el.type || '').toLowerCase() }}
                    : null);
            }})()
            "#,
            resolve_js(locator)?
        );
        let tag: Option<ElementTag> = self.eval_json(js).await?;
        Ok(tag.map(|tag| Control {
            locator: locator.clone(),
            kind: ControlKind::classify(&tag.tag, &tag.r#type),
        }))
    }

    async fn geometry(&self, control: &Control) -> Result<Geometry> {
        let js = with_element_js(
            &control.locator,
            r#"
            const r = el.getBoundingClientRect();
            return JSON.stringify({
                top: r.top,
                bottom: r.bottom,
                offset_top: el.offsetTop,
                offset_height: el.offsetHeight,
                viewport_height: window.innerHeight || document.documentElement.clientHeight,
            });
            "#,
        )?;
        self.eval_json(js).await
    }

    async fn scroll_to(&self, top: f64) -> Result<()> {
        self.eval_void(format!(
            "window.scrollTo({{ top: {}, behavior: 'smooth' }})",
            top.max(0.0)
        ))
        .await
    }

    async fn set_highlight(&self, control: &Control, on: bool) -> Result<()> {
        let body = if on { HIGHLIGHT_ON } else { HIGHLIGHT_OFF };
        self.eval_void(with_element_js(&control.locator, body)?).await
    }

    async fn options(&self, control: &Control) -> Result<Vec<SelectOption>> {
        let js = with_element_js(
            &control.locator,
            "return JSON.stringify(Array.from(el.options || []).map(o => ({ value: o.value, text: o.text })));",
        )?;
        self.eval_json(js).await
    }

    async fn value(&self, control: &Control) -> Result<String> {
        let js = with_element_js(&control.locator, "return JSON.stringify(el.value || '');")?;
        self.eval_json(js).await
    }

    async fn set_value(&self, control: &Control, value: &str) -> Result<()> {
        let body = format!("el.value = {};", js_string(value)?);
        self.eval_void(with_element_js(&control.locator, &body)?).await
    }

    async fn append_value(&self, control: &Control, text: &str) -> Result<()> {
        let body = format!("el.value += {};", js_string(text)?);
        self.eval_void(with_element_js(&control.locator, &body)?).await
    }

    async fn dispatch(&self, control: &Control, event: FormEvent) -> Result<()> {
        let body = format!(
            "el.dispatchEvent(new Event('{}', {{ bubbles: true }}));",
            event.as_str()
        );
        self.eval_void(with_element_js(&control.locator, &body)?).await
    }

    async fn focus(&self, control: &Control) -> Result<()> {
        self.eval_void(with_element_js(&control.locator, "el.focus();")?)
            .await
    }

    async fn activate(&self, control: &Control) -> Result<()> {
        self.eval_void(with_element_js(&control.locator, "el.click();")?)
            .await
    }

    async fn hidden_value(&self, field_name: &str) -> Result<Option<String>> {
        let js = format!(
            r#"
            (() => {{
                const el = {};
                return JSON.stringify(el ? el.value : null);
            }})()
            "#,
            resolve_js(&Locator::name(field_name))?
        );
        self.eval_json(js).await
    }
}
