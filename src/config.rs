use std::time::Duration;

use crate::browser::FormBrowser;
use crate::error::Result;

/// How often the server is asked for work.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Pause after a smooth scroll so it visually completes.
pub const SCROLL_SETTLE: Duration = Duration::from_millis(300);
/// How long a filled field stays highlighted.
pub const HIGHLIGHT_HOLD: Duration = Duration::from_secs(1);
/// Pause between two fields.
pub const FIELD_DELAY: Duration = Duration::from_millis(200);
/// How long the declaration checkbox stays highlighted after the click.
pub const CHECKBOX_HOLD: Duration = Duration::from_millis(500);
/// Pause between the last field and the submit step.
pub const FINAL_SETTLE: Duration = Duration::from_millis(500);
/// How long the submit control keeps focus before it is clicked.
pub const SUBMIT_FOCUS_HOLD: Duration = Duration::from_millis(500);

/// Height of the fixed page header that hides the top of the viewport.
pub const HEADER_MARGIN_PX: f64 = 100.0;

pub const NEXT_REQUEST_PATH: &str = "/api/next-request/";
pub const MARK_PROCESSED_PATH: &str = "/api/mark-processed/";
pub const SUBMIT_SELECTOR: &str = ".submit-btn";
pub const DECLARATION_FIELD: &str = "declaration";
pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Canonical fill order of the grievance form.
pub const FIELD_ORDER: &[&str] = &[
    "grievanceType",
    "grievanceClassification",
    "state",
    "purchaseCity",
    "sectorIndustry",
    "category",
    "company",
    "natureOfGrievance",
    "productValue",
    "dealerInfo",
    "grievanceDetails",
    "expectation",
    "registeredWithCompany",
];

/// Whether a cycle that failed partway is still acknowledged to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AckPolicy {
    /// Acknowledge only cycles that reached the submit step without error.
    /// A failed request stays queued and will be delivered again.
    #[default]
    CompletedOnly,
    /// Acknowledge every cycle, failed or not.
    Always,
}

/// Every pause the fill cycle makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub scroll_settle: Duration,
    pub highlight_hold: Duration,
    pub field_delay: Duration,
    pub checkbox_hold: Duration,
    pub final_settle: Duration,
    pub submit_focus_hold: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            scroll_settle: SCROLL_SETTLE,
            highlight_hold: HIGHLIGHT_HOLD,
            field_delay: FIELD_DELAY,
            checkbox_hold: CHECKBOX_HOLD,
            final_settle: FINAL_SETTLE,
            submit_focus_hold: SUBMIT_FOCUS_HOLD,
        }
    }
}

impl Timing {
    /// No pauses at all, apart from the typing delays.
    pub fn immediate() -> Self {
        Self {
            scroll_settle: Duration::ZERO,
            highlight_hold: Duration::ZERO,
            field_delay: Duration::ZERO,
            checkbox_hold: Duration::ZERO,
            final_settle: Duration::ZERO,
            submit_focus_hold: Duration::ZERO,
        }
    }
}

/// Settings of the poll/fill/acknowledge loop.
#[derive(Debug, Clone)]
pub struct FillerConfig {
    pub poll_interval: Duration,
    pub timing: Timing,
    pub field_order: Vec<String>,
    pub declaration_field: String,
    pub submit_selector: String,
    pub csrf_field: String,
    pub header_margin: f64,
    pub ack_policy: AckPolicy,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            timing: Timing::default(),
            field_order: FIELD_ORDER.iter().map(|f| f.to_string()).collect(),
            declaration_field: DECLARATION_FIELD.to_string(),
            submit_selector: SUBMIT_SELECTOR.to_string(),
            csrf_field: CSRF_FIELD.to_string(),
            header_margin: HEADER_MARGIN_PX,
            ack_policy: AckPolicy::default(),
        }
    }
}

pub struct FillerBuilder {
    config: FillerConfig,
}

impl FillerBuilder {
    pub fn new() -> Self {
        Self {
            config: FillerConfig::default(),
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.config.timing = timing;
        self
    }

    /// Replace the canonical field order.
    pub fn field_order<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.field_order = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn submit_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.submit_selector = selector.into();
        self
    }

    pub fn ack_policy(mut self, policy: AckPolicy) -> Self {
        self.config.ack_policy = policy;
        self
    }

    pub fn build(self) -> FillerConfig {
        self.config
    }
}

impl Default for FillerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BrowserConfig {
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub chrome_path: Option<String>,
    /// Timeout for waiting on the form page to render (default: 30s).
    pub default_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            viewport_width: 1280,
            viewport_height: 900,
            chrome_path: None,
            default_timeout: Duration::from_secs(30),
        }
    }
}

pub struct BrowserBuilder {
    config: BrowserConfig,
}

impl BrowserBuilder {
    pub fn new() -> Self {
        Self {
            config: BrowserConfig::default(),
        }
    }

    pub fn headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn viewport(mut self, width: u32, height: u32) -> Self {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
        self
    }

    pub fn chrome_path(mut self, path: impl Into<String>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.default_timeout = timeout;
        self
    }

    pub fn build_config(self) -> BrowserConfig {
        self.config
    }

    pub async fn build(self) -> Result<FormBrowser> {
        FormBrowser::launch(self.build_config()).await
    }
}

impl Default for BrowserBuilder {
    fn default() -> Self {
        Self::new()
    }
}
