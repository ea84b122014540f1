use chromiumoxide::browser::{Browser as CrBrowser, BrowserConfig as CrBrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use tracing::{debug, info};

use crate::config::{BrowserBuilder, BrowserConfig};
use crate::error::{Error, Result};
use crate::page::Page;

/// Chrome flags that keep a long-running form tab responsive.
const PERF_ARGS: &[&str] = &[
    "disable-extensions",
    "no-default-browser-check",
    "no-first-run",
    "disable-popup-blocking",
    "disable-prompt-on-repost",
    "disable-background-timer-throttling",
    "disable-renderer-backgrounding",
    "disable-backgrounding-occluded-windows",
];

/// The Chromium instance hosting the form page.
pub struct FormBrowser {
    browser: CrBrowser,
    default_timeout: std::time::Duration,
    _handler_task: tokio::task::JoinHandle<()>,
}

impl FormBrowser {
    /// Create a new BrowserBuilder for configuring and launching a browser.
    pub fn builder() -> BrowserBuilder {
        BrowserBuilder::new()
    }

    /// Launch a browser instance with the given configuration.
    pub async fn launch(config: BrowserConfig) -> Result<Self> {
        let mut builder = CrBrowserConfig::builder();

        if config.headless {
            builder = builder.new_headless_mode().no_sandbox();
        } else {
            builder = builder.with_head().no_sandbox();
        }

        // Page timers must keep firing while the window sits in the background
        for arg in PERF_ARGS {
            builder = builder.arg(*arg);
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        }

        builder = builder.viewport(Viewport {
            width: config.viewport_width,
            height: config.viewport_height,
            device_scale_factor: None,
            emulating_mobile: false,
            is_landscape: false,
            has_touch: false,
        });

        let cr_config = builder
            .build()
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let (browser, mut handler) = CrBrowser::launch(cr_config)
            .await
            .map_err(|e| Error::LaunchError(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
            debug!("browser handler stopped");
        });

        info!(headless = config.headless, "browser launched");
        Ok(Self {
            browser,
            default_timeout: config.default_timeout,
            _handler_task: handler_task,
        })
    }

    /// Open the form page at `url` and wait until `ready_selector` is rendered.
    pub async fn open_form(&self, url: &str, ready_selector: &str) -> Result<Page> {
        let cr_page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| Error::NavigationError(e.to_string()))?;

        let page = Page::new(cr_page, self.default_timeout);
        page.wait_for_selector(ready_selector).await?;
        info!(url, "form page ready");
        Ok(page)
    }
}
