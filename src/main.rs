use std::sync::Arc;

use autofill_agent::{AutoFiller, Error, FillerConfig, FormBrowser, HttpWorkQueue};
use reqwest::Url;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_FORM_URL: &str = "http://127.0.0.1:8000/user/register-complaint.php";
const FORM_READY_SELECTOR: &str = "form";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "auto-filler stopped");
        std::process::exit(1);
    }
}

async fn run() -> autofill_agent::Result<()> {
    let form_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_FORM_URL.to_string());
    let parsed = Url::parse(&form_url).map_err(|e| Error::UrlError(e.to_string()))?;
    // The API lives next to the form, on the same origin.
    let origin = parsed.origin().ascii_serialization();

    let browser = FormBrowser::builder().build().await?;
    let page = browser.open_form(&form_url, FORM_READY_SELECTOR).await?;
    let queue = HttpWorkQueue::new(&origin)?;

    info!(form = %form_url, api = %origin, "initializing form auto-filler");
    let filler = Arc::new(AutoFiller::new(page, queue, FillerConfig::default()));
    let poller = tokio::spawn(Arc::clone(&filler).run());

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    poller.abort();
    Ok(())
}
