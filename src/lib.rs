pub mod accessor;
pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod filler;
pub mod page;
pub mod queue;
pub mod request;
pub mod state;
pub mod typing;
pub mod viewport;

pub use accessor::{Control, ControlKind, FormAccessor, FormEvent, Geometry, Locator, SelectOption};
pub use browser::FormBrowser;
pub use config::{AckPolicy, BrowserBuilder, BrowserConfig, FillerBuilder, FillerConfig, Timing};
pub use engine::{FieldOutcome, FillReport, FormFillEngine};
pub use error::{Error, Result};
pub use filler::{AutoFiller, CycleReport, PollOutcome};
pub use page::Page;
pub use queue::{HttpWorkQueue, WorkQueue};
pub use request::{FillRequest, RequestId};
pub use state::{CycleGuard, FillPhase, PollGuard, ProcessingState};
pub use typing::TypingPlan;
