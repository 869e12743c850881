//! Jobwatch core: pure job-monitor state machine and view-model helpers.
mod classify;
mod effect;
mod error;
mod msg;
mod params;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use classify::{classify, ErrorMarker, Verdict, DEFAULT_ERROR_MARKER};
pub use effect::{Effect, TickTicket};
pub use error::StartError;
pub use msg::Msg;
pub use params::{JobParameters, LimitBounds};
pub use snapshot::{ProgressSnapshot, ResultRow};
pub use state::{JobState, MonitorState, Phase};
pub use update::update;
pub use view_model::{percent, ViewModel};
