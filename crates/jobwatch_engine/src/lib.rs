//! Jobwatch engine: remote job service client, poll scheduling and the job monitor.
mod download;
mod monitor;
mod scheduler;
mod service;
mod types;

pub use download::{ensure_output_dir, AtomicDownload, PersistError};
pub use monitor::{Ack, DownloadError, JobMonitor, MonitorSettings, NullSink, ViewSink};
pub use scheduler::PollScheduler;
pub use service::{JobService, ReqwestJobService, ServiceSettings};
pub use types::{FailureKind, HealthStatus, ServiceError};
