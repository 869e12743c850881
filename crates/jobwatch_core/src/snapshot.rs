/// Normalized result of one progress poll.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub status_text: String,
    pub current_count: u64,
    /// Requested ceiling; 0 while the service has not established one.
    pub target_count: u64,
    pub is_active: bool,
    pub download_ready: bool,
    /// Dedicated error field, when the service provides one.
    pub error: Option<String>,
}

impl ProgressSnapshot {
    /// Snapshot shown between a start acknowledgement and the first poll.
    pub fn placeholder(status_text: impl Into<String>) -> Self {
        Self {
            status_text: status_text.into(),
            is_active: true,
            ..Self::default()
        }
    }
}

/// One row of the results preview. Display-only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultRow {
    pub name: String,
    pub rating: Option<String>,
    pub reviews: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
}
