//! Completion/failure detection for a progress snapshot.
//!
//! The service never sends an explicit "done" event, so the verdict is derived
//! from the snapshot flags by an ordered rule table. The first rule that
//! matches wins; `SucceededNoArtifact` is the fallback.

use crate::ProgressSnapshot;

pub const DEFAULT_ERROR_MARKER: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    StillRunning,
    SucceededReadyForDownload,
    SucceededNoArtifact,
    FailedWithMessage(String),
}

impl Verdict {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Verdict::StillRunning)
    }
}

/// Case-sensitive token searched for in the status text of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMarker(String);

impl ErrorMarker {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty marker matches nothing.
    pub fn matches(&self, status_text: &str) -> bool {
        !self.0.is_empty() && status_text.contains(self.0.as_str())
    }
}

impl Default for ErrorMarker {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_MARKER)
    }
}

type Rule = fn(&ProgressSnapshot, &ErrorMarker) -> Option<Verdict>;

const RULES: [Rule; 3] = [still_active, ready_for_download, reported_error];

pub fn classify(snapshot: &ProgressSnapshot, marker: &ErrorMarker) -> Verdict {
    RULES
        .iter()
        .find_map(|rule| rule(snapshot, marker))
        .unwrap_or(Verdict::SucceededNoArtifact)
}

fn still_active(snapshot: &ProgressSnapshot, _: &ErrorMarker) -> Option<Verdict> {
    snapshot.is_active.then_some(Verdict::StillRunning)
}

fn ready_for_download(snapshot: &ProgressSnapshot, _: &ErrorMarker) -> Option<Verdict> {
    (snapshot.download_ready && snapshot.target_count > 0)
        .then_some(Verdict::SucceededReadyForDownload)
}

fn reported_error(snapshot: &ProgressSnapshot, marker: &ErrorMarker) -> Option<Verdict> {
    if snapshot.download_ready {
        return None;
    }
    // The dedicated field wins over text matching.
    if let Some(error) = snapshot.error.as_deref().filter(|e| !e.trim().is_empty()) {
        return Some(Verdict::FailedWithMessage(error.to_string()));
    }
    marker
        .matches(&snapshot.status_text)
        .then(|| Verdict::FailedWithMessage(snapshot.status_text.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(status: &str, count: u64, target: u64, active: bool, ready: bool) -> ProgressSnapshot {
        ProgressSnapshot {
            status_text: status.to_string(),
            current_count: count,
            target_count: target,
            is_active: active,
            download_ready: ready,
            error: None,
        }
    }

    #[test]
    fn decision_table() {
        let marker = ErrorMarker::default();
        let cases = [
            (snapshot("Scrolling...", 3, 50, true, false), Verdict::StillRunning),
            // Stale download flag on an active job is ignored.
            (snapshot("Error: blip", 3, 50, true, true), Verdict::StillRunning),
            (
                snapshot("Complete!", 50, 50, false, true),
                Verdict::SucceededReadyForDownload,
            ),
            (
                snapshot("Error: rate limited", 10, 100, false, false),
                Verdict::FailedWithMessage("Error: rate limited".to_string()),
            ),
            (
                snapshot("Stopping...", 10, 100, false, false),
                Verdict::SucceededNoArtifact,
            ),
            // Ready flag without an established target is not a download.
            (snapshot("Complete!", 0, 0, false, true), Verdict::SucceededNoArtifact),
            // Ready artifact wins over an error-looking status.
            (
                snapshot("Error while cleaning up", 50, 50, false, true),
                Verdict::SucceededReadyForDownload,
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(classify(&input, &marker), expected, "input: {input:?}");
        }
    }

    #[test]
    fn marker_is_case_sensitive() {
        let marker = ErrorMarker::default();
        let input = snapshot("error: lowercase", 1, 10, false, false);
        assert_eq!(classify(&input, &marker), Verdict::SucceededNoArtifact);
    }

    #[test]
    fn configured_marker_is_used() {
        let marker = ErrorMarker::new("FAILED");
        let input = snapshot("Driver FAILED to start", 0, 10, false, false);
        assert_eq!(
            classify(&input, &marker),
            Verdict::FailedWithMessage("Driver FAILED to start".to_string())
        );
    }

    #[test]
    fn empty_marker_never_matches() {
        let marker = ErrorMarker::new("");
        let input = snapshot("anything", 1, 10, false, false);
        assert_eq!(classify(&input, &marker), Verdict::SucceededNoArtifact);
    }

    #[test]
    fn dedicated_error_field_takes_precedence() {
        let mut input = snapshot("Stopped", 4, 10, false, false);
        input.error = Some("browser crashed".to_string());
        assert_eq!(
            classify(&input, &ErrorMarker::default()),
            Verdict::FailedWithMessage("browser crashed".to_string())
        );
    }
}
