use crate::{JobState, Phase, ProgressSnapshot, ResultRow};

/// Everything the presentation layer needs to draw the monitor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewModel {
    pub phase: Phase,
    pub status_text: String,
    pub current_count: u64,
    pub target_count: u64,
    /// 0..=100
    pub percent: u8,
    pub terminal: bool,
    pub download_ready: bool,
    /// Set only in `Failed`.
    pub error: Option<String>,
    /// Non-terminal message, e.g. rejected input or an operator stop.
    pub notice: Option<String>,
    pub poll_warning: Option<String>,
    pub preview: Vec<ResultRow>,
}

impl ViewModel {
    pub(crate) fn from_parts(
        job: &JobState,
        last_snapshot: Option<&ProgressSnapshot>,
        preview: &[ResultRow],
        notice: Option<&str>,
        poll_warning: Option<&str>,
    ) -> Self {
        let shown = match job {
            JobState::Running(snapshot) | JobState::Completed(snapshot) => Some(snapshot),
            _ => last_snapshot,
        };
        let (current_count, target_count) = shown
            .map(|s| (s.current_count, s.target_count))
            .unwrap_or((0, 0));
        let status_text = match job {
            JobState::Idle => "Idle".to_string(),
            JobState::Starting => "Starting...".to_string(),
            JobState::Running(snapshot) | JobState::Completed(snapshot) => {
                snapshot.status_text.clone()
            }
            JobState::Failed(reason) => reason.clone(),
        };

        Self {
            phase: job.phase(),
            status_text,
            current_count,
            target_count,
            percent: percent(current_count, target_count),
            terminal: job.is_terminal(),
            download_ready: matches!(job, JobState::Completed(s) if s.download_ready),
            error: match job {
                JobState::Failed(reason) => Some(reason.clone()),
                _ => None,
            },
            notice: notice.map(ToOwned::to_owned),
            poll_warning: poll_warning.map(ToOwned::to_owned),
            preview: preview.to_vec(),
        }
    }
}

/// Progress percentage, clamped to 100. An unknown target (0) reads as 0%.
pub fn percent(current: u64, target: u64) -> u8 {
    if target == 0 {
        return 0;
    }
    let pct = (u128::from(current) * 100 / u128::from(target)).min(100);
    pct as u8
}

#[cfg(test)]
mod tests {
    use super::percent;

    #[test]
    fn zero_target_is_zero_percent() {
        assert_eq!(percent(5, 0), 0);
    }

    #[test]
    fn overshoot_is_clamped() {
        assert_eq!(percent(150, 100), 100);
        assert_eq!(percent(u64::MAX, 1), 100);
    }

    #[test]
    fn partial_progress_floors() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(50, 50), 100);
    }
}
