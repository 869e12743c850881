use std::sync::{Mutex, PoisonError};

use jobwatch_core::{Phase, ResultRow, ViewModel};
use jobwatch_engine::ViewSink;
use tokio::sync::watch;

const BAR_WIDTH: usize = 20;

/// Prints the monitor's view model to stdout, skipping unchanged frames, and
/// publishes the current phase for the command loop to wait on.
pub struct TerminalRenderer {
    last_frame: Mutex<Vec<String>>,
    phase_tx: watch::Sender<Phase>,
}

impl TerminalRenderer {
    pub fn new() -> (Self, watch::Receiver<Phase>) {
        let (phase_tx, phase_rx) = watch::channel(Phase::Idle);
        let renderer = Self {
            last_frame: Mutex::new(Vec::new()),
            phase_tx,
        };
        (renderer, phase_rx)
    }
}

impl ViewSink for TerminalRenderer {
    fn render(&self, view: &ViewModel) {
        let frame = format_view(view);
        {
            let mut last = self.last_frame.lock().unwrap_or_else(PoisonError::into_inner);
            if *last != frame {
                for line in &frame {
                    println!("{line}");
                }
                if view.terminal && !view.preview.is_empty() {
                    for line in format_preview(&view.preview) {
                        println!("{line}");
                    }
                }
                *last = frame;
            }
        }
        // No receivers left just means nobody is waiting.
        let _ = self.phase_tx.send(view.phase);
    }
}

pub fn format_view(view: &ViewModel) -> Vec<String> {
    let mut lines = vec![format_status_line(view)];
    if let Some(error) = &view.error {
        lines.push(format!("  error: {error}"));
    }
    if let Some(notice) = &view.notice {
        lines.push(format!("  note: {notice}"));
    }
    if let Some(warning) = &view.poll_warning {
        lines.push(format!("  warning: {warning}"));
    }
    if view.download_ready {
        lines.push("  export ready for download".to_string());
    }
    lines
}

pub fn format_status_line(view: &ViewModel) -> String {
    let filled = usize::from(view.percent) * BAR_WIDTH / 100;
    format!(
        "[{:<9}] [{}{}] {:>3}% {}/{} {}",
        view.phase.label(),
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        view.percent,
        view.current_count,
        view.target_count,
        view.status_text
    )
}

pub fn format_preview(rows: &[ResultRow]) -> Vec<String> {
    let mut lines = vec![format!("  latest {} result(s):", rows.len())];
    lines.extend(rows.iter().map(|row| {
        let rating = match (&row.rating, &row.reviews) {
            (Some(rating), Some(reviews)) => format!("{rating} ({reviews})"),
            (Some(rating), None) => rating.clone(),
            _ => "-".to_string(),
        };
        format!(
            "    {} | {} | {} | {}",
            row.name,
            rating,
            row.phone.as_deref().unwrap_or("-"),
            row.address.as_deref().unwrap_or("-")
        )
    }));
    lines
}
