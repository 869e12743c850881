use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::Utc;
use jobwatch_core::{classify, JobParameters, JobState, Phase, Verdict};
use jobwatch_engine::{JobMonitor, JobService, ReqwestJobService};
use jobwatch_logging::{level_for, watch_info, watch_warn};
use tokio::sync::watch;

use super::logging::{self, LogDestination};
use super::render::{format_preview, TerminalRenderer};
use super::settings::AppSettings;
use crate::cli::{Cli, Command};

pub async fn run_app(cli: Cli) -> anyhow::Result<()> {
    let settings = AppSettings::load(&cli.config)?.with_overrides(cli.base_url, cli.interval_ms)?;
    logging::initialize(
        LogDestination::from_settings(settings.log_to_file),
        level_for(cli.verbose),
    );
    watch_info!("Using job service at {}", settings.base_url);

    let service = Arc::new(ReqwestJobService::new(settings.service_settings())?);

    match cli.command {
        Command::Run {
            query,
            location,
            limit,
            out,
        } => run_job(service, &settings, JobParameters::new(query, location, limit), out).await,
        Command::Status => show_status(service.as_ref(), &settings).await,
        Command::Stop => {
            service.stop().await?;
            println!("Stop requested.");
            Ok(())
        }
        Command::Reset => {
            service.reset().await?;
            println!("Job service reset.");
            Ok(())
        }
        Command::Health => {
            let health = service.health().await?;
            println!("{}: {}", health.status, health.message);
            Ok(())
        }
        Command::Download { out } => {
            let dest = out.unwrap_or_else(default_download_path);
            let written = service.download(&dest).await?;
            println!("Saved {} bytes to {}", written, dest.display());
            Ok(())
        }
    }
}

async fn run_job(
    service: Arc<ReqwestJobService>,
    settings: &AppSettings,
    params: JobParameters,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let (renderer, mut phases) = TerminalRenderer::new();
    let monitor = JobMonitor::new(service, settings.monitor_settings(), Arc::new(renderer));

    let ack = monitor.start(params).await?;
    println!("{}", ack.message);

    tokio::select! {
        finished = wait_until_settled(&mut phases) => finished?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("cannot listen for ctrl-c")?;
            watch_warn!("Interrupted, stopping the job");
            monitor.stop().await;
        }
    }

    match monitor.current_state() {
        JobState::Completed(_) if monitor.view().download_ready => {
            let dest = out.unwrap_or_else(default_download_path);
            save_export(&monitor, &dest).await
        }
        JobState::Completed(snapshot) => {
            println!("Finished without an export: {}", snapshot.status_text);
            Ok(())
        }
        JobState::Failed(message) => Err(anyhow!("job failed: {message}")),
        JobState::Idle => {
            println!("Job stopped.");
            Ok(())
        }
        other => Err(anyhow!("job ended in unexpected phase {:?}", other.phase())),
    }
}

/// Resolves once the monitor leaves the busy phases.
async fn wait_until_settled(phases: &mut watch::Receiver<Phase>) -> anyhow::Result<()> {
    phases
        .wait_for(|phase| matches!(phase, Phase::Completed | Phase::Failed | Phase::Idle))
        .await
        .map(|_| ())
        .map_err(|_| anyhow!("monitor went away before the job finished"))
}

async fn save_export(monitor: &JobMonitor, dest: &Path) -> anyhow::Result<()> {
    let written = monitor
        .download_to(dest)
        .await
        .with_context(|| format!("cannot save export to {}", dest.display()))?;
    println!("Saved {} bytes to {}", written, dest.display());
    Ok(())
}

async fn show_status(service: &dyn JobService, settings: &AppSettings) -> anyhow::Result<()> {
    let snapshot = service.progress().await?;
    let marker = settings.monitor_settings().error_marker;
    println!(
        "{} ({}/{})",
        snapshot.status_text, snapshot.current_count, snapshot.target_count
    );
    match classify(&snapshot, &marker) {
        Verdict::StillRunning => println!("Job is running."),
        Verdict::SucceededReadyForDownload => println!("Job finished; export ready for download."),
        Verdict::SucceededNoArtifact => println!("No job is running."),
        Verdict::FailedWithMessage(message) => println!("Job failed: {message}"),
    }
    if settings.preview_rows > 0 && snapshot.current_count > 0 {
        let rows = service.results(settings.preview_rows).await?;
        if !rows.is_empty() {
            for line in format_preview(&rows) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn default_download_path() -> PathBuf {
    PathBuf::from(format!("results_{}.xlsx", Utc::now().format("%Y%m%d_%H%M%S")))
}
