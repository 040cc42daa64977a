use crate::config::PipelineConfig;
use crate::downloader::Downloader;
use crate::error::PipelineError;
use crate::fetch::ScriptFetcher;
use crate::metadata;
use crate::planner;
use crate::progress::{self, ProgressSender};
use crate::template;
use crate::types::{ProgressEvent, RunResult};
use log::{error, info};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// Run the whole materialization pipeline for one draft id.
///
/// Fatal errors (script fetch, template copy, script write) short-
/// circuit into a failed `RunResult`; per-asset and metadata failures
/// are annotated on the progress stream and leave the run successful.
pub async fn save_draft(
    config: &PipelineConfig,
    draft_id: &str,
    progress: &ProgressSender,
) -> RunResult {
    match run_phases(config, draft_id, progress).await {
        Ok(()) => {
            progress.report(progress::PERCENT_COMPLETE, "Download complete");
            RunResult::ok("Download complete")
        }
        Err(e) => {
            error!("Saving draft {} failed: {}", draft_id, e);
            progress.error(format!("Processing failed: {}", e));
            RunResult::failed(format!("Processing failed: {}", e), e.to_string())
        }
    }
}

async fn run_phases(
    config: &PipelineConfig,
    draft_id: &str,
    progress: &ProgressSender,
) -> Result<(), PipelineError> {
    progress.report(progress::PERCENT_FETCHING_SCRIPT, "Fetching draft info");
    let fetcher = ScriptFetcher::new(&config.api_host, &config.api_key);
    let mut script = fetcher.fetch(draft_id, config.variant).await?;

    progress.report(progress::PERCENT_PREPARING_FILES, "Preparing draft files");
    let draft_path = config.draft_folder.join(draft_id);
    template::materialize(&config.template_root, config.variant, &draft_path).await?;

    progress.report(progress::PERCENT_COLLECTING_TASKS, "Collecting download tasks");
    let tasks = planner::plan_tasks(&mut script, &config.draft_folder, draft_id);

    progress.report(
        progress::PERCENT_DOWNLOADS_STARTED,
        format!("Starting {} download(s)", tasks.len()),
    );
    let downloader = Downloader::new(config)?;
    let downloaded = downloader.download_all(tasks, progress).await;
    info!(
        "Draft {}: {} file(s) materialized into {}",
        draft_id,
        downloaded.len(),
        draft_path.display()
    );

    progress.report(progress::PERCENT_DOWNLOADS_DONE, "Saving draft info");
    metadata::write_script(&draft_path, &script).await?;

    // Timestamp refresh is best-effort: the assets and directory stay
    // usable even if the metadata file cannot be patched.
    if let Err(e) = metadata::patch_meta_timestamps(&draft_path).await {
        error!("Failed to update {}: {}", metadata::META_FILE, e);
        progress.error(format!("Failed to update draft metadata: {}", e));
    } else {
        progress.report(progress::PERCENT_FINALIZING, "Finalizing");
    }
    Ok(())
}

/// Spawn the pipeline as its own task, isolated from the caller.
///
/// Communication is message passing only: the request goes in here,
/// progress events come out of the receiver, and the terminal
/// `RunResult` is the join handle's output.
pub fn spawn_save_draft(
    config: PipelineConfig,
    draft_id: String,
) -> (JoinHandle<RunResult>, UnboundedReceiver<ProgressEvent>) {
    let (progress, events) = ProgressSender::channel();
    let handle = tokio::spawn(async move { save_draft(&config, &draft_id, &progress).await });
    (handle, events)
}
