use crate::config::{PipelineConfig, MIN_IMAGE_BYTES};
use crate::error::PipelineError;
use crate::progress::ProgressSender;
use crate::types::DownloadTask;
use futures::StreamExt;
use log::{debug, error, info, warn};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Identity used for the one-shot image-integrity refetch.
const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Safari/605.1.15";

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Directory some archives carry that must not survive unpacking.
const ARCHIVE_JUNK_DIR: &str = "__MACOSX";

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

pub struct Downloader {
    client: reqwest::Client,
    fallback_client: reqwest::Client,
    concurrency: usize,
    max_retries: u32,
}

impl Downloader {
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .timeout(config.timeout)
            .build()?;
        let fallback_client = reqwest::Client::builder()
            .user_agent(FALLBACK_USER_AGENT)
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            fallback_client,
            concurrency: config.concurrency.max(1),
            max_retries: config.max_retries.max(1),
        })
    }

    /// Resolve every task's source to bytes at its destination.
    ///
    /// Tasks run on a bounded worker pool `concurrency` wide. A failed
    /// task is logged and annotated on the progress stream with the
    /// `-1` sentinel; it never aborts its siblings or the run. Returns
    /// the destinations that succeeded.
    pub async fn download_all(
        &self,
        tasks: Vec<DownloadTask>,
        progress: &ProgressSender,
    ) -> Vec<PathBuf> {
        let total = tasks.len();
        let completed = AtomicUsize::new(0);

        let results: Vec<Option<PathBuf>> = futures::stream::iter(tasks)
            .map(|task| {
                let completed = &completed;
                async move {
                    match self.run_task(&task).await {
                        Ok(()) => {
                            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                            progress.report(
                                ProgressSender::download_percent(done, total),
                                format!("Downloaded {}/{} file(s)", done, total),
                            );
                            info!(
                                "Downloaded {} file {} ({}/{})",
                                task.kind,
                                task.destination.display(),
                                done,
                                total
                            );
                            Some(task.destination)
                        }
                        Err(e) => {
                            error!("Failed to download {} from {}: {}", task.kind, task.source, e);
                            progress.error(format!(
                                "Failed to download {}: {}, continuing with other files",
                                task.destination.display(),
                                e
                            ));
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let downloaded: Vec<PathBuf> = results.into_iter().flatten().collect();
        info!("Finished downloads: {}/{} file(s) succeeded", downloaded.len(), total);
        downloaded
    }

    async fn run_task(&self, task: &DownloadTask) -> Result<(), PipelineError> {
        // Local fast path: an existing file is copied as-is, with no
        // retries and no post-processing.
        let source_path = Path::new(&task.source);
        if source_path.is_file() {
            info!(
                "Copying local file {} to {}",
                task.source,
                task.destination.display()
            );
            create_parent_dirs(&task.destination).await?;
            tokio::fs::copy(source_path, &task.destination).await?;
            return Ok(());
        }

        self.fetch_with_retries(task).await?;

        if is_image_destination(&task.destination) {
            self.verify_image(task).await?;
        }

        if task.is_bundle() {
            unpack_bundle(&task.destination).await?;
        }
        Ok(())
    }

    async fn fetch_with_retries(&self, task: &DownloadTask) -> Result<(), PipelineError> {
        let mut last_err = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let wait = Duration::from_secs(1u64 << attempt);
                info!(
                    "Retrying {} in {:?} (attempt {}/{})",
                    task.source,
                    wait,
                    attempt + 1,
                    self.max_retries
                );
                sleep(wait).await;
            }
            match self
                .fetch_to_file(&self.client, &task.source, &task.destination)
                .await
            {
                Ok(bytes) => {
                    debug!("Fetched {} byte(s) from {}", bytes, task.source);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Attempt {} for {} failed: {}", attempt + 1, task.source, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            PipelineError::Download(format!("no attempts made for {}", task.source))
        }))
    }

    /// Stream one GET response to `destination`, returning the byte
    /// count written.
    async fn fetch_to_file(
        &self,
        client: &reqwest::Client,
        url: &str,
        destination: &Path,
    ) -> Result<u64, PipelineError> {
        let start = Instant::now();
        create_parent_dirs(destination).await?;

        let resp = client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(PipelineError::Download(format!(
                "HTTP error: {} for URL: {}",
                resp.status(),
                url
            )));
        }

        let total_size = resp.content_length().unwrap_or(0);
        let mut file = File::create(destination).await?;
        let mut stream = resp.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PipelineError::Download(e.to_string()))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            if total_size > 0 {
                debug!(
                    "{}: {}/{} byte(s) ({:.1}%)",
                    destination.display(),
                    downloaded,
                    total_size,
                    downloaded as f64 / total_size as f64 * 100.0
                );
            }
        }
        file.flush().await?;

        debug!(
            "Download of {} completed in {:.2?}",
            destination.display(),
            start.elapsed()
        );
        Ok(downloaded)
    }

    /// A plausible image is at least `MIN_IMAGE_BYTES` long. Anything
    /// shorter gets exactly one refetch under the fallback identity;
    /// if it is still undersized the task fails without returning to
    /// the primary path.
    async fn verify_image(&self, task: &DownloadTask) -> Result<(), PipelineError> {
        let size = tokio::fs::metadata(&task.destination).await?.len();
        if size >= MIN_IMAGE_BYTES {
            return Ok(());
        }

        warn!(
            "Image {} is only {} byte(s), refetching with fallback identity",
            task.destination.display(),
            size
        );
        self.fetch_to_file(&self.fallback_client, &task.source, &task.destination)
            .await?;

        let size = tokio::fs::metadata(&task.destination).await?.len();
        if size < MIN_IMAGE_BYTES {
            return Err(PipelineError::Download(format!(
                "image {} is {} byte(s) after fallback fetch, below the {}-byte minimum",
                task.destination.display(),
                size,
                MIN_IMAGE_BYTES
            )));
        }
        Ok(())
    }
}

fn is_image_destination(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

async fn create_parent_dirs(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Unpack a downloaded bundle next to itself, then remove the archive
/// and any platform junk directory it produced. Safe to run over an
/// already-unpacked directory.
async fn unpack_bundle(archive_path: &Path) -> Result<(), PipelineError> {
    let archive = archive_path.to_path_buf();
    let target = archive
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    info!("Unpacking bundle {} into {}", archive.display(), target.display());
    let junk = target.join(ARCHIVE_JUNK_DIR);
    tokio::task::spawn_blocking(move || -> Result<(), PipelineError> {
        let file = std::fs::File::open(&archive)?;
        let mut zip = zip::ZipArchive::new(file)
            .map_err(|e| PipelineError::Download(format!("invalid bundle archive: {}", e)))?;
        zip.extract(&target)
            .map_err(|e| PipelineError::Download(format!("failed to unpack bundle: {}", e)))?;
        if junk.is_dir() {
            std::fs::remove_dir_all(&junk)?;
        }
        std::fs::remove_file(&archive)?;
        Ok(())
    })
    .await
    .map_err(|e| PipelineError::Download(format!("unpack task panicked: {}", e)))?
}
