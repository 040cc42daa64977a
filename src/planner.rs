use crate::types::{AssetKind, DownloadTask, DraftScript};
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Destination for one material. Pure function of its inputs: the same
/// (folder, draft id, kind, name) always yields the same path.
pub fn asset_path(draft_folder: &Path, draft_id: &str, kind: AssetKind, name: &str) -> PathBuf {
    draft_folder
        .join(draft_id)
        .join("assets")
        .join(kind.dir_name())
        .join(name)
}

fn usable_url(url: &Option<String>) -> Option<&str> {
    url.as_deref().filter(|u| !u.is_empty())
}

/// Walk the script's material lists and build the download task list.
///
/// Every audio and every photo/video material gets its `path` rewritten
/// to the local destination, whether or not it can be downloaded; a
/// material without a `remote_url` is skipped (not an error) and is
/// simply absent from the task list.
pub fn plan_tasks(
    script: &mut DraftScript,
    draft_folder: &Path,
    draft_id: &str,
) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();

    for audio in &mut script.materials.audios {
        let dest = asset_path(draft_folder, draft_id, AssetKind::Audio, &audio.name);
        audio.path = Some(dest.to_string_lossy().into_owned());
        match usable_url(&audio.remote_url) {
            Some(url) => tasks.push(DownloadTask {
                kind: AssetKind::Audio,
                source: url.to_string(),
                destination: dest,
                file_type: None,
            }),
            None => warn!("Audio material {} has no remote_url, skipping", audio.name),
        }
    }

    for video in &mut script.materials.videos {
        let kind = match video.kind.as_str() {
            "photo" => AssetKind::Image,
            "video" => AssetKind::Video,
            other => {
                warn!(
                    "Material {} has unsupported type {:?}, skipping",
                    video.material_name, other
                );
                continue;
            }
        };
        let dest = asset_path(draft_folder, draft_id, kind, &video.material_name);
        video.path = Some(dest.to_string_lossy().into_owned());
        match usable_url(&video.remote_url) {
            Some(url) => tasks.push(DownloadTask {
                kind,
                source: url.to_string(),
                destination: dest,
                file_type: video.file_type.clone(),
            }),
            None => warn!(
                "{} material {} has no remote_url, skipping",
                kind, video.material_name
            ),
        }
    }

    info!("Planned {} download task(s) for draft {}", tasks.len(), draft_id);
    tasks
}
