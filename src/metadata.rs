use crate::error::PipelineError;
use crate::types::DraftScript;
use chrono::Utc;
use log::info;
use serde_json::{json, Value};
use std::path::Path;

pub const SCRIPT_FILE: &str = "draft_info.json";
pub const META_FILE: &str = "draft_meta_info.json";

/// Persist the path-rewritten script into the project root.
pub async fn write_script(draft_path: &Path, script: &DraftScript) -> Result<(), PipelineError> {
    let path = draft_path.join(SCRIPT_FILE);
    let body = serde_json::to_string_pretty(script)?;
    tokio::fs::write(&path, body).await?;
    info!("Draft script saved to {}", path.display());
    Ok(())
}

/// Refresh the timestamps in the skeleton's metadata file.
///
/// `tm_draft_create` is a millisecond timestamp; `tm_draft_modified`
/// keeps microsecond resolution so repeated runs never collide on the
/// same value.
pub async fn patch_meta_timestamps(draft_path: &Path) -> Result<(), PipelineError> {
    let path = draft_path.join(META_FILE);
    let mut meta: Value = match tokio::fs::read_to_string(&path).await {
        Ok(body) => serde_json::from_str(&body)
            .map_err(|e| PipelineError::Metadata(format!("malformed {}: {}", META_FILE, e)))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => json!({}),
        Err(e) => return Err(PipelineError::Metadata(e.to_string())),
    };

    let now = Utc::now();
    let obj = meta
        .as_object_mut()
        .ok_or_else(|| PipelineError::Metadata(format!("{} is not a JSON object", META_FILE)))?;
    obj.insert("tm_draft_create".to_string(), json!(now.timestamp_millis()));
    obj.insert("tm_draft_modified".to_string(), json!(now.timestamp_micros()));

    let body = serde_json::to_string_pretty(&meta)
        .map_err(|e| PipelineError::Metadata(e.to_string()))?;
    tokio::fs::write(&path, body)
        .await
        .map_err(|e| PipelineError::Metadata(e.to_string()))?;
    info!("Refreshed timestamps in {}", path.display());
    Ok(())
}
