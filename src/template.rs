use crate::error::PipelineError;
use crate::types::EditorVariant;
use log::{info, warn};
use std::path::{Path, PathBuf};

/// Clone the variant's skeleton into `draft_path`.
///
/// Destructive by design: a pre-existing project directory for the same
/// draft id is removed wholesale first, so reruns replace rather than
/// merge. Any failure here is fatal — the rest of the pipeline assumes
/// the skeleton files (including the metadata file) exist.
pub async fn materialize(
    template_root: &Path,
    variant: EditorVariant,
    draft_path: &Path,
) -> Result<(), PipelineError> {
    let template_path = template_root.join(variant.template_dir());
    if !template_path.is_dir() {
        return Err(PipelineError::Materialize(format!(
            "template skeleton not found at {}",
            template_path.display()
        )));
    }

    if draft_path.exists() {
        warn!("Removing existing draft directory {}", draft_path.display());
        tokio::fs::remove_dir_all(draft_path)
            .await
            .map_err(|e| PipelineError::Materialize(e.to_string()))?;
    }

    info!(
        "Copying template {} to {}",
        template_path.display(),
        draft_path.display()
    );
    copy_dir_recursive(&template_path, draft_path)
        .await
        .map_err(|e| PipelineError::Materialize(e.to_string()))?;
    Ok(())
}

/// Copy every file and subdirectory of `source` into `destination`,
/// creating intermediate directories as needed. Iterative walk to keep
/// the async function non-recursive.
async fn copy_dir_recursive(source: &Path, destination: &Path) -> std::io::Result<()> {
    let mut pending: Vec<(PathBuf, PathBuf)> =
        vec![(source.to_path_buf(), destination.to_path_buf())];

    while let Some((src_dir, dst_dir)) = pending.pop() {
        tokio::fs::create_dir_all(&dst_dir).await?;
        let mut entries = tokio::fs::read_dir(&src_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((src, dst));
            } else {
                tokio::fs::copy(&src, &dst).await?;
            }
        }
    }
    Ok(())
}
