use crate::types::EditorVariant;
use std::path::PathBuf;
use std::time::Duration;

/// Maximum attempts for one download before it is reported as failed.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Response timeout for a single asset fetch.
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

/// Maximum number of downloads in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Files with an image extension smaller than this are treated as a
/// failed download and retried once with an alternate client identity.
pub const MIN_IMAGE_BYTES: u64 = 2048;

/// Default host of the script-query service.
pub const DEFAULT_API_HOST: &str = "https://open.capcutapi.top";

/// Everything one pipeline run needs, threaded explicitly through every
/// component. There is no ambient/global state.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the script-query service.
    pub api_host: String,
    /// Bearer credential for the script-query call.
    pub api_key: String,
    /// Folder that will contain the per-draft project directory.
    pub draft_folder: PathBuf,
    /// Directory holding the template skeletons.
    pub template_root: PathBuf,
    pub variant: EditorVariant,
    pub concurrency: usize,
    pub max_retries: u32,
    pub timeout: Duration,
}

impl PipelineConfig {
    pub fn new(
        api_host: impl Into<String>,
        api_key: impl Into<String>,
        draft_folder: impl Into<PathBuf>,
        template_root: impl Into<PathBuf>,
        variant: EditorVariant,
    ) -> Self {
        Self {
            api_host: api_host.into(),
            api_key: api_key.into(),
            draft_folder: draft_folder.into(),
            template_root: template_root.into(),
            variant,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}
