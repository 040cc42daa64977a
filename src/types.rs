use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Which editor the materialized project targets. Selects the template
/// skeleton and the `is_capcut` flag sent to the script-query endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EditorVariant {
    Capcut,
    Jianying,
}

impl EditorVariant {
    pub fn template_dir(&self) -> &'static str {
        match self {
            EditorVariant::Capcut => "template",
            EditorVariant::Jianying => "template_jianying",
        }
    }

    pub fn is_capcut(&self) -> bool {
        matches!(self, EditorVariant::Capcut)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Audio,
    Image,
    Video,
}

impl AssetKind {
    /// Subdirectory under `assets/` that holds this kind of material.
    pub fn dir_name(&self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Image => "image",
            AssetKind::Video => "video",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// The draft script as returned by the script-query endpoint. Only the
/// material lists are modeled; every other field is carried through
/// untouched so the script written back to disk stays faithful to the
/// server document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftScript {
    pub materials: Materials,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Materials {
    #[serde(default)]
    pub audios: Vec<AudioMaterial>,
    #[serde(default)]
    pub videos: Vec<VideoMaterial>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioMaterial {
    pub name: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    /// Rewritten to the resolved local destination before the script
    /// is persisted.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Entry in `materials.videos`; the `type` field tags it as a still
/// image (`photo`) or a video clip (`video`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMaterial {
    pub material_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Declared file type; `"zip"` marks a compressed bundle that gets
    /// unpacked after download.
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One unit of download work: a material's source resolved to a local
/// destination path.
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub kind: AssetKind,
    /// Remote URL, or a local file path taken by the copy fast path.
    pub source: String,
    pub destination: PathBuf,
    pub file_type: Option<String>,
}

impl DownloadTask {
    pub fn is_bundle(&self) -> bool {
        self.file_type.as_deref() == Some("zip")
    }
}

/// Progress annotation emitted over the event channel. A `percent` of
/// `-1` means a non-fatal error occurred and processing continues; all
/// other values are non-decreasing within one run.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub percent: i32,
    pub message: String,
}

/// Terminal outcome of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub message: String,
    pub error: Option<String>,
}

impl RunResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(error.into()),
        }
    }
}
