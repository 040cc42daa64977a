use crate::error::PipelineError;
use crate::types::{DraftScript, EditorVariant};
use log::info;
use serde::Deserialize;
use serde_json::json;

/// Response envelope of the script-query endpoint. `output` is itself a
/// JSON-encoded string holding the draft script document.
#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    success: bool,
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct ScriptFetcher {
    client: reqwest::Client,
    api_host: String,
    api_key: String,
}

impl ScriptFetcher {
    pub fn new(api_host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_host: api_host.into(),
            api_key: api_key.into(),
        }
    }

    /// Retrieve and parse the draft script. Failure at this layer is
    /// fatal to the run; there is no retry.
    pub async fn fetch(
        &self,
        draft_id: &str,
        variant: EditorVariant,
    ) -> Result<DraftScript, PipelineError> {
        let url = format!("{}/cut_capcut/query_script", self.api_host);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "draft_id": draft_id,
                "is_capcut": variant.is_capcut(),
            }))
            .send()
            .await
            .map_err(|e| PipelineError::Fetch(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PipelineError::Fetch(format!(
                "script query returned HTTP {} for draft {}",
                resp.status(),
                draft_id
            )));
        }

        let envelope: QueryEnvelope = resp
            .json()
            .await
            .map_err(|e| PipelineError::Fetch(format!("malformed envelope: {}", e)))?;

        if !envelope.success {
            return Err(PipelineError::Fetch(
                envelope
                    .error
                    .unwrap_or_else(|| "server reported failure without a message".to_string()),
            ));
        }

        let output = envelope.output.ok_or_else(|| {
            PipelineError::Fetch("envelope is missing the script output".to_string())
        })?;

        let script: DraftScript = serde_json::from_str(&output)
            .map_err(|e| PipelineError::Fetch(format!("malformed script document: {}", e)))?;

        info!(
            "Fetched draft {}: {} audio material(s), {} video material(s)",
            draft_id,
            script.materials.audios.len(),
            script.materials.videos.len()
        );
        Ok(script)
    }
}
