//! Typed view of the ComfyUI `/history/{prompt_id}` payload.
//!
//! ComfyUI keys the history object by prompt id and returns `{}` while the
//! prompt is still queued or running. Once finished, the entry lists the
//! outputs of every node that produced files, plus an execution status.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A single file written by an output node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputImage {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    /// Storage bucket, usually `output` or `temp`.
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "output".to_string()
}

/// Files produced by one node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeOutput {
    #[serde(default)]
    pub images: Vec<OutputImage>,
}

/// Completion status reported alongside the outputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionStatus {
    #[serde(default)]
    pub status_str: String,
    #[serde(default)]
    pub completed: bool,
    /// Raw `[event, payload]` pairs emitted during execution.
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
}

/// History for one finished prompt.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryEntry {
    /// Outputs keyed by node id. Ordered so the first image is stable.
    #[serde(default)]
    pub outputs: BTreeMap<String, NodeOutput>,
    #[serde(default)]
    pub status: ExecutionStatus,
}

impl HistoryEntry {
    /// Extract the entry for `prompt_id` from a full history response.
    ///
    /// Returns `Ok(None)` when the prompt is not present yet.
    pub fn from_history(
        prompt_id: &str,
        body: &serde_json::Value,
    ) -> Result<Option<Self>, serde_json::Error> {
        match body.get(prompt_id) {
            None => Ok(None),
            Some(entry) => serde_json::from_value(entry.clone()).map(Some),
        }
    }

    /// First image across all output nodes, in node-id order.
    pub fn first_image(&self) -> Option<&OutputImage> {
        self.outputs.values().flat_map(|o| o.images.iter()).next()
    }

    /// True when ComfyUI reported an execution failure.
    pub fn is_error(&self) -> bool {
        self.status.status_str == "error"
    }

    /// Best-effort error description pulled from `execution_error` messages.
    pub fn error_message(&self) -> Option<String> {
        self.status.messages.iter().find_map(|m| {
            let pair = m.as_array()?;
            if pair.first()?.as_str()? != "execution_error" {
                return None;
            }
            let payload = pair.get(1)?;
            payload
                .get("exception_message")
                .and_then(|v| v.as_str())
                .map(|s| s.trim().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn finished() -> serde_json::Value {
        json!({
            "p-1": {
                "prompt": [],
                "outputs": {
                    "9": {
                        "images": [
                            { "filename": "storyloom_00001_.png", "subfolder": "", "type": "output" }
                        ]
                    }
                },
                "status": { "status_str": "success", "completed": true, "messages": [] }
            }
        })
    }

    #[test]
    fn missing_prompt_is_pending() {
        assert!(HistoryEntry::from_history("p-1", &json!({}))
            .unwrap()
            .is_none());
    }

    #[test]
    fn finished_entry_exposes_first_image() {
        let entry = HistoryEntry::from_history("p-1", &finished())
            .unwrap()
            .unwrap();
        assert!(entry.status.completed);
        assert!(!entry.is_error());
        let image = entry.first_image().unwrap();
        assert_eq!(image.filename, "storyloom_00001_.png");
        assert_eq!(image.kind, "output");
    }

    #[test]
    fn error_entry_reports_exception_message() {
        let body = json!({
            "p-2": {
                "outputs": {},
                "status": {
                    "status_str": "error",
                    "completed": false,
                    "messages": [
                        ["execution_start", { "prompt_id": "p-2" }],
                        ["execution_error", { "exception_message": "ckpt not found\n" }]
                    ]
                }
            }
        });
        let entry = HistoryEntry::from_history("p-2", &body).unwrap().unwrap();
        assert!(entry.is_error());
        assert!(entry.first_image().is_none());
        assert_eq!(entry.error_message().as_deref(), Some("ckpt not found"));
    }
}
