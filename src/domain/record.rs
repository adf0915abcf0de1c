use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized email record persisted as `raw_emails/{id}.json`.
///
/// Written once by the downloader, never mutated; file existence is the
/// "already downloaded" marker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEmailRecord {
    pub id: String,
    #[serde(rename = "threadId", default)]
    pub thread_id: String,
    #[serde(rename = "labelIds", default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub snippet: String,
    /// Header name -> value, case-sensitive keys, last-write-wins on duplicates.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: RecordBody,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub html: String,
}
