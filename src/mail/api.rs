use anyhow::Result;
use serde::Deserialize;

/// One page of message identifiers from the listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub ids: Vec<String>,
    /// Opaque cursor; `None` signals the final page.
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartBody {
    /// Inline content, base64 (URL-safe alphabet) encoded.
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// A node of the MIME payload tree: either a leaf part carrying inline data
/// or a container with an ordered list of child parts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub thread_id: String,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub payload: Option<MessagePart>,
}

/// Remote mailbox service seam. The production implementation talks to the
/// Gmail REST API; tests substitute a mock.
pub trait MailApi {
    fn list_messages(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ListPage>;

    /// Full message, payload tree included.
    fn get_message(&self, id: &str) -> Result<Message>;

    /// Headers-only fetch (Subject/From/Date), used by dry-run previews.
    fn get_metadata(&self, id: &str) -> Result<Message>;
}
