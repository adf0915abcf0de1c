use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Finished artifact produced by the external converter from a raw record's
/// plain-text body. Persisted verbatim as `<day> <mon> <yy> <title>.md`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Essay {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub author: String,
    pub date: NaiveDate,
}
