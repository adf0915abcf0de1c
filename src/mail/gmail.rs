use anyhow::{Result, anyhow};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::mail::api::{ListPage, MailApi, Message};

const BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages";

/// Blocking Gmail REST client. One request in flight at a time; the access
/// token is obtained by the caller (see `auth::token_manager`).
pub struct GmailClient {
    http: reqwest::blocking::Client,
    access_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

impl GmailClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            access_token: access_token.into(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, params: &[(&str, &str)]) -> Result<T> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let snippet: String = body.chars().take(300).collect();
            return Err(anyhow!("Gmail API returned {status}: {snippet}"));
        }

        Ok(resp.json()?)
    }
}

impl MailApi for GmailClient {
    fn list_messages(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ListPage> {
        let max_results = page_size.to_string();
        let mut params: Vec<(&str, &str)> = vec![("maxResults", max_results.as_str())];
        if !query.is_empty() {
            params.push(("q", query));
        }
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let resp: ListResponse = self.get_json(BASE_URL, &params)?;
        Ok(ListPage {
            ids: resp.messages.into_iter().map(|m| m.id).collect(),
            next_page_token: resp.next_page_token,
        })
    }

    fn get_message(&self, id: &str) -> Result<Message> {
        let url = format!("{BASE_URL}/{id}");
        self.get_json(&url, &[("format", "full")])
    }

    fn get_metadata(&self, id: &str) -> Result<Message> {
        let url = format!("{BASE_URL}/{id}");
        self.get_json(
            &url,
            &[
                ("format", "metadata"),
                ("metadataHeaders", "Subject"),
                ("metadataHeaders", "From"),
                ("metadataHeaders", "Date"),
            ],
        )
    }
}
