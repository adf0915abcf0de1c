use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

use crate::config::tokens_cache_path;

/// Non-secret access-token metadata cached between runs in the config dir.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TokenCache {
    pub access_token: Option<String>,
    /// Expiry in epoch seconds.
    pub expires_at_epoch: Option<i64>,
}

impl TokenCache {
    /// A still-valid cached token, if any.
    pub fn valid_access_token(&self, now_epoch: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at_epoch) {
            (Some(token), Some(expiry)) if now_epoch < expiry => Some(token),
            _ => None,
        }
    }
}

pub fn load() -> Result<TokenCache> {
    let path = tokens_cache_path()?;
    if !path.exists() {
        return Ok(TokenCache::default());
    }
    let s = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&s)?)
}

pub fn save(access_token: Option<&str>, expires_at_epoch: Option<i64>) -> Result<()> {
    let cache = TokenCache {
        access_token: access_token.map(str::to_string),
        expires_at_epoch,
    };
    let s = serde_json::to_string_pretty(&cache)?;
    fs::write(tokens_cache_path()?, s)?;
    Ok(())
}
