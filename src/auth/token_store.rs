use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

use crate::config::APP_NAME;

/// Secrets live in the OS keyring: the refresh token keyed by user email,
/// the OAuth client secret keyed by client id.
fn entry(account: &str) -> Result<Entry> {
    Entry::new(APP_NAME, account).map_err(|e| anyhow!(e.to_string()))
}

fn get(account: &str) -> Result<Option<String>> {
    match entry(account)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

fn set(account: &str, secret: &str) -> Result<()> {
    entry(account)?
        .set_password(secret)
        .map_err(|e| anyhow!(e.to_string()))
}

pub fn save_refresh_token(user_email: &str, refresh_token: &str) -> Result<()> {
    set(user_email, refresh_token)
}

pub fn load_refresh_token(user_email: &str) -> Result<Option<String>> {
    get(user_email)
}

pub fn save_client_secret(client_id: &str, client_secret: &str) -> Result<()> {
    set(client_id, client_secret)
}

pub fn load_client_secret(client_id: &str) -> Result<Option<String>> {
    get(client_id)
}
