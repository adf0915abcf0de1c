use anyhow::{Result, anyhow};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::oauth::{self, GMAIL_READONLY_SCOPE};
use crate::auth::{token_cache, token_store};
use crate::config::Config;

#[derive(Clone)]
pub struct TokenManager {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub user_email: String,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let user_email = cfg
            .user_email
            .clone()
            .ok_or_else(|| anyhow!("user_email not set in config"))?;
        let redirect_uri = cfg
            .redirect_uri
            .clone()
            .unwrap_or_else(|| "http://127.0.0.1:8080/callback".to_string());

        let client_secret = token_store::load_client_secret(&cfg.client_id)?
            .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id: cfg.client_id.clone(),
            client_secret,
            redirect_uri,
            user_email,
        })
    }

    /// A valid access token, in order of preference: cached, refreshed,
    /// freshly obtained via the interactive PKCE flow.
    pub fn get_access_token(&self) -> Result<String> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;

        let cached = token_cache::load()?;
        if let Some(token) = cached.valid_access_token(now) {
            return Ok(token.to_string());
        }

        if let Some(refresh_token) = token_store::load_refresh_token(&self.user_email)? {
            match oauth::refresh_access_token(
                &self.client_id,
                self.client_secret.as_deref(),
                &refresh_token,
            ) {
                Ok(tokens) => return self.remember(tokens, now),
                Err(e) => {
                    log::warn!("token refresh failed, falling back to interactive auth: {e}");
                }
            }
        }

        println!("No usable token; running interactive PKCE auth flow...");
        let tokens = oauth::perform_pkce_flow(
            &self.client_id,
            self.client_secret.as_deref(),
            &self.redirect_uri,
            GMAIL_READONLY_SCOPE,
        )?;
        self.remember(tokens, now)
    }

    /// Persist what came back: the refresh token into the keyring (secret),
    /// the access token and expiry into the cache file (non-secret).
    /// Both saves are best-effort; the token itself is still returned.
    fn remember(&self, tokens: oauth::Tokens, now_epoch: i64) -> Result<String> {
        if let Some(refresh) = &tokens.refresh_token
            && let Err(e) = token_store::save_refresh_token(&self.user_email, refresh)
        {
            log::warn!("could not store refresh token in keyring: {e}");
        }

        let expiry = tokens
            .expires_in
            .map(|s| now_epoch + s as i64)
            .unwrap_or(now_epoch + 3500);
        if let Err(e) = token_cache::save(Some(&tokens.access_token), Some(expiry)) {
            log::warn!("could not cache access token metadata: {e}");
        }

        Ok(tokens.access_token)
    }
}
