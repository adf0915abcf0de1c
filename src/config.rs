use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "gmail2md";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub client_id: String,
    pub user_email: Option<String>,
    pub redirect_uri: Option<String>,
    /// Root of the local store; `raw_emails/` and the markdown artifacts
    /// live under it. Defaults to `~/Documents/gmail_exports`.
    pub output_dir: Option<String>,
    #[serde(default)]
    pub converter: ConverterSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ConverterSettings {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "google/gemini-2.5-flash".to_string(),
            timeout_secs: 120,
        }
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join(APP_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

pub fn tokens_cache_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("tokens.json");
    Ok(p)
}

pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        // create a template config for users to edit
        let sample = Config {
            client_id: "YOUR_CLIENT_ID.apps.googleusercontent.com".to_string(),
            user_email: Some("you@example.com".to_string()),
            redirect_uri: Some("http://127.0.0.1:8080/callback".to_string()),
            output_dir: None,
            converter: ConverterSettings::default(),
        };
        let tom = toml::to_string_pretty(&sample)?;
        fs::write(&path, tom)?;
        return Err(anyhow::anyhow!(
            "Created template config at {} — edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

pub fn default_output_dir() -> PathBuf {
    dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gmail_exports")
}

/// CLI flag wins over config, config over the built-in default.
pub fn resolve_output_dir(cfg: &Config, cli_override: Option<PathBuf>) -> PathBuf {
    cli_override
        .or_else(|| cfg.output_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_output_dir)
}
