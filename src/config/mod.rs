use crate::errors::{AppError, AppResult};
use std::env;

pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

/// Runtime settings, taken from the environment (and `.env`). There is no
/// config file.
#[derive(Debug, Clone)]
pub struct AppDefaults {
    pub user_id: String,
    pub api_base: String,
    /// Pre-issued bearer token; skips the OAuth flow when present.
    pub access_token: Option<String>,
}

impl AppDefaults {
    pub fn load() -> AppResult<Self> {
        let user_id = non_empty_var("GMAIL_USER_ID").unwrap_or_else(|| "me".to_string());
        let api_base = non_empty_var("GMAIL_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&api_base)
            .map_err(|e| AppError::Config(format!("invalid GMAIL_API_BASE {api_base}: {e}")))?;

        Ok(Self {
            user_id,
            api_base,
            access_token: non_empty_var("GMAIL_ACCESS_TOKEN"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
