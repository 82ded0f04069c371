//! Gmail REST connector (bearer token) using reqwest.
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppResult};
use crate::types::{ListMessagesResponse, Message, MessageRef};

/// Where messages come from. The exporter only needs these two calls.
#[allow(async_fn_in_trait)]
pub trait MessageSource {
    /// Ids of the newest `max_count` messages, newest first.
    async fn list_recent(&self, user_id: &str, max_count: u32) -> AppResult<Vec<MessageRef>>;

    async fn get_message(&self, user_id: &str, id: &str) -> AppResult<Message>;
}

pub struct GmailClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(base_url: &str, access_token: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    fn messages_url(&self, user_id: &str) -> String {
        format!("{}/gmail/v1/users/{}/messages", self.base_url, user_id)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let res = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| AppError::Network(format!("request to {url} failed: {e}")))?;
        let res = check_status(res).await?;
        res.json()
            .await
            .map_err(|e| AppError::Unexpected(format!("parse response from {url}: {e}")))
    }
}

impl MessageSource for GmailClient {
    async fn list_recent(&self, user_id: &str, max_count: u32) -> AppResult<Vec<MessageRef>> {
        let url = self.messages_url(user_id);
        let list: ListMessagesResponse = self
            .get_json(&url, &[("maxResults", max_count.to_string())])
            .await?;
        Ok(list.messages)
    }

    async fn get_message(&self, user_id: &str, id: &str) -> AppResult<Message> {
        let url = format!("{}/{}", self.messages_url(user_id), id);
        self.get_json(&url, &[("format", "full".to_string())]).await
    }
}

async fn check_status(res: Response) -> AppResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(AppError::AuthExpired);
    }
    Err(AppError::Api {
        status: status.as_u16(),
        body,
    })
}
