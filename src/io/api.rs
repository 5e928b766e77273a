//! HTTP client for the task board server.
//!
//! All methods are async and run on the worker's runtime, never on the UI thread.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::model::task::{DateUpdate, Task, TaskDetail, TaskUpdate, UpdateResponse};

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = config.session_cookie.as_deref() {
            match HeaderValue::from_str(cookie) {
                Ok(value) => {
                    headers.insert(COOKIE, value);
                }
                Err(err) => tracing::warn!(%err, "session cookie is not a valid header value"),
            }
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Absolute URL of a report attachment.
    pub fn upload_url(&self, path: &str) -> String {
        self.url(&format!("uploads/{}", path.trim_start_matches('/')))
    }

    /// `GET /api/project/{id}/tasks`
    pub async fn fetch_project_tasks(&self, project_id: &str) -> Result<Vec<Task>, ApiError> {
        let url = self.url(&format!("api/project/{project_id}/tasks"));
        tracing::debug!(%url, "fetching project tasks");
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// `GET /api/task/{id}`
    pub async fn fetch_task(&self, task_id: &str) -> Result<TaskDetail, ApiError> {
        let url = self.url(&format!("api/task/{task_id}"));
        tracing::debug!(%url, "fetching task detail");
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// `POST /task/{id}/update`, form-encoded.
    pub async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<UpdateResponse, ApiError> {
        let url = self.url(&format!("task/{task_id}/update"));
        let response = self.client.post(&url).form(update).send().await?;
        accepted(decode(response).await?)
    }

    /// `PUT /api/tasks/{id}/dates` with the rescheduled dates.
    pub async fn update_task_dates(&self, update: &DateUpdate) -> Result<UpdateResponse, ApiError> {
        let url = self.url(&format!("api/tasks/{}/dates", update.task_id));
        let response = self.client.put(&url).json(update).send().await?;
        accepted(decode(response).await?)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        // The server answers errors with `{"error": "..."}`; surface that text.
        if let Ok(reply) = serde_json::from_str::<UpdateResponse>(&body) {
            if let Some(error) = reply.error.filter(|e| !e.is_empty()) {
                return Err(ApiError::Rejected(error));
            }
        }
        return Err(ApiError::Status { status, body });
    }
    Ok(response.json().await?)
}

fn accepted(reply: UpdateResponse) -> Result<UpdateResponse, ApiError> {
    if reply.success {
        Ok(reply)
    } else {
        Err(ApiError::Rejected(reply.error.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        let config = AppConfig {
            base_url: base.into(),
            session_cookie: Some("session=abc".into()),
            ..Default::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let api = client("http://localhost:5000/");
        assert_eq!(api.url("/api/task/7"), "http://localhost:5000/api/task/7");
        assert_eq!(api.upload_url("/t1/otchet.pdf"), "http://localhost:5000/uploads/t1/otchet.pdf");
    }

    #[test]
    fn unsuccessful_reply_is_rejected() {
        let reply: UpdateResponse =
            serde_json::from_str(r#"{"success": false, "error": "Задача не найдена"}"#).unwrap();
        match accepted(reply) {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "Задача не найдена"),
            other => panic!("unexpected {other:?}"),
        }
        let ok: UpdateResponse = serde_json::from_str(r#"{"success": true, "message": "ok"}"#).unwrap();
        assert!(accepted(ok).is_ok());
    }
}
