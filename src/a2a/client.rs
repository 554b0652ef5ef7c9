//! A2A 客户端：取对方名片（ping）与发送任务

use thiserror::Error;

use crate::a2a::{AgentCard, TaskRequest, TaskResponse};

pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("agent responded with status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone)]
pub struct A2aClient {
    http: reqwest::Client,
    base_url: String,
}

impl A2aClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET /.well-known/agent.json
    pub async fn ping(&self) -> Result<AgentCard, ClientError> {
        let resp = self
            .http
            .get(format!("{}{}", self.base_url, AGENT_CARD_PATH))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }

    /// POST / 发送任务
    pub async fn send_task(&self, request: &TaskRequest) -> Result<TaskResponse, ClientError> {
        tracing::debug!(base_url = %self.base_url, task_id = %request.id, "sending task");
        let resp = self
            .http
            .post(format!("{}/", self.base_url))
            .json(request)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::Status(resp.status()));
        }
        Ok(resp.json().await?)
    }
}
