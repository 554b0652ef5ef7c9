//! A2A（agent-to-agent）任务协议
//!
//! 同步请求/响应子集：只处理 `message/send`。dispatch 负责校验与方法分派，
//! 实际处理交给 TaskHandler；AgentTaskHandler 对每个请求 fork 一份模板 Agent，
//! 因此并发请求之间互不共享对话状态，也不需要全局锁。
//!
//! - server.rs（feature `a2a`）：axum 路由，`GET /.well-known/agent.json` 与 `POST /`
//! - client.rs：ping 与 send_task

pub mod client;
#[cfg(feature = "a2a")]
pub mod server;
pub mod types;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{Agent, AgentError};
use crate::memory::Message;

pub use client::{A2aClient, ClientError};
pub use types::{
    AgentCapabilities, AgentCard, AgentMessage, AgentSkill, TaskParams, TaskRequest, TaskResponse,
    TaskResult, TaskStatus, TextPart, METHOD_SEND,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("invalid request format")]
    InvalidRequest,

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("agent callback failed: {0}")]
    Handler(#[from] AgentError),
}

/// 处理一个已校验的 message/send 请求
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, request: TaskRequest) -> Result<TaskResponse, AgentError>;
}

/// 校验并分派：message/send 且至少一个 part 才交给 handler
pub async fn dispatch(request: TaskRequest, handler: &dyn TaskHandler) -> Result<TaskResponse, TaskError> {
    if request.method != METHOD_SEND {
        return Err(TaskError::UnknownMethod(request.method));
    }
    if request.params.message.parts.is_empty() {
        return Err(TaskError::InvalidRequest);
    }
    let id = request.id.clone();
    tracing::info!(task_id = %id, skill = ?request.skill(), "task received");
    let response = handler.handle(request).await.map_err(|e| {
        tracing::error!(task_id = %id, error = %e, "task handler failed");
        e
    })?;
    Ok(response)
}

/// 以模板 Agent 处理任务：fork → 追加用户消息 → complete → completed 任务
pub struct AgentTaskHandler {
    template: Agent,
    skill_prompts: HashMap<String, String>,
}

impl AgentTaskHandler {
    pub fn new(template: Agent) -> Self {
        Self {
            template,
            skill_prompts: HashMap::new(),
        }
    }

    /// metadata.skill 等于 skill 时，用模板改写用户输入；模板中的 `{input}` 替换为原文
    pub fn with_skill_prompt(mut self, skill: impl Into<String>, template: impl Into<String>) -> Self {
        self.skill_prompts.insert(skill.into(), template.into());
        self
    }

    fn user_turn(&self, request: &TaskRequest) -> String {
        let input = request.params.message.first_text().unwrap_or_default();
        match request.skill().and_then(|s| self.skill_prompts.get(s)) {
            Some(template) => template.replace("{input}", input),
            None => input.to_string(),
        }
    }
}

#[async_trait]
impl TaskHandler for AgentTaskHandler {
    async fn handle(&self, request: TaskRequest) -> Result<TaskResponse, AgentError> {
        let mut agent = self.template.fork();
        agent.push_message(Message::user(self.user_turn(&request)));
        let reply = agent.complete().await?;
        Ok(TaskResponse::completed(request.id, reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::core::AgentBuilder;
    use crate::llm::{ChatResponse, GenerationParams, LlmError, MockBackend, ScriptedBackend};

    fn handler() -> AgentTaskHandler {
        let template = AgentBuilder::new(Arc::new(MockBackend), GenerationParams::new("mock"))
            .system_prompt("You are Bob, a simple A2A agent. You can answer questions.")
            .build();
        AgentTaskHandler::new(template)
            .with_skill_prompt("greetings", "Greetings to {input} with emojis and use his name.")
    }

    #[tokio::test]
    async fn test_dispatch_message_send() {
        let resp = dispatch(TaskRequest::send_message("42", "What is A2A?"), &handler())
            .await
            .unwrap();
        assert_eq!(resp.id, "42");
        assert_eq!(resp.result.status.state, "completed");
        assert_eq!(resp.reply_text(), Some("Echo from Mock: What is A2A?"));
    }

    #[tokio::test]
    async fn test_skill_prompt_rewrites_input() {
        let req = TaskRequest::send_message("1", "Sam").with_metadata("skill", "greetings");
        let resp = dispatch(req, &handler()).await.unwrap();
        assert_eq!(
            resp.reply_text(),
            Some("Echo from Mock: Greetings to Sam with emojis and use his name.")
        );
    }

    #[tokio::test]
    async fn test_dispatch_rejects_unknown_method_and_empty_parts() {
        let mut req = TaskRequest::send_message("1", "hi");
        req.method = "tasks/get".into();
        assert_eq!(
            dispatch(req, &handler()).await.unwrap_err(),
            TaskError::UnknownMethod("tasks/get".into())
        );

        let mut req = TaskRequest::send_message("1", "hi");
        req.params.message.parts.clear();
        assert_eq!(dispatch(req, &handler()).await.unwrap_err(), TaskError::InvalidRequest);
    }

    #[tokio::test]
    async fn test_handler_failure_is_reported() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_response(Err(LlmError::Api("model not loaded".into())));
        let handler = AgentTaskHandler::new(AgentBuilder::new(backend, GenerationParams::new("m")).build());
        let err = dispatch(TaskRequest::send_message("1", "hi"), &handler).await.unwrap_err();
        assert!(matches!(err, TaskError::Handler(AgentError::Llm(_))));
    }

    #[tokio::test]
    async fn test_requests_do_not_share_transcript() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_response(Ok(ChatResponse::text("one")));
        backend.push_response(Ok(ChatResponse::text("two")));
        let handler = AgentTaskHandler::new(
            AgentBuilder::new(backend.clone(), GenerationParams::new("m"))
                .system_prompt("sys")
                .build(),
        );
        dispatch(TaskRequest::send_message("1", "first"), &handler).await.unwrap();
        dispatch(TaskRequest::send_message("2", "second"), &handler).await.unwrap();

        let requests = backend.requests();
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[1].messages.len(), 2);
        assert_eq!(requests[1].messages[1].content, "second");
    }
}
