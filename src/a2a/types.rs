//! A2A 任务协议的报文结构（message/send 子集）与 Agent Card

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";
pub const METHOD_SEND: &str = "message/send";

fn text_kind() -> String {
    "text".to_string()
}

fn jsonrpc_version() -> String {
    JSONRPC_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(rename = "type", default = "text_kind")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

impl TextPart {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: text_kind(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub role: String,
    #[serde(default)]
    pub parts: Vec<TextPart>,
}

impl AgentMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![TextPart::new(text)],
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            parts: vec![TextPart::new(text)],
        }
    }

    /// 第一个 part 的文本
    pub fn first_text(&self) -> Option<&str> {
        self.parts.first().map(|p| p.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskParams {
    pub message: AgentMessage,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// 任务请求：`{jsonrpc, id, method, params: {message, metadata}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    pub params: TaskParams,
}

impl TaskRequest {
    /// message/send 请求，携带一条用户文本
    pub fn send_message(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id: id.into(),
            method: METHOD_SEND.to_string(),
            params: TaskParams {
                message: AgentMessage::user(text),
                metadata: Map::new(),
            },
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.metadata.insert(key.into(), value.into());
        self
    }

    /// metadata.skill（字符串时）
    pub fn skill(&self) -> Option<&str> {
        self.params.metadata.get("skill").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub status: TaskStatus,
    #[serde(default)]
    pub history: Vec<AgentMessage>,
    pub kind: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// 任务响应：`{jsonrpc, id, result: {status, history, kind: "task", metadata}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    #[serde(default = "jsonrpc_version")]
    pub jsonrpc: String,
    pub result: TaskResult,
}

impl TaskResponse {
    /// 已完成的任务，回复作为一条 assistant 消息
    pub fn completed(id: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            jsonrpc: jsonrpc_version(),
            result: TaskResult {
                status: TaskStatus {
                    state: "completed".to_string(),
                },
                history: vec![AgentMessage::assistant(reply)],
                kind: "task".to_string(),
                metadata: Map::new(),
            },
        }
    }

    /// 历史中最后一条消息的第一段文本
    pub fn reply_text(&self) -> Option<&str> {
        self.result.history.last().and_then(AgentMessage::first_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapabilities {
    pub streaming: bool,
    #[serde(rename = "pushNotifications")]
    pub push_notifications: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSkill {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// `/.well-known/agent.json` 返回的名片
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub version: String,
    pub capabilities: AgentCapabilities,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

impl AgentCard {
    /// 同步请求/响应：不支持流式与推送
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            version: version.into(),
            capabilities: AgentCapabilities {
                streaming: false,
                push_notifications: false,
            },
            skills: Vec::new(),
        }
    }

    pub fn with_skills(mut self, skills: Vec<AgentSkill>) -> Self {
        self.skills = skills;
        self
    }
}
