//! 远程工具网关
//!
//! 网关是一个独立进程（sidecar），通过管道上的 JSON-RPC 暴露工具、资源与提示词。
//! Agent 只依赖 ToolGateway trait：
//! - `StdioGateway`：子进程 stdin/stdout 传输（见 stdio.rs）
//! - `ScriptedGateway`：进程内假实现，用于测试
//!
//! discovery.rs 负责把网关公布的工具 / 资源 / 提示词按白名单筛选后交给 Agent。

pub mod command;
pub mod discovery;
pub mod mock;
pub mod stdio;
pub mod types;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub use command::GatewayCommand;
pub use discovery::{discover_prompts, discover_resources, discover_tools};
pub use mock::ScriptedGateway;
pub use stdio::StdioGateway;
pub use types::{
    CallToolResult, GatewayTool, GetPromptResult, Prompt, PromptArgument, PromptContent,
    PromptMessage, Resource, ResourceContents,
};

/// 网关传输层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("failed to spawn gateway: {0}")]
    Spawn(String),

    #[error("gateway io error: {0}")]
    Io(String),

    #[error("gateway channel closed")]
    Closed,

    #[error("gateway protocol error: {0}")]
    Protocol(String),

    #[error("gateway error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("gateway request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<std::io::Error> for GatewayError {
    fn from(e: std::io::Error) -> Self {
        GatewayError::Io(e.to_string())
    }
}

/// 工具网关：列出与调用远程工具，读取资源，获取提示词
#[async_trait]
pub trait ToolGateway: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<GatewayTool>, GatewayError>;

    /// arguments 为已解析的 JSON 对象
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, GatewayError>;

    async fn list_resources(&self) -> Result<Vec<Resource>, GatewayError>;

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContents>, GatewayError>;

    async fn list_prompts(&self) -> Result<Vec<Prompt>, GatewayError>;

    async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, GatewayError>;
}
