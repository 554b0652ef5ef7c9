//! Agent 错误类型
//!
//! 分层：传输错误（LlmError / GatewayError）、零结果（NoChoices / NoToolCallsDetected / NoToolResponses）、
//! 本地契约违例（ToolNotImplemented / InvalidArguments）、配置缺失。远程工具的执行失败不在这里，
//! 而是作为该次调用的输出文本返回。

use thiserror::Error;

use crate::gateway::GatewayError;
use crate::llm::LlmError;
use crate::memory::{MemoryError, RagError};
use crate::tools::ArgumentError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// 流在中途失败；partial 为失败前已累积的文本
    #[error("stream interrupted after {} bytes: {source}", .partial.len())]
    StreamInterrupted { partial: String, source: LlmError },

    #[error("no choices found")]
    NoChoices,

    #[error("no tool calls detected")]
    NoToolCallsDetected,

    #[error("no tool responses found")]
    NoToolResponses,

    /// resolve 只能紧跟一次成功的 detect
    #[error("no pending tool calls to resolve")]
    NoPendingToolCalls,

    #[error("tool {0} not implemented")]
    ToolNotImplemented(String),

    #[error("invalid arguments for tool {tool}: {source}")]
    InvalidArguments { tool: String, source: ArgumentError },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("no tool gateway configured")]
    GatewayNotConfigured,

    #[error("no embedding provider configured")]
    EmbedderNotConfigured,

    #[error("no memory store configured")]
    MemoryNotConfigured,

    #[error("Config error: {0}")]
    Config(String),
}

impl From<RagError> for AgentError {
    fn from(e: RagError) -> Self {
        match e {
            RagError::Embedding(e) => AgentError::Llm(e),
            RagError::Store(e) => AgentError::Memory(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(AgentError::NoChoices.to_string(), "no choices found");
        assert_eq!(
            AgentError::ToolNotImplemented("add".into()).to_string(),
            "tool add not implemented"
        );
        let err = AgentError::StreamInterrupted {
            partial: "Hello".into(),
            source: LlmError::Stream("reset".into()),
        };
        assert!(err.to_string().starts_with("stream interrupted after 5 bytes"));
    }

    #[test]
    fn test_rag_error_maps_to_layer() {
        let e: AgentError = RagError::Store(MemoryError::EmptyEmbedding).into();
        assert_eq!(e, AgentError::Memory(MemoryError::EmptyEmbedding));
        let e: AgentError = RagError::Embedding(LlmError::Api("down".into())).into();
        assert!(matches!(e, AgentError::Llm(_)));
    }
}
