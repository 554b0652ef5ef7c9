//! 完成后端抽象
//!
//! 所有后端（OpenAI 兼容 / Mock / Scripted）实现 CompletionBackend：complete（非流式）、complete_stream（流式增量）。

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use thiserror::Error;

use crate::llm::types::{ChatRequest, ChatResponse, StreamChunk};

/// 后端传输层错误：总是原样上抛，不自动重试
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("request build failed: {0}")]
    Request(String),

    #[error("backend API error: {0}")]
    Api(String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error("stream error: {0}")]
    Stream(String),
}

/// 流式增量：拥有所有权的装箱 Stream，drop 即释放底层连接
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, LlmError>> + Send>>;

/// 完成后端 trait：非流式完成与流式完成
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 非流式完成
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// 流式完成，返回增量流
    async fn complete_stream(&self, request: ChatRequest) -> Result<ChunkStream, LlmError>;
}
