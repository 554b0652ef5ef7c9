//! Mock / Scripted 后端（用于测试与无 API Key 的本地运行）
//!
//! - MockBackend：回显最后一条 User 消息，流式时按空白切分为多个增量。
//! - ScriptedBackend：按顺序弹出预置响应，并记录收到的请求，供单元测试断言。
//! - ScriptedEmbedder：按文本查表返回向量。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::stream;

use crate::llm::traits::{ChunkStream, CompletionBackend, LlmError};
use crate::llm::types::{ChatRequest, ChatResponse, StreamChunk};
use crate::llm::EmbeddingProvider;
use crate::memory::Role;

/// Mock 后端：回显用户最后一条消息
#[derive(Debug, Default)]
pub struct MockBackend;

impl MockBackend {
    fn reply(request: &ChatRequest) -> String {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");
        format!("Echo from Mock: {last_user}")
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        Ok(ChatResponse::text(Self::reply(&request)))
    }

    async fn complete_stream(&self, request: ChatRequest) -> Result<ChunkStream, LlmError> {
        let reply = Self::reply(&request);
        let chunks: Vec<Result<StreamChunk, LlmError>> = reply
            .split_inclusive(' ')
            .map(|piece| Ok(StreamChunk::text(piece)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// 流被 drop 时置位，用于断言流资源在每条退出路径上都已释放
#[derive(Debug, Clone, Default)]
pub struct DropFlag(Arc<AtomicBool>);

impl DropFlag {
    pub fn is_dropped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct DropGuard(DropFlag);

impl Drop for DropGuard {
    fn drop(&mut self) {
        (self.0).0.store(true, Ordering::SeqCst);
    }
}

/// 预置脚本后端：complete 与 complete_stream 各自一个 FIFO 队列
#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<ChatResponse, LlmError>>>,
    streams: Mutex<VecDeque<Vec<Result<StreamChunk, LlmError>>>>,
    requests: Mutex<Vec<ChatRequest>>,
    stream_dropped: DropFlag,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Result<ChatResponse, LlmError>) -> &Self {
        self.responses.lock().unwrap_or_else(|p| p.into_inner()).push_back(response);
        self
    }

    pub fn push_stream(&self, chunks: Vec<Result<StreamChunk, LlmError>>) -> &Self {
        self.streams.lock().unwrap_or_else(|p| p.into_inner()).push_back(chunks);
        self
    }

    /// 已收到的请求（按顺序）
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn stream_dropped(&self) -> DropFlag {
        self.stream_dropped.clone()
    }

    fn record(&self, request: ChatRequest) {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).push(request);
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.record(request);
        self.responses
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Api("script exhausted".to_string())))
    }

    async fn complete_stream(&self, request: ChatRequest) -> Result<ChunkStream, LlmError> {
        self.record(request);
        let chunks = self
            .streams
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .pop_front()
            .ok_or_else(|| LlmError::Api("script exhausted".to_string()))?;
        let guard = DropGuard(self.stream_dropped.clone());
        let items = stream::iter(chunks);
        // guard 随 unfold 状态一起被 drop
        Ok(Box::pin(stream::unfold(
            (items, guard),
            |(mut items, guard)| async move {
                use futures_util::StreamExt;
                items.next().await.map(|item| (item, (items, guard)))
            },
        )))
    }
}

/// 查表嵌入：未登记的文本返回错误，便于测试失败路径
#[derive(Debug, Default)]
pub struct ScriptedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| LlmError::Api(format!("no embedding scripted for: {text}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GenerationParams;
    use crate::memory::Message;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_mock_echoes_last_user() {
        let req = ChatRequest::new(
            &GenerationParams::new("m"),
            &[Message::user("first"), Message::assistant("x"), Message::user("second")],
        );
        let resp = MockBackend.complete(req.clone()).await.unwrap();
        assert_eq!(
            resp.choices[0].message.content.as_deref(),
            Some("Echo from Mock: second")
        );

        let mut stream = MockBackend.complete_stream(req).await.unwrap();
        let mut joined = String::new();
        while let Some(chunk) = stream.next().await {
            joined.push_str(chunk.unwrap().content().unwrap_or_default());
        }
        assert_eq!(joined, "Echo from Mock: second");
    }

    #[tokio::test]
    async fn test_scripted_backend_exhausted_is_error() {
        let backend = ScriptedBackend::new();
        let req = ChatRequest::new(&GenerationParams::new("m"), &[]);
        assert!(backend.complete(req).await.is_err());
        assert_eq!(backend.requests().len(), 1);
    }
}
