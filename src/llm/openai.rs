//! OpenAI 兼容 API 后端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；支持 OpenAI、Ollama、Docker Model Runner 等。
//! 请求 / 响应使用本 crate 的 wire 类型（byot），以便携带工具调用与结构化输出。

use async_openai::config::OpenAIConfig;
use async_openai::Client;
use async_trait::async_trait;
use futures_util::StreamExt;

use crate::llm::traits::{ChunkStream, CompletionBackend, LlmError};
use crate::llm::types::{ChatRequest, ChatResponse, StreamChunk};

/// 构造 OpenAIConfig：本地推理服务（DMR / Ollama）不校验 key，未提供时用空串
pub(crate) fn openai_config(base_url: Option<&str>, api_key: Option<&str>) -> OpenAIConfig {
    let api_key = api_key
        .map(String::from)
        .or_else(|| std::env::var("OPENAI_API_KEY").ok())
        .unwrap_or_default();

    match base_url {
        Some(url) => OpenAIConfig::new().with_api_base(url).with_api_key(api_key),
        None => OpenAIConfig::new().with_api_key(api_key),
    }
}

#[derive(Clone)]
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
}

impl std::fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiBackend").finish_non_exhaustive()
    }
}

impl OpenAiBackend {
    pub fn new(base_url: Option<&str>, api_key: Option<&str>) -> Self {
        Self {
            client: Client::with_config(openai_config(base_url, api_key)),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, LlmError> {
        tracing::debug!(model = %request.model, tools = request.tools.len(), "chat completion request");
        let response: ChatResponse = self
            .client
            .chat()
            .create_byot(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        Ok(response)
    }

    async fn complete_stream(&self, request: ChatRequest) -> Result<ChunkStream, LlmError> {
        let request = request.streaming();
        tracing::debug!(model = %request.model, "chat completion stream request");
        let stream = self
            .client
            .chat()
            .create_stream_byot::<ChatRequest, StreamChunk>(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        Ok(Box::pin(
            stream.map(|item| item.map_err(|e| LlmError::Stream(e.to_string()))),
        ))
    }
}
