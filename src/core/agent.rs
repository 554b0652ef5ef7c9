//! Agent：对话记录、当前工具调用批次、可选记忆的所有者
//!
//! 完成后端、嵌入与网关以 Arc 共享。所有会推进周期的方法都取 `&mut self`，
//! 因此同一个 Agent 同一时刻只能有一个进行中的周期；并发请求应各自 fork 一份。
//! 完成与工具周期分别在 completion.rs、tool_cycle.rs 中实现。

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::core::state::{CyclePhase, ToolCallBatch};
use crate::core::AgentError;
use crate::gateway::{self, GatewayError, Prompt, PromptMessage, Resource, ToolGateway};
use crate::llm::{ChatRequest, CompletionBackend, EmbeddingProvider, GenerationParams, ToolCall};
use crate::memory::{rag, Message, MemoryStore, Transcript, VectorRecord};
use crate::tools::ToolDefinition;

pub struct Agent {
    pub(crate) name: String,
    pub(crate) backend: Arc<dyn CompletionBackend>,
    pub(crate) params: GenerationParams,
    pub(crate) transcript: Transcript,
    pub(crate) tools: Vec<ToolDefinition>,
    pub(crate) batch: ToolCallBatch,
    pub(crate) memory: Option<MemoryStore>,
    pub(crate) embedder: Option<Arc<dyn EmbeddingProvider>>,
    pub(crate) gateway: Option<Arc<dyn ToolGateway>>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) prompts: Vec<Prompt>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("model", &self.params.model)
            .field("messages", &self.transcript.len())
            .field("tools", &self.tools.len())
            .field("phase", &self.batch.phase())
            .field("memory", &self.memory.as_ref().map(MemoryStore::len))
            .field("gateway", &self.gateway.is_some())
            .finish()
    }
}

/// 读取到的资源文本，附带发现阶段得到的名称与描述
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceText {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub text: String,
}

/// 展开后的提示词
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPrompt {
    pub name: String,
    pub description: String,
    pub messages: Vec<PromptMessage>,
}

impl Agent {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut GenerationParams {
        &mut self.params
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn push_message(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub fn tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// 按名称合并：同名定义被替换，新名称追加在末尾
    pub fn add_tools(&mut self, tools: impl IntoIterator<Item = ToolDefinition>) {
        for tool in tools {
            match self.tools.iter_mut().find(|t| t.name == tool.name) {
                Some(existing) => *existing = tool,
                None => self.tools.push(tool),
            }
        }
    }

    /// 最近一次 detect 得到的调用（resolve 之后仍可读）
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.batch.calls()
    }

    pub fn phase(&self) -> CyclePhase {
        self.batch.phase()
    }

    pub fn memory(&self) -> Option<&MemoryStore> {
        self.memory.as_ref()
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn gateway(&self) -> Option<&Arc<dyn ToolGateway>> {
        self.gateway.as_ref()
    }

    /// 复制出独立的 Agent：共享后端 / 嵌入 / 网关，复制对话与记忆，批次清空
    pub fn fork(&self) -> Agent {
        Agent {
            name: self.name.clone(),
            backend: Arc::clone(&self.backend),
            params: self.params.clone(),
            transcript: self.transcript.clone(),
            tools: self.tools.clone(),
            batch: ToolCallBatch::default(),
            memory: self.memory.clone(),
            embedder: self.embedder.clone(),
            gateway: self.gateway.clone(),
            resources: self.resources.clone(),
            prompts: self.prompts.clone(),
        }
    }

    pub(crate) fn request(&self) -> ChatRequest {
        ChatRequest::new(&self.params, self.transcript.messages())
    }

    // ---------- RAG 记忆 ----------

    fn embedder(&self) -> Result<&dyn EmbeddingProvider, AgentError> {
        self.embedder.as_deref().ok_or(AgentError::EmbedderNotConfigured)
    }

    /// 把文本块逐条嵌入写入记忆（没有记忆时先创建）；返回写入条数
    pub async fn index_memory<S: AsRef<str>>(&mut self, chunks: &[S]) -> Result<usize, AgentError> {
        let embedder = self.embedder.clone().ok_or(AgentError::EmbedderNotConfigured)?;
        let store = self.memory.get_or_insert_with(MemoryStore::new);
        Ok(rag::index_chunks(store, embedder.as_ref(), chunks).await?)
    }

    /// 相似度 >= threshold 的源文本
    pub async fn search_memory(&self, text: &str, threshold: f32) -> Result<Vec<String>, AgentError> {
        let store = self.memory.as_ref().ok_or(AgentError::MemoryNotConfigured)?;
        Ok(rag::search_text(store, self.embedder()?, text, threshold).await?)
    }

    pub async fn search_memory_top_n(
        &self,
        text: &str,
        threshold: f32,
        n: usize,
    ) -> Result<Vec<VectorRecord>, AgentError> {
        let store = self.memory.as_ref().ok_or(AgentError::MemoryNotConfigured)?;
        Ok(rag::search_text_top_n(store, self.embedder()?, text, threshold, n).await?)
    }

    // ---------- 网关发现 ----------

    fn require_gateway(&self) -> Result<Arc<dyn ToolGateway>, AgentError> {
        self.gateway.clone().ok_or(AgentError::GatewayNotConfigured)
    }

    /// 发现网关工具并合并进工具定义；返回保留的工具数
    pub async fn load_gateway_tools(&mut self, allow: &[String]) -> Result<usize, AgentError> {
        let gateway = self.require_gateway()?;
        let defs = gateway::discover_tools(gateway.as_ref(), allow).await?;
        let kept = defs.len();
        self.add_tools(defs);
        Ok(kept)
    }

    pub async fn load_gateway_resources(&mut self, allow: &[String]) -> Result<usize, AgentError> {
        let gateway = self.require_gateway()?;
        self.resources = gateway::discover_resources(gateway.as_ref(), allow).await?;
        Ok(self.resources.len())
    }

    pub async fn load_gateway_prompts(&mut self, allow: &[String]) -> Result<usize, AgentError> {
        let gateway = self.require_gateway()?;
        self.prompts = gateway::discover_prompts(gateway.as_ref(), allow).await?;
        Ok(self.prompts.len())
    }

    /// 读取资源的第一段内容；名称与描述取自已发现的资源列表
    pub async fn read_resource(&self, uri: &str) -> Result<ResourceText, AgentError> {
        let gateway = self.require_gateway()?;
        let contents = gateway.read_resource(uri).await?;
        let first = contents
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Protocol(format!("resource {uri} has no contents")))?;
        let known = self.resources.iter().find(|r| r.uri == first.uri);
        Ok(ResourceText {
            name: known.map(|r| r.name.clone()).unwrap_or_default(),
            description: known.and_then(|r| r.description.clone()).unwrap_or_default(),
            mime_type: first.mime_type.unwrap_or_default(),
            text: first.text.unwrap_or_default(),
            uri: first.uri,
        })
    }

    /// 获取提示词；描述取自已发现的提示词列表
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<ResolvedPrompt, AgentError> {
        let gateway = self.require_gateway()?;
        let result = gateway.get_prompt(name, arguments).await?;
        let description = self
            .prompts
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.description.clone())
            .unwrap_or_default();
        Ok(ResolvedPrompt {
            name: name.to_string(),
            description,
            messages: result.messages,
        })
    }
}
