//! Agent 构建器：组合完成后端、生成参数、初始消息、工具定义与可选的嵌入 / 网关 / 记忆

use std::sync::Arc;

use crate::core::agent::Agent;
use crate::gateway::ToolGateway;
use crate::llm::{CompletionBackend, EmbeddingProvider, GenerationParams};
use crate::memory::{Message, MemoryStore, Transcript};
use crate::tools::ToolDefinition;

pub struct AgentBuilder {
    name: String,
    backend: Arc<dyn CompletionBackend>,
    params: GenerationParams,
    messages: Vec<Message>,
    tools: Vec<ToolDefinition>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    gateway: Option<Arc<dyn ToolGateway>>,
    memory: Option<MemoryStore>,
}

impl AgentBuilder {
    pub fn new(backend: Arc<dyn CompletionBackend>, params: GenerationParams) -> Self {
        Self {
            name: "agent".to_string(),
            backend,
            params,
            messages: Vec::new(),
            tools: Vec::new(),
            embedder: None,
            gateway: None,
            memory: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 追加一条 system 消息
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.push(Message::system(prompt));
        self
    }

    pub fn messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn ToolGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn memory(mut self, store: MemoryStore) -> Self {
        self.memory = Some(store);
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            name: self.name,
            backend: self.backend,
            params: self.params,
            transcript: Transcript::from(self.messages),
            tools: self.tools,
            batch: Default::default(),
            memory: self.memory,
            embedder: self.embedder,
            gateway: self.gateway,
            resources: Vec::new(),
            prompts: Vec::new(),
        }
    }
}
