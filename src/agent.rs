//! 按配置组装 Agent
//!
//! create_agent 只做同步部分（后端、生成参数、system prompt、嵌入）；
//! prepare_agent 额外启动网关、发现工具 / 资源 / 提示词，并把 [memory].chunks 写入记忆。

use std::sync::Arc;
use std::time::Duration;

use crate::a2a::{AgentCard, AgentSkill, AgentTaskHandler};
use crate::config::{A2aSection, AppConfig, GatewaySection, LlmSection};
use crate::core::{Agent, AgentBuilder, AgentError};
use crate::gateway::{GatewayCommand, StdioGateway};
use crate::llm::{
    CompletionBackend, EmbeddingProvider, GenerationParams, MockBackend, OpenAiBackend, OpenAiEmbedder,
};

/// 配置了 api_key / base_url 或存在 OPENAI_API_KEY 时用 OpenAI 兼容后端，否则退回 Mock
pub fn create_backend(llm: &LlmSection) -> Arc<dyn CompletionBackend> {
    let has_key = llm.api_key.is_some() || std::env::var("OPENAI_API_KEY").is_ok();
    if has_key || llm.base_url.is_some() {
        tracing::info!(model = %llm.model, base_url = ?llm.base_url, "Using OpenAI-compatible backend");
        Arc::new(OpenAiBackend::new(llm.base_url.as_deref(), llm.api_key.as_deref()))
    } else {
        tracing::warn!("No API key or base_url set, using Mock LLM");
        Arc::new(MockBackend)
    }
}

pub fn generation_params(llm: &LlmSection) -> GenerationParams {
    GenerationParams {
        model: llm.model.clone(),
        temperature: llm.temperature,
        top_p: llm.top_p,
        max_tokens: llm.max_tokens,
        parallel_tool_calls: llm.parallel_tool_calls,
        response_format: None,
    }
}

/// [embedding].model 未配置时返回 None
pub fn create_embedder(cfg: &AppConfig) -> Option<Arc<dyn EmbeddingProvider>> {
    let model = cfg.embedding.model.as_deref()?;
    let base_url = cfg.embedding.base_url.as_deref().or(cfg.llm.base_url.as_deref());
    tracing::info!(model, "Using embedding model");
    Some(Arc::new(OpenAiEmbedder::new(base_url, model, cfg.llm.api_key.as_deref())))
}

/// "docker" / "socat" 为预设，其余按 argv 解析；未配置返回 None
pub fn gateway_command(gateway: &GatewaySection) -> Option<GatewayCommand> {
    match gateway.command.as_slice() {
        [preset] if preset == "docker" => Some(GatewayCommand::docker_toolkit()),
        [preset] if preset == "socat" => Some(GatewayCommand::socat_toolkit()),
        argv => GatewayCommand::from_argv(argv),
    }
}

fn agent_builder(cfg: &AppConfig) -> AgentBuilder {
    let mut builder = AgentBuilder::new(create_backend(&cfg.llm), generation_params(&cfg.llm))
        .name(cfg.a2a.name.clone());
    if let Some(prompt) = &cfg.llm.system_prompt {
        builder = builder.system_prompt(prompt.clone());
    }
    if let Some(embedder) = create_embedder(cfg) {
        builder = builder.embedder(embedder);
    }
    builder
}

pub fn create_agent(cfg: &AppConfig) -> Agent {
    agent_builder(cfg).build()
}

/// 完整组装：网关连接与发现、记忆索引
pub async fn prepare_agent(cfg: &AppConfig) -> Result<Agent, AgentError> {
    let mut builder = agent_builder(cfg);
    let command = gateway_command(&cfg.gateway);
    if let Some(command) = &command {
        let timeout = cfg.gateway.request_timeout_secs.map(Duration::from_secs);
        tracing::info!(program = %command.program, "Starting tool gateway");
        let gateway = StdioGateway::spawn(command, timeout).await?;
        builder = builder.gateway(Arc::new(gateway));
    }
    let mut agent = builder.build();

    if command.is_some() {
        let tools = agent.load_gateway_tools(&cfg.gateway.tools).await?;
        tracing::info!(tools, "gateway tools loaded");
        if !cfg.gateway.resources.is_empty() {
            agent.load_gateway_resources(&cfg.gateway.resources).await?;
        }
        if !cfg.gateway.prompts.is_empty() {
            agent.load_gateway_prompts(&cfg.gateway.prompts).await?;
        }
    }

    if !cfg.memory.chunks.is_empty() {
        agent.index_memory(&cfg.memory.chunks).await?;
    }
    Ok(agent)
}

/// 由 [a2a] 段生成名片
pub fn agent_card(a2a: &A2aSection) -> AgentCard {
    let skills = a2a
        .skills
        .iter()
        .map(|s| AgentSkill {
            id: s.id.clone(),
            name: s.name.clone(),
            description: s.description.clone(),
        })
        .collect();
    AgentCard::new(&a2a.name, &a2a.description, &a2a.url, &a2a.version).with_skills(skills)
}

/// 以 agent 为模板的任务处理器；带 prompt 的技能注册为改写模板
pub fn task_handler(a2a: &A2aSection, template: Agent) -> AgentTaskHandler {
    a2a.skills
        .iter()
        .filter_map(|s| s.prompt.as_ref().map(|p| (s.id.clone(), p.clone())))
        .fold(AgentTaskHandler::new(template), |handler, (id, prompt)| {
            handler.with_skill_prompt(id, prompt)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_command_presets() {
        let mut section = GatewaySection::default();
        assert!(gateway_command(&section).is_none());

        section.command = vec!["docker".into()];
        assert_eq!(gateway_command(&section), Some(GatewayCommand::docker_toolkit()));

        section.command = vec!["socat".into()];
        assert_eq!(gateway_command(&section), Some(GatewayCommand::socat_toolkit()));

        section.command = vec!["npx".into(), "-y".into(), "mcp-server".into()];
        assert_eq!(gateway_command(&section).map(|c| c.program), Some("npx".to_string()));
    }

    #[test]
    fn test_generation_params_from_config() {
        let llm = LlmSection {
            model: "qwen".into(),
            temperature: Some(0.0),
            parallel_tool_calls: Some(true),
            ..Default::default()
        };
        let params = generation_params(&llm);
        assert_eq!(params.model, "qwen");
        assert_eq!(params.temperature, Some(0.0));
        assert_eq!(params.parallel_tool_calls, Some(true));
    }

    #[tokio::test]
    async fn test_create_agent_with_base_url() {
        let mut cfg = AppConfig::default();
        cfg.llm.base_url = Some("http://localhost:12434/engines/llama.cpp/v1/".into());
        cfg.llm.system_prompt = Some("You are Bob".into());
        cfg.embedding.model = Some("ai/mxbai-embed-large".into());

        let agent = prepare_agent(&cfg).await.unwrap();
        assert_eq!(agent.messages().len(), 1);
        assert!(agent.memory().is_none());
        assert!(agent.gateway().is_none());
    }

    #[tokio::test]
    async fn test_card_and_handler_from_a2a_section() {
        use crate::a2a::{dispatch, TaskRequest};
        use crate::config::A2aSkill;
        use crate::llm::MockBackend;

        let a2a = A2aSection {
            name: "Bob".into(),
            skills: vec![
                A2aSkill {
                    id: "ask_for_something".into(),
                    name: "Ask for something".into(),
                    description: "Answer questions".into(),
                    prompt: None,
                },
                A2aSkill {
                    id: "greetings".into(),
                    name: "Greetings".into(),
                    description: "Say hello".into(),
                    prompt: Some("Greetings to {input}".into()),
                },
            ],
            ..Default::default()
        };
        let card = agent_card(&a2a);
        assert_eq!(card.name, "Bob");
        assert_eq!(card.skills.len(), 2);
        assert_eq!(card.skills[1].id, "greetings");

        let template = AgentBuilder::new(Arc::new(MockBackend), GenerationParams::new("mock")).build();
        let handler = task_handler(&a2a, template);
        let req = TaskRequest::send_message("1", "Sam").with_metadata("skill", "greetings");
        let resp = dispatch(req, &handler).await.unwrap();
        assert_eq!(resp.reply_text(), Some("Echo from Mock: Greetings to Sam"));
    }
}
