//! 工具执行器
//!
//! 依次执行一批工具调用，把结果折叠回对话记录：成功的调用追加一条 tool 消息（携带调用 id）。
//! 本地与远程两条路径的失败策略不同：
//! - 本地：找不到实现或参数无效立即中止；工具自身返回的错误记入输出，不写对话记录
//! - 远程：参数无效立即中止；网关调用失败记入输出并继续；响应首块不是非空文本则跳过
//!
//! 每次调用输出结构化审计日志（JSON）。

use std::time::Instant;

use crate::core::AgentError;
use crate::gateway::ToolGateway;
use crate::llm::ToolCall;
use crate::memory::{Message, Transcript};
use crate::tools::{ToolArguments, ToolDefinition, ToolRegistry};

/// 依次执行本地工具；返回每次调用的输出文本
pub async fn resolve_local(
    calls: &[ToolCall],
    registry: &ToolRegistry,
    transcript: &mut Transcript,
) -> Result<Vec<String>, AgentError> {
    let mut outputs = Vec::with_capacity(calls.len());
    for call in calls {
        let tool = registry
            .get(call.name())
            .ok_or_else(|| AgentError::ToolNotImplemented(call.name().to_string()))?;
        let args = parse_arguments(call, Some(&tool.definition()))?;

        let start = Instant::now();
        let result = tool.execute(args).await;
        audit(call, result.is_ok(), if result.is_ok() { "ok" } else { "error" }, start);

        match result {
            Ok(content) => {
                transcript.push(Message::tool(call.id.clone(), content.clone()));
                outputs.push(content);
            }
            Err(e) => {
                tracing::warn!(tool = %call.name(), call_id = %call.id, error = %e, "local tool failed");
                outputs.push(e);
            }
        }
    }
    if outputs.is_empty() {
        return Err(AgentError::NoToolResponses);
    }
    Ok(outputs)
}

/// 依次通过网关执行；definitions 为发现阶段得到的工具定义，用于校验必填参数
pub async fn resolve_remote(
    calls: &[ToolCall],
    gateway: &dyn ToolGateway,
    definitions: &[ToolDefinition],
    transcript: &mut Transcript,
) -> Result<Vec<String>, AgentError> {
    let mut outputs = Vec::with_capacity(calls.len());
    for call in calls {
        let definition = definitions.iter().find(|d| d.name == call.name());
        let args = parse_arguments(call, definition)?;

        let start = Instant::now();
        match gateway.call_tool(call.name(), args.into_value()).await {
            Err(e) => {
                audit(call, false, "error", start);
                tracing::warn!(tool = %call.name(), call_id = %call.id, error = %e, "gateway call failed");
                outputs.push(e.to_string());
            }
            Ok(result) => match result.first_text() {
                Some(text) => {
                    audit(call, !result.is_error, if result.is_error { "tool_error" } else { "ok" }, start);
                    transcript.push(Message::tool(call.id.clone(), text));
                    outputs.push(text.to_string());
                }
                None => {
                    audit(call, !result.is_error, "no_text", start);
                    tracing::debug!(tool = %call.name(), call_id = %call.id, "gateway result has no text content");
                }
            },
        }
    }
    if outputs.is_empty() {
        return Err(AgentError::NoToolResponses);
    }
    Ok(outputs)
}

fn parse_arguments(call: &ToolCall, definition: Option<&ToolDefinition>) -> Result<ToolArguments, AgentError> {
    let invalid = |source| AgentError::InvalidArguments {
        tool: call.name().to_string(),
        source,
    };
    let args = ToolArguments::parse(call.raw_arguments()).map_err(invalid)?;
    if let Some(def) = definition {
        args.validate(def).map_err(invalid)?;
    }
    Ok(args)
}

fn audit(call: &ToolCall, ok: bool, outcome: &str, start: Instant) {
    let audit = serde_json::json!({
        "event": "tool_audit",
        "tool": call.name(),
        "call_id": call.id,
        "ok": ok,
        "outcome": outcome,
        "duration_ms": start.elapsed().as_millis() as u64,
        "args_preview": args_preview(call.raw_arguments()),
    });
    tracing::info!(audit = %audit, "tool");
}

fn args_preview(raw: &str) -> String {
    if raw.chars().count() > 200 {
        format!("{}...", raw.chars().take(200).collect::<String>())
    } else {
        raw.to_string()
    }
}
