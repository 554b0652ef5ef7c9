//! 工具调用周期：detect（请求模型给出工具调用）→ resolve（本地注册表或远程网关执行）
//!
//! detect 成功后把携带调用的 assistant 消息追加到对话记录，使后续 tool 消息与追问请求合法。
//! resolve 只接受 Detected 阶段的批次，同一批次不会被执行两次；逐条策略见 tools/executor.rs。

use crate::core::agent::Agent;
use crate::core::{AgentError, CyclePhase};
use crate::llm::ToolCall;
use crate::memory::Message;
use crate::tools::{call_log, executor, ToolRegistry};

impl Agent {
    /// 附带工具定义请求一次完成，记录模型给出的工具调用
    pub async fn detect_tool_calls(&mut self) -> Result<&[ToolCall], AgentError> {
        self.batch.discard();

        let request = self
            .request()
            .with_tools(&self.tools, self.params.parallel_tool_calls);
        tracing::debug!(tools = request.tools.len(), "detecting tool calls");
        let response = self.backend.complete(request).await?;
        let choice = response.choices.into_iter().next().ok_or(AgentError::NoChoices)?;
        let calls = choice.message.tool_calls.unwrap_or_default();
        if calls.is_empty() {
            return Err(AgentError::NoToolCallsDetected);
        }

        tracing::info!(
            count = calls.len(),
            tools = ?calls.iter().map(ToolCall::name).collect::<Vec<_>>(),
            "tool calls detected"
        );
        self.transcript.push(Message::assistant_tool_calls(calls.clone()));
        self.batch.replace(calls);
        Ok(self.batch.calls())
    }

    /// 用本地注册表执行当前批次
    pub async fn execute_tool_calls(&mut self, registry: &ToolRegistry) -> Result<Vec<String>, AgentError> {
        let calls = self.pending_calls()?;
        let result = executor::resolve_local(&calls, registry, &mut self.transcript).await;
        self.end_cycle();
        result
    }

    /// 通过网关执行当前批次
    pub async fn execute_gateway_tool_calls(&mut self) -> Result<Vec<String>, AgentError> {
        let gateway = self.gateway.clone().ok_or(AgentError::GatewayNotConfigured)?;
        let calls = self.pending_calls()?;
        let result =
            executor::resolve_remote(&calls, gateway.as_ref(), &self.tools, &mut self.transcript).await;
        self.end_cycle();
        result
    }

    /// 当前批次的调用日志（JSON，4 空格缩进；空批次为 "[]"），参数不是合法 JSON 时报错
    pub fn tool_calls_json(&self) -> Result<String, serde_json::Error> {
        call_log::to_json(self.batch.calls())
    }

    fn pending_calls(&self) -> Result<Vec<ToolCall>, AgentError> {
        if self.batch.phase() != CyclePhase::Detected {
            return Err(AgentError::NoPendingToolCalls);
        }
        Ok(self.batch.calls().to_vec())
    }

    fn end_cycle(&mut self) {
        self.batch.mark_resolved();
        tracing::debug!(calls = self.batch.calls().len(), "tool calls resolved");
        self.batch.finish();
    }
}
