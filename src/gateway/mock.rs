//! 进程内脚本网关（测试用）：按工具名查表返回结果，并记录每次调用

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::gateway::{
    CallToolResult, GatewayError, GatewayTool, GetPromptResult, Prompt, Resource, ResourceContents,
    ToolGateway,
};

#[derive(Debug, Default)]
pub struct ScriptedGateway {
    tools: Vec<GatewayTool>,
    results: HashMap<String, Result<CallToolResult, GatewayError>>,
    resources: Vec<Resource>,
    contents: HashMap<String, Vec<ResourceContents>>,
    prompts: Vec<Prompt>,
    prompt_results: HashMap<String, GetPromptResult>,
    calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(mut self, tools: Vec<GatewayTool>) -> Self {
        self.tools = tools;
        self
    }

    /// 同一工具每次调用都返回同一结果
    pub fn with_result(mut self, tool: impl Into<String>, result: Result<CallToolResult, GatewayError>) -> Self {
        self.results.insert(tool.into(), result);
        self
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_contents(mut self, uri: impl Into<String>, contents: Vec<ResourceContents>) -> Self {
        self.contents.insert(uri.into(), contents);
        self
    }

    pub fn with_prompts(mut self, prompts: Vec<Prompt>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_prompt_result(mut self, name: impl Into<String>, result: GetPromptResult) -> Self {
        self.prompt_results.insert(name.into(), result);
        self
    }

    /// 已收到的 (工具名, 参数)，按调用顺序
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

fn not_found(what: &str, key: &str) -> GatewayError {
    GatewayError::Rpc {
        code: -32602,
        message: format!("unknown {what}: {key}"),
    }
}

#[async_trait]
impl ToolGateway for ScriptedGateway {
    async fn list_tools(&self) -> Result<Vec<GatewayTool>, GatewayError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, GatewayError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((name.to_string(), arguments));
        self.results
            .get(name)
            .cloned()
            .unwrap_or_else(|| Err(not_found("tool", name)))
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, GatewayError> {
        Ok(self.resources.clone())
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContents>, GatewayError> {
        self.contents
            .get(uri)
            .cloned()
            .ok_or_else(|| not_found("resource", uri))
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>, GatewayError> {
        Ok(self.prompts.clone())
    }

    async fn get_prompt(
        &self,
        name: &str,
        _arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, GatewayError> {
        self.prompt_results
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("prompt", name))
    }
}
