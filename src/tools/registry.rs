//! 工具注册表（本地函数表）
//!
//! 所有本地工具实现 Tool trait（name / description / parameters_schema / execute），
//! 由 ToolRegistry 按名注册与精确查找；执行引擎按工具调用的 name 在此处取实现。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{ToolArguments, ToolDefinition};

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（与模型返回的 function.name 精确匹配）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema；默认无参数
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具；Err 中的文本会作为该调用的结果记录
    async fn execute(&self, args: ToolArguments) -> Result<String, String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.parameters_schema())
    }
}

type ToolFn = dyn Fn(ToolArguments) -> Result<Value, String> + Send + Sync;

/// 闭包工具：把同步函数包装成 Tool
pub struct FnTool {
    definition: ToolDefinition,
    func: Box<ToolFn>,
}

impl FnTool {
    pub fn new<F>(definition: ToolDefinition, func: F) -> Self
    where
        F: Fn(ToolArguments) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            definition,
            func: Box::new(func),
        }
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    fn parameters_schema(&self) -> Value {
        self.definition.parameters.clone()
    }

    async fn execute(&self, args: ToolArguments) -> Result<String, String> {
        (self.func)(args).map(|v| stringify_result(&v))
    }

    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }
}

/// 结果转文本：字符串原样输出，其它 JSON 值用紧凑表示
pub fn stringify_result(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，保留注册顺序
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.order).finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同名注册会替换旧实现
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), Arc::new(tool)).is_none() {
            self.order.push(name);
        }
    }

    pub fn register_fn<F>(&mut self, definition: ToolDefinition, func: F)
    where
        F: Fn(ToolArguments) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.register(FnTool::new(definition, func));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub async fn execute(&self, name: &str, args: ToolArguments) -> Result<String, String> {
        let tool = self.tools.get(name).ok_or_else(|| format!("Unknown tool: {name}"))?;
        tool.execute(args).await
    }

    /// 按注册顺序
    pub fn tool_names(&self) -> Vec<String> {
        self.order.clone()
    }

    /// 全部工具定义（按注册顺序），可直接交给 Agent 附带到请求中
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
