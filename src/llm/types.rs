//! OpenAI 兼容的请求 / 响应结构
//!
//! 只保留编排层需要的字段：消息、生成参数、工具 schema、choices 与 tool_calls、流式 delta。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::Message;
use crate::tools::ToolDefinition;

fn default_call_type() -> String {
    "function".to_string()
}

/// 模型在响应中请求的函数调用（name + 原始 JSON 字符串参数）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// 未解析的参数（模型生成的 JSON 文本）
    #[serde(default)]
    pub arguments: String,
}

/// 单个工具调用：仅由完成后端产生，调用方不应自行构造
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "default_call_type")]
    pub kind: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: default_call_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    pub fn raw_arguments(&self) -> &str {
        &self.function.arguments
    }
}

/// 请求中的工具描述：`{"type": "function", "function": {...}}`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolDefinition,
}

impl From<&ToolDefinition> for ToolSpec {
    fn from(def: &ToolDefinition) -> Self {
        Self {
            kind: default_call_type(),
            function: def.clone(),
        }
    }
}

/// 结构化输出：`response_format = {"type": "json_schema", "json_schema": {...}}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema { json_schema: JsonSchemaFormat },
}

/// 生成参数：随 Agent 配置保存，每次请求复制进 ChatRequest
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub parallel_tool_calls: Option<bool>,
    pub response_format: Option<ResponseFormat>,
}

impl GenerationParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = Some(enabled);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// 发往 /chat/completions 的请求体
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(params: &GenerationParams, messages: &[Message]) -> Self {
        Self {
            model: params.model.clone(),
            messages: messages.to_vec(),
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
            tools: Vec::new(),
            // 未附带工具时不能发送 parallel_tool_calls（部分后端会拒绝）
            parallel_tool_calls: None,
            response_format: params.response_format.clone(),
            stream: false,
        }
    }

    pub fn with_tools(mut self, tools: &[ToolDefinition], parallel: Option<bool>) -> Self {
        self.tools = tools.iter().map(ToolSpec::from).collect();
        if !self.tools.is_empty() {
            self.parallel_tool_calls = parallel;
        }
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// 非流式响应中的 assistant 消息
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

/// /chat/completions 非流式响应
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// 测试与 Mock 用：单个 choice，纯文本内容
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: Some(content.into()),
                    tool_calls: None,
                },
                finish_reason: Some("stop".to_string()),
                ..Default::default()
            }],
            usage: None,
        }
    }

    /// 测试与 Mock 用：单个 choice，携带工具调用
    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            choices: vec![Choice {
                message: ResponseMessage {
                    content: None,
                    tool_calls: Some(calls),
                },
                finish_reason: Some("tool_calls".to_string()),
                ..Default::default()
            }],
            usage: None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

/// 流式响应的一个增量
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

impl StreamChunk {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            choices: vec![ChunkChoice {
                delta: ChunkDelta {
                    content: Some(content.into()),
                },
            }],
        }
    }

    /// 首个 choice 的非空 delta 内容
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_tools_when_empty() {
        let params = GenerationParams::new("qwen").with_parallel_tool_calls(true);
        let req = ChatRequest::new(&params, &[Message::user("hi")])
            .with_tools(&[], params.parallel_tool_calls);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("tools").is_none());
        assert!(v.get("parallel_tool_calls").is_none());
        assert!(v.get("stream").is_none());
        assert_eq!(v["messages"][0]["role"], "user");
    }

    #[test]
    fn test_request_with_tools_and_schema_format() {
        let def = ToolDefinition::new(
            "say_hello",
            "Say hello to the given person name",
            json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}),
        );
        let params = GenerationParams::new("qwen")
            .with_temperature(0.0)
            .with_parallel_tool_calls(true)
            .with_response_format(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: "search_results".into(),
                    description: None,
                    schema: json!({"type": "array"}),
                    strict: Some(true),
                },
            });
        let req = ChatRequest::new(&params, &[]).with_tools(&[def], params.parallel_tool_calls).streaming();
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["tools"][0]["type"], "function");
        assert_eq!(v["tools"][0]["function"]["name"], "say_hello");
        assert_eq!(v["parallel_tool_calls"], true);
        assert_eq!(v["response_format"]["type"], "json_schema");
        assert_eq!(v["response_format"]["json_schema"]["strict"], true);
        assert_eq!(v["stream"], true);
    }

    #[test]
    fn test_response_with_tool_calls_deserializes() {
        let raw = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "add", "arguments": "{\"a\":5,\"b\":3}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        });
        let resp: ChatResponse = serde_json::from_value(raw).unwrap();
        let calls = resp.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].name(), "add");
        assert_eq!(calls[0].raw_arguments(), "{\"a\":5,\"b\":3}");
        assert_eq!(resp.usage.unwrap().prompt_tokens, 10);
    }

    #[test]
    fn test_stream_chunk_content_skips_empty() {
        let chunk: StreamChunk =
            serde_json::from_value(json!({"choices": [{"delta": {"content": ""}}]})).unwrap();
        assert_eq!(chunk.content(), None);
        let chunk: StreamChunk = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(chunk.content(), None);
        assert_eq!(StreamChunk::text("Hel").content(), Some("Hel"));
    }
}
