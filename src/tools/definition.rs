//! 工具定义：名称、描述、参数 JSON Schema
//!
//! 参数 schema 统一为 `{"type": "object", "properties": {...}, "required": [...]}`；
//! 可手写，可由 schemars 从参数结构体生成，也可由网关的 inputSchema 转换而来。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object_schema")]
    pub parameters: Value,
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}, "required": []})
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// 无参数工具
    pub fn without_parameters(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, empty_object_schema())
    }

    /// 由参数结构体生成 schema（去掉 $schema / title 等根级元数据）
    pub fn from_schema<T: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        let schema = serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| empty_object_schema());
        Self::new(name, description, object_schema(&schema))
    }

    /// schema 中 required 列出的字段名
    pub fn required_fields(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// 取任意 schema 的 properties / required（及 definitions），包成 object 类型
pub(crate) fn object_schema(schema: &Value) -> Value {
    let mut out = Map::new();
    out.insert("type".into(), Value::String("object".into()));
    out.insert(
        "properties".into(),
        schema.get("properties").cloned().unwrap_or_else(|| json!({})),
    );
    out.insert(
        "required".into(),
        schema.get("required").cloned().unwrap_or_else(|| json!([])),
    );
    if let Some(defs) = schema.get("definitions") {
        out.insert("definitions".into(), defs.clone());
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    #[derive(JsonSchema)]
    struct AddArgs {
        /// 左操作数
        a: f64,
        b: f64,
        note: Option<String>,
    }

    #[test]
    fn test_from_schema_keeps_properties_and_required() {
        let def = ToolDefinition::from_schema::<AddArgs>("add", "Add two numbers");
        assert_eq!(def.parameters["type"], "object");
        assert!(def.parameters["properties"].get("a").is_some());
        assert!(def.parameters.get("$schema").is_none());
        let mut required = def.required_fields();
        required.sort();
        assert_eq!(required, vec!["a", "b"]);
    }

    #[test]
    fn test_object_schema_defaults() {
        let schema = object_schema(&json!({"type": "object"}));
        assert_eq!(schema, json!({"type": "object", "properties": {}, "required": []}));
        assert!(ToolDefinition::without_parameters("ping", "").required_fields().is_empty());
    }
}
