//! 工具参数：把模型给出的原始 JSON 文本解析为结构化对象，并按 schema 校验必填字段

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tools::ToolDefinition;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("malformed arguments: {0}")]
    Malformed(String),

    #[error("arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("field '{field}' is not a {expected}")]
    WrongType { field: String, expected: &'static str },
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 已解析的工具参数（JSON 对象）
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolArguments {
    fields: Map<String, Value>,
}

impl ToolArguments {
    /// 解析原始参数文本；顶层必须是对象
    pub fn parse(raw: &str) -> Result<Self, ArgumentError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ArgumentError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ArgumentError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(ArgumentError::NotAnObject(kind_of(&other))),
        }
    }

    /// required 中的字段必须存在且不为 null
    pub fn validate(&self, definition: &ToolDefinition) -> Result<(), ArgumentError> {
        for field in definition.required_fields() {
            match self.fields.get(field) {
                None | Some(Value::Null) => {
                    return Err(ArgumentError::MissingField(field.to_string()))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn str(&self, field: &str) -> Result<&str, ArgumentError> {
        self.typed(field, "string", Value::as_str)
    }

    pub fn f64(&self, field: &str) -> Result<f64, ArgumentError> {
        self.typed(field, "number", Value::as_f64)
    }

    pub fn i64(&self, field: &str) -> Result<i64, ArgumentError> {
        self.typed(field, "integer", Value::as_i64)
    }

    pub fn bool(&self, field: &str) -> Result<bool, ArgumentError> {
        self.typed(field, "boolean", Value::as_bool)
    }

    /// 反序列化为参数结构体
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, ArgumentError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .map_err(|e| ArgumentError::Malformed(e.to_string()))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn typed<'a, T>(
        &'a self,
        field: &str,
        expected: &'static str,
        extract: impl Fn(&'a Value) -> Option<T>,
    ) -> Result<T, ArgumentError> {
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| ArgumentError::MissingField(field.to_string()))?;
        extract(value).ok_or_else(|| ArgumentError::WrongType {
            field: field.to_string(),
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn hello_def() -> ToolDefinition {
        ToolDefinition::new(
            "say_hello",
            "Say hello",
            json!({"type": "object", "properties": {"name": {"type": "string"}}, "required": ["name"]}),
        )
    }

    #[test]
    fn test_parse_object() {
        let args = ToolArguments::parse(r#"{"name": "Bob", "times": 2, "loud": true}"#).unwrap();
        assert_eq!(args.str("name").unwrap(), "Bob");
        assert_eq!(args.i64("times").unwrap(), 2);
        assert_eq!(args.f64("times").unwrap(), 2.0);
        assert!(args.bool("loud").unwrap());
    }

    #[test]
    fn test_parse_rejects_malformed_and_non_object() {
        assert!(matches!(ToolArguments::parse("{name:"), Err(ArgumentError::Malformed(_))));
        assert!(matches!(ToolArguments::parse(""), Err(ArgumentError::Malformed(_))));
        assert_eq!(ToolArguments::parse("[1,2]"), Err(ArgumentError::NotAnObject("array")));
        assert_eq!(ToolArguments::parse("\"x\""), Err(ArgumentError::NotAnObject("string")));
    }

    #[test]
    fn test_validate_required() {
        let def = hello_def();
        assert!(ToolArguments::parse(r#"{"name": "Bob"}"#).unwrap().validate(&def).is_ok());
        assert_eq!(
            ToolArguments::parse("{}").unwrap().validate(&def),
            Err(ArgumentError::MissingField("name".into()))
        );
        assert_eq!(
            ToolArguments::parse(r#"{"name": null}"#).unwrap().validate(&def),
            Err(ArgumentError::MissingField("name".into()))
        );
    }

    #[test]
    fn test_typed_accessor_errors() {
        let args = ToolArguments::parse(r#"{"a": "five"}"#).unwrap();
        assert_eq!(
            args.f64("a"),
            Err(ArgumentError::WrongType { field: "a".into(), expected: "number" })
        );
        assert_eq!(args.f64("b"), Err(ArgumentError::MissingField("b".into())));
    }

    #[test]
    fn test_deserialize_struct() {
        #[derive(Deserialize)]
        struct Add {
            a: f64,
            b: f64,
        }
        let add: Add = ToolArguments::parse(r#"{"a": 5, "b": 3}"#).unwrap().deserialize().unwrap();
        assert_eq!(add.a + add.b, 8.0);
    }
}
