//! 工具调用日志格式
//!
//! `[{"id": ..., "function": {"name": ..., "arguments": {...}}}]`，arguments 为解析后的对象而非字符串，
//! 4 空格缩进，便于诊断输出。from_json 还原出同一组调用：id、name 与解析后的参数相同，
//! 参数原文的空白与键序不保留。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolCall;

#[derive(Serialize, Deserialize)]
struct LoggedFunction {
    name: String,
    arguments: Value,
}

#[derive(Serialize, Deserialize)]
struct LoggedCall {
    id: String,
    function: LoggedFunction,
}

/// 序列化调用批次；空批次返回 "[]"。参数不是合法 JSON 时报错
pub fn to_json(calls: &[ToolCall]) -> Result<String, serde_json::Error> {
    if calls.is_empty() {
        return Ok("[]".to_string());
    }
    let logged = calls
        .iter()
        .map(|call| {
            Ok(LoggedCall {
                id: call.id.clone(),
                function: LoggedFunction {
                    name: call.function.name.clone(),
                    arguments: serde_json::from_str(&call.function.arguments)?,
                },
            })
        })
        .collect::<Result<Vec<_>, serde_json::Error>>()?;

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    logged.serialize(&mut ser)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

/// 从日志还原调用；arguments 重新编码为紧凑 JSON 文本
pub fn from_json(json: &str) -> Result<Vec<ToolCall>, serde_json::Error> {
    let logged: Vec<LoggedCall> = serde_json::from_str(json)?;
    logged
        .into_iter()
        .map(|call| {
            Ok(ToolCall::new(
                call.id,
                call.function.name,
                serde_json::to_string(&call.function.arguments)?,
            ))
        })
        .collect()
}
