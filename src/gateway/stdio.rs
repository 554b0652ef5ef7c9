//! 基于子进程 stdin/stdout 的 JSON-RPC 2.0 网关
//!
//! 每条消息占一行（换行分隔）。建立连接后先 `initialize`，再发 `notifications/initialized`。
//! 同一通道同一时刻只有一个未完成的请求：整个"写请求 + 读到匹配 id 的响应"在一把异步锁内完成；
//! 读到的通知或 id 不匹配的行直接跳过。子进程随网关一起 drop 时被 kill。

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::gateway::{
    CallToolResult, GatewayCommand, GatewayError, GatewayTool, GetPromptResult, Prompt, Resource,
    ResourceContents, ToolGateway,
};

pub const PROTOCOL_VERSION: &str = "2025-03-26";

struct Channel {
    writer: Box<dyn AsyncWrite + Send + Unpin>,
    reader: Box<dyn AsyncBufRead + Send + Unpin>,
}

impl Channel {
    async fn send(&mut self, msg: &Value) -> Result<(), GatewayError> {
        let mut line = serde_json::to_string(msg).map_err(|e| GatewayError::Protocol(e.to_string()))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn recv(&mut self, id: u64) -> Result<Value, GatewayError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line).await? == 0 {
                return Err(GatewayError::Closed);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let parsed: Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping non-JSON line from gateway");
                    continue;
                }
            };
            match parsed.get("id").and_then(Value::as_u64) {
                Some(got) if got == id => return Ok(parsed),
                Some(got) => tracing::debug!(expected = id, got, "skipping stale gateway response"),
                None => tracing::debug!(method = ?parsed.get("method"), "gateway notification"),
            }
        }
    }
}

/// JSON-RPC 网关客户端
pub struct StdioGateway {
    channel: Mutex<Channel>,
    next_id: AtomicU64,
    timeout: Option<Duration>,
    child: Option<Child>,
}

impl std::fmt::Debug for StdioGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdioGateway")
            .field("timeout", &self.timeout)
            .field("spawned", &self.child.is_some())
            .finish()
    }
}

impl StdioGateway {
    /// 启动子进程并完成握手
    pub async fn spawn(command: &GatewayCommand, timeout: Option<Duration>) -> Result<Self, GatewayError> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| GatewayError::Spawn(format!("{}: {e}", command.program)))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| GatewayError::Spawn("missing stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GatewayError::Spawn("missing stdout".to_string()))?;

        tracing::info!(program = %command.program, args = ?command.args, "gateway process spawned");
        let gateway = Self::from_parts(stdin, BufReader::new(stdout), timeout, Some(child));
        gateway.initialize().await?;
        Ok(gateway)
    }

    /// 在任意读写流上建立连接并完成握手
    pub async fn connect<W, R>(writer: W, reader: R, timeout: Option<Duration>) -> Result<Self, GatewayError>
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        let gateway = Self::from_parts(writer, reader, timeout, None);
        gateway.initialize().await?;
        Ok(gateway)
    }

    fn from_parts<W, R>(writer: W, reader: R, timeout: Option<Duration>, child: Option<Child>) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            channel: Mutex::new(Channel {
                writer: Box::new(writer),
                reader: Box::new(reader),
            }),
            next_id: AtomicU64::new(1),
            timeout,
            child,
        }
    }

    async fn initialize(&self) -> Result<(), GatewayError> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION")
                    }
                }),
            )
            .await?;
        tracing::debug!(server = ?result.get("serverInfo"), "gateway initialized");

        let note = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        self.channel.lock().await.send(&note).await
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, GatewayError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let msg = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        let exchange = async {
            let mut channel = self.channel.lock().await;
            channel.send(&msg).await?;
            channel.recv(id).await
        };
        let resp = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| GatewayError::Timeout(limit))??,
            None => exchange.await?,
        };

        if let Some(err) = resp.get("error") {
            return Err(GatewayError::Rpc {
                code: err.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }
        resp.get("result")
            .cloned()
            .ok_or_else(|| GatewayError::Protocol(format!("missing result in {method}")))
    }

    async fn request_as<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, GatewayError> {
        let result = self.request(method, params).await?;
        serde_json::from_value(result).map_err(|e| GatewayError::Protocol(format!("{method}: {e}")))
    }

    /// 按 nextCursor 翻页直到取完；key 为结果中的数组字段名
    async fn list_all<T: DeserializeOwned>(&self, method: &str, key: &str) -> Result<Vec<T>, GatewayError> {
        let mut out = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = match &cursor {
                Some(c) => json!({"cursor": c}),
                None => json!({}),
            };
            let mut result = self.request(method, params).await?;
            match result.get_mut(key).map(Value::take) {
                None | Some(Value::Null) => {}
                Some(items) => {
                    let page: Vec<T> = serde_json::from_value(items)
                        .map_err(|e| GatewayError::Protocol(format!("{method}: {e}")))?;
                    out.extend(page);
                }
            }
            match result.get("nextCursor").and_then(Value::as_str).map(str::to_string) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl ToolGateway for StdioGateway {
    async fn list_tools(&self) -> Result<Vec<GatewayTool>, GatewayError> {
        self.list_all("tools/list", "tools").await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, GatewayError> {
        self.request_as("tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, GatewayError> {
        self.list_all("resources/list", "resources").await
    }

    async fn read_resource(&self, uri: &str) -> Result<Vec<ResourceContents>, GatewayError> {
        #[derive(Deserialize)]
        struct ReadResult {
            #[serde(default)]
            contents: Vec<ResourceContents>,
        }
        let result: ReadResult = self.request_as("resources/read", json!({"uri": uri})).await?;
        Ok(result.contents)
    }

    async fn list_prompts(&self) -> Result<Vec<Prompt>, GatewayError> {
        self.list_all("prompts/list", "prompts").await
    }

    async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, GatewayError> {
        self.request_as("prompts/get", json!({"name": name, "arguments": arguments}))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{split, DuplexStream};

    /// 进程内假网关：按 method 返回固定结果
    async fn serve(stream: DuplexStream) {
        let (r, mut w) = split(stream);
        let mut lines = BufReader::new(r).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let req: Value = serde_json::from_str(&line).unwrap();
            let Some(id) = req.get("id").cloned() else {
                continue;
            };
            let result = match req["method"].as_str().unwrap() {
                "initialize" => json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {"tools": {}},
                    "serverInfo": {"name": "fake", "version": "0.0.1"}
                }),
                "tools/list" if req["params"]["cursor"].is_null() => json!({
                    "tools": [{"name": "add", "inputSchema": {"type": "object", "properties": {}}}],
                    "nextCursor": "page-2"
                }),
                "tools/list" => json!({"tools": [{"name": "echo", "description": "Echo"}]}),
                "tools/call" if req["params"]["name"] == "slow" => continue,
                "tools/call" => {
                    // 响应前先推送一条通知，客户端应跳过
                    w.write_all(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\"}\n")
                        .await
                        .unwrap();
                    json!({"content": [{"type": "text", "text": format!("{}", req["params"]["arguments"])}]})
                }
                "resources/read" => json!({
                    "contents": [{"uri": req["params"]["uri"], "mimeType": "text/plain", "text": "hello"}]
                }),
                "prompts/get" => json!({
                    "messages": [{"role": "user", "content": {"type": "text", "text": req["params"]["arguments"]["name"]}}]
                }),
                _ => {
                    let resp = json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "Method not found"}});
                    w.write_all(format!("{resp}\n").as_bytes()).await.unwrap();
                    continue;
                }
            };
            let resp = json!({"jsonrpc": "2.0", "id": id, "result": result});
            w.write_all(format!("{resp}\n").as_bytes()).await.unwrap();
        }
    }

    async fn connected(timeout: Option<Duration>) -> StdioGateway {
        let (client, server) = tokio::io::duplex(8192);
        tokio::spawn(serve(server));
        let (r, w) = split(client);
        StdioGateway::connect(w, BufReader::new(r), timeout).await.unwrap()
    }

    #[tokio::test]
    async fn test_list_tools_follows_cursor() {
        let gateway = connected(None).await;
        let tools = gateway.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["add", "echo"]);
        assert_eq!(tools[1].description.as_deref(), Some("Echo"));
    }

    #[tokio::test]
    async fn test_call_tool_skips_notifications() {
        let gateway = connected(None).await;
        let result = gateway.call_tool("add", json!({"a": 1})).await.unwrap();
        assert_eq!(result.first_text(), Some(r#"{"a":1}"#));
    }

    #[tokio::test]
    async fn test_resources_and_prompts() {
        let gateway = connected(None).await;
        let contents = gateway.read_resource("file:///notes.txt").await.unwrap();
        assert_eq!(contents[0].uri, "file:///notes.txt");
        assert_eq!(contents[0].text.as_deref(), Some("hello"));

        let args = HashMap::from([("name".to_string(), "Bob".to_string())]);
        let prompt = gateway.get_prompt("greet", args).await.unwrap();
        assert_eq!(prompt.messages[0].content.text, "Bob");
    }

    #[tokio::test]
    async fn test_rpc_error_is_reported() {
        let gateway = connected(None).await;
        let err = gateway.list_prompts().await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rpc {
                code: -32601,
                message: "Method not found".into()
            }
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let gateway = connected(Some(Duration::from_millis(50))).await;
        let err = gateway.call_tool("slow", json!({})).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_closed_channel() {
        let (client, server) = tokio::io::duplex(1024);
        drop(server);
        let (r, w) = split(client);
        let err = StdioGateway::connect(w, BufReader::new(r), None).await.unwrap_err();
        assert!(matches!(err, GatewayError::Closed | GatewayError::Io(_)));
    }
}
