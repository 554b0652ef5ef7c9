//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `DRONE__*` 覆盖（双下划线表示嵌套，如 `DRONE__LLM__MODEL=qwen2.5`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub embedding: EmbeddingSection,
    pub gateway: GatewaySection,
    pub memory: MemorySection,
    pub a2a: A2aSection,
}

/// [llm] 段：OpenAI 兼容端点与生成参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 未设置时使用 OpenAI 官方端点
    pub base_url: Option<String>,
    pub model: String,
    /// 未设置时读取 OPENAI_API_KEY
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub parallel_tool_calls: Option<bool>,
    pub system_prompt: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: None,
            model: default_model(),
            api_key: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            parallel_tool_calls: None,
            system_prompt: None,
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [embedding] 段；model 为空表示不启用 RAG 记忆
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    pub model: Option<String>,
    /// 未设置时沿用 [llm].base_url
    pub base_url: Option<String>,
}

/// [gateway] 段：远程工具网关的启动命令与白名单
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// argv；可用预设 "docker" / "socat"，为空表示不启用网关
    pub command: Vec<String>,
    /// 空表示全部保留
    pub tools: Vec<String>,
    pub resources: Vec<String>,
    pub prompts: Vec<String>,
    /// 单次网关请求超时（秒）；不设置则不限时
    pub request_timeout_secs: Option<u64>,
}

/// [memory] 段：检索阈值与条数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemorySection {
    pub threshold: f32,
    pub top_n: usize,
    /// 启动时嵌入的文本块
    pub chunks: Vec<String>,
}

impl Default for MemorySection {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            top_n: 3,
            chunks: Vec::new(),
        }
    }
}

/// [a2a] 段：Agent Card 与监听地址
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct A2aSection {
    pub name: String,
    pub description: String,
    pub url: String,
    pub version: String,
    pub bind: String,
    pub skills: Vec<A2aSkill>,
}

impl Default for A2aSection {
    fn default() -> Self {
        Self {
            name: "drone".to_string(),
            description: "A simple A2A agent server".to_string(),
            url: "http://localhost:8080".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bind: "0.0.0.0:8080".to_string(),
            skills: Vec::new(),
        }
    }
}

/// [[a2a.skills]]；prompt 可选，`{input}` 会被替换为用户输入
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct A2aSkill {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt: Option<String>,
}

/// 从 config 目录加载配置，环境变量 DRONE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 DRONE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("DRONE")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
