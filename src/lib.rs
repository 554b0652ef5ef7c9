//! Drone - 轻量智能体编排层
//!
//! 模块划分：
//! - **a2a**: agent-to-agent 任务协议（类型、分派、客户端；feature `a2a` 提供 axum 服务端）
//! - **agent**: 按配置组装 Agent（后端、网关、记忆、A2A 名片）
//! - **config**: 应用配置加载（TOML + 环境变量 DRONE__*）
//! - **core**: Agent、完成编排（阻塞 / 流式）、工具调用循环、错误
//! - **gateway**: 远程工具网关（stdio JSON-RPC）与工具 / 资源 / 提示词发现
//! - **llm**: 完成后端与嵌入抽象（OpenAI 兼容 / Mock / Scripted）
//! - **memory**: 对话记录、内存向量存储与 RAG 检索
//! - **observability**: tracing 日志初始化
//! - **tools**: 本地工具注册表、参数解析与执行引擎

pub mod a2a;
pub mod agent;
pub mod config;
pub mod core;
pub mod gateway;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod tools;

pub use crate::agent::{create_agent, prepare_agent};
pub use crate::core::{Agent, AgentBuilder, AgentError};
