//! 核心编排层：Agent 聚合、完成编排、工具调用周期、错误类型

pub mod agent;
pub mod builder;
pub mod completion;
pub mod error;
pub mod state;
pub mod tool_cycle;

pub use agent::{Agent, ResolvedPrompt, ResourceText};
pub use builder::AgentBuilder;
pub use completion::{StreamEnd, StreamOutcome};
pub use error::AgentError;
pub use state::{CyclePhase, ToolCallBatch};
