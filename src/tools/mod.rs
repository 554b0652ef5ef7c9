//! 工具层：定义、参数、本地注册表、执行器与调用日志

pub mod arguments;
pub mod call_log;
pub mod definition;
pub mod executor;
pub mod registry;

pub use arguments::{ArgumentError, ToolArguments};
pub use definition::ToolDefinition;
pub use executor::{resolve_local, resolve_remote};
pub use registry::{stringify_result, FnTool, Tool, ToolRegistry};
