//! LLM 层：完成后端与嵌入的抽象与实现（OpenAI 兼容 / Mock / Scripted）

pub mod embedding;
pub mod mock;
pub mod openai;
pub mod traits;
pub mod types;

pub use embedding::{EmbeddingProvider, OpenAiEmbedder};
pub use mock::{DropFlag, MockBackend, ScriptedBackend, ScriptedEmbedder};
pub use openai::OpenAiBackend;
pub use traits::{ChunkStream, CompletionBackend, LlmError};
pub use types::{
    ChatRequest, ChatResponse, Choice, FunctionCall, GenerationParams, JsonSchemaFormat,
    ResponseFormat, ResponseMessage, StreamChunk, ToolCall, ToolSpec,
};
