//! 记忆层：对话记录（Transcript）、内存向量存储、RAG 检索

pub mod conversation;
pub mod rag;
pub mod vector_store;

pub use conversation::{Message, Role, Transcript};
pub use rag::RagError;
pub use vector_store::{cosine_similarity, MemoryError, MemoryStore, VectorRecord};
