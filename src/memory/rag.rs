//! RAG 记忆：文本 → 嵌入 → 向量存储
//!
//! 配置阶段把源文本块逐条嵌入写入 MemoryStore；查询时把问题嵌入后做相似度检索。
//! 嵌入失败直接上抛，失败的那一块不会写入存储。

use crate::llm::{EmbeddingProvider, LlmError};
use crate::memory::{MemoryError, MemoryStore, VectorRecord};

/// RAG 流水线中的错误：嵌入后端失败或存储拒绝
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RagError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error(transparent)]
    Store(#[from] MemoryError),
}

/// 逐块嵌入并写入；返回写入条数。遇到第一个失败即返回，之前已写入的块保留
pub async fn index_chunks<S: AsRef<str>>(
    store: &mut MemoryStore,
    embedder: &dyn EmbeddingProvider,
    chunks: &[S],
) -> Result<usize, RagError> {
    let mut saved = 0;
    for chunk in chunks {
        let text = chunk.as_ref();
        let embedding = embedder.embed(text).await?;
        store.save(VectorRecord::new(text, embedding))?;
        saved += 1;
    }
    tracing::info!(saved, total = store.len(), "rag memory indexed");
    Ok(saved)
}

async fn embed_query(embedder: &dyn EmbeddingProvider, text: &str) -> Result<VectorRecord, RagError> {
    Ok(VectorRecord::query(embedder.embed(text).await?))
}

/// 检索相似度 >= threshold 的源文本（顺序不作保证）
pub async fn search_text(
    store: &MemoryStore,
    embedder: &dyn EmbeddingProvider,
    text: &str,
    threshold: f32,
) -> Result<Vec<String>, RagError> {
    let query = embed_query(embedder, text).await?;
    Ok(store
        .search_similarities(&query, threshold)?
        .into_iter()
        .map(|r| r.source_text)
        .collect())
}

/// 检索前 n 条（相似度降序）
pub async fn search_text_top_n(
    store: &MemoryStore,
    embedder: &dyn EmbeddingProvider,
    text: &str,
    threshold: f32,
    n: usize,
) -> Result<Vec<VectorRecord>, RagError> {
    let query = embed_query(embedder, text).await?;
    Ok(store.search_top_n(&query, threshold, n)?)
}

/// 把检索结果拼成可放进 system 消息的上下文段落
pub fn format_context(records: &[VectorRecord]) -> String {
    let mut context = String::new();
    for (i, record) in records.iter().enumerate() {
        context.push_str(&format!(
            "[Context {}] (similarity: {:.2})\n{}\n\n",
            i + 1,
            record.similarity,
            record.source_text.trim()
        ));
    }
    context
}
