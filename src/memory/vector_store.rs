//! 内存向量存储
//!
//! 按 id 存放 VectorRecord，提供余弦相似度过滤与 Top-N 检索。进程内、无持久化，进程退出即丢弃。

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 向量存储错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("Empty embedding")]
    EmptyEmbedding,

    #[error("Embedding dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

/// 一条向量记录：源文本 + 嵌入向量；similarity 仅在检索结果中有意义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// 为空时由 save 分配 UUID
    #[serde(default)]
    pub id: String,
    pub source_text: String,
    pub embedding: Vec<f32>,
    #[serde(skip)]
    pub similarity: f32,
}

impl VectorRecord {
    pub fn new(source_text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: String::new(),
            source_text: source_text.into(),
            embedding,
            similarity: 0.0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// 只带向量的查询记录
    pub fn query(embedding: Vec<f32>) -> Self {
        Self::new(String::new(), embedding)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    record: VectorRecord,
    /// 首次插入序号，Top-N 同分时按它升序
    seq: u64,
}

/// id → 记录；维度由第一条写入的记录确定
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Entry>,
    dimension: Option<usize>,
    next_seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入或按 id 覆盖；返回带 id 的已存记录
    pub fn save(&mut self, mut record: VectorRecord) -> Result<VectorRecord, MemoryError> {
        if record.embedding.is_empty() {
            return Err(MemoryError::EmptyEmbedding);
        }
        self.check_dimension(record.embedding.len())?;
        if record.id.is_empty() {
            record.id = uuid::Uuid::new_v4().to_string();
        }
        record.similarity = 0.0;

        let seq = match self.entries.get(&record.id) {
            Some(existing) => existing.seq,
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                seq
            }
        };
        self.dimension.get_or_insert(record.embedding.len());
        self.entries.insert(
            record.id.clone(),
            Entry {
                record: record.clone(),
                seq,
            },
        );
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Option<&VectorRecord> {
        self.entries.get(id).map(|e| &e.record)
    }

    /// 全部记录，按插入顺序
    pub fn all(&self) -> Vec<VectorRecord> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.record.clone()).collect()
    }

    /// 相似度 >= threshold 的记录（带 similarity），顺序不作保证
    pub fn search_similarities(
        &self,
        query: &VectorRecord,
        threshold: f32,
    ) -> Result<Vec<VectorRecord>, MemoryError> {
        Ok(self
            .scored(query, threshold)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// 过滤后按相似度降序取前 n 条；同分按插入先后
    pub fn search_top_n(
        &self,
        query: &VectorRecord,
        threshold: f32,
        n: usize,
    ) -> Result<Vec<VectorRecord>, MemoryError> {
        let mut scored = self.scored(query, threshold)?;
        scored.sort_by(|(seq_a, a), (seq_b, b)| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });
        scored.truncate(n);
        Ok(scored.into_iter().map(|(_, record)| record).collect())
    }

    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn check_dimension(&self, found: usize) -> Result<(), MemoryError> {
        match self.dimension {
            Some(expected) if expected != found => {
                Err(MemoryError::DimensionMismatch { expected, found })
            }
            _ => Ok(()),
        }
    }

    fn scored(
        &self,
        query: &VectorRecord,
        threshold: f32,
    ) -> Result<Vec<(u64, VectorRecord)>, MemoryError> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        self.check_dimension(query.embedding.len())?;
        Ok(self
            .entries
            .values()
            .filter_map(|entry| {
                let score = cosine_similarity(&query.embedding, &entry.record.embedding);
                (score >= threshold).then(|| {
                    let mut record = entry.record.clone();
                    record.similarity = score;
                    (entry.seq, record)
                })
            })
            .collect())
    }
}

/// 余弦相似度；任一向量范数为 0 时返回 0.0。调用方保证两向量等长
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(records: &[(&str, Vec<f32>)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for (text, emb) in records {
            store.save(VectorRecord::new(*text, emb.clone())).unwrap();
        }
        store
    }

    #[test]
    fn test_cosine_similarity_basic() {
        let a = [1.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);

        let c = [0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);

        let d = [-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_symmetric_and_self_is_one() {
        let a = [0.3, -1.2, 4.5, 0.01];
        let b = [2.0, 0.5, -0.7, 3.3];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&b, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_norm_is_zero() {
        let zero = [0.0, 0.0, 0.0];
        let v = [1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_save_assigns_unique_ids() {
        let mut store = MemoryStore::new();
        let a = store.save(VectorRecord::new("a", vec![1.0, 0.0])).unwrap();
        let b = store.save(VectorRecord::new("b", vec![0.0, 1.0])).unwrap();
        assert!(!a.id.is_empty());
        assert!(!b.id.is_empty());
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&a.id).map(|r| r.source_text.as_str()), Some("a"));
    }

    #[test]
    fn test_save_with_existing_id_overwrites() {
        let mut store = MemoryStore::new();
        store.save(VectorRecord::new("old", vec![1.0, 0.0]).with_id("k")).unwrap();
        store.save(VectorRecord::new("other", vec![0.5, 0.5])).unwrap();
        store.save(VectorRecord::new("new", vec![0.0, 1.0]).with_id("k")).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("k").unwrap().source_text, "new");
        // 覆盖保留原插入位置
        assert_eq!(store.all()[0].id, "k");
    }

    #[test]
    fn test_save_rejects_bad_embeddings() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.save(VectorRecord::new("empty", vec![])),
            Err(MemoryError::EmptyEmbedding)
        );
        store.save(VectorRecord::new("a", vec![1.0, 0.0])).unwrap();
        assert_eq!(
            store.save(VectorRecord::new("b", vec![1.0, 0.0, 0.0])),
            Err(MemoryError::DimensionMismatch { expected: 2, found: 3 })
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.dimension(), Some(2));
    }

    #[test]
    fn test_search_similarities_threshold_inclusive() {
        let store = store_with(&[
            ("same", vec![1.0, 0.0]),
            ("orthogonal", vec![0.0, 1.0]),
            ("diagonal", vec![1.0, 1.0]),
        ]);
        let query = VectorRecord::query(vec![1.0, 0.0]);

        let mut found = store.search_similarities(&query, 0.0).unwrap();
        found.sort_by(|a, b| a.source_text.cmp(&b.source_text));
        assert_eq!(found.len(), 3);

        let found = store.search_similarities(&query, 0.7).unwrap();
        let mut texts: Vec<&str> = found.iter().map(|r| r.source_text.as_str()).collect();
        texts.sort();
        assert_eq!(texts, vec!["diagonal", "same"]);
        for r in &found {
            assert!(r.similarity >= 0.7);
        }

        // score == threshold 也算命中
        let exact = store.search_similarities(&query, 1.0).unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].source_text, "same");
    }

    #[test]
    fn test_search_rejects_query_dimension_mismatch() {
        let store = store_with(&[("a", vec![1.0, 0.0])]);
        let query = VectorRecord::query(vec![1.0, 0.0, 0.0]);
        assert_eq!(
            store.search_similarities(&query, 0.0),
            Err(MemoryError::DimensionMismatch { expected: 2, found: 3 })
        );
        // 空库不做校验
        assert!(MemoryStore::new().search_similarities(&query, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_search_top_n_sorted_and_truncated() {
        let store = store_with(&[
            ("low", vec![0.2, 1.0]),
            ("high", vec![1.0, 0.05]),
            ("mid", vec![1.0, 0.6]),
            ("none", vec![0.0, 1.0]),
        ]);
        let query = VectorRecord::query(vec![1.0, 0.0]);

        let top = store.search_top_n(&query, 0.1, 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].source_text, "high");
        assert_eq!(top[1].source_text, "mid");
        assert!(top[0].similarity >= top[1].similarity);

        // 合格数不足 n 时全部返回
        let top = store.search_top_n(&query, 0.1, 10).unwrap();
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        assert!(top.iter().all(|r| r.similarity >= 0.1));

        assert!(store.search_top_n(&query, 0.1, 0).unwrap().is_empty());
    }

    #[test]
    fn test_search_top_n_ties_follow_insertion_order() {
        let store = store_with(&[
            ("first", vec![2.0, 0.0]),
            ("second", vec![1.0, 0.0]),
            ("third", vec![3.0, 0.0]),
        ]);
        let top = store
            .search_top_n(&VectorRecord::query(vec![1.0, 0.0]), 0.5, 2)
            .unwrap();
        assert_eq!(top[0].source_text, "first");
        assert_eq!(top[1].source_text, "second");
    }
}
