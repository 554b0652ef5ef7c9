//! 工具调用周期的状态：当前批次与阶段
//!
//! Idle --detect 成功--> Detected --resolve--> Resolved --> Idle。
//! 每次 detect 先丢弃旧批次；resolve 之后批次保留可读（用于日志），直到下一次 detect。

use serde::Serialize;

use crate::llm::ToolCall;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum CyclePhase {
    #[default]
    Idle,
    Detected,
    Resolved,
}

/// 最近一次 detect 得到的有序工具调用
#[derive(Clone, Debug, Default)]
pub struct ToolCallBatch {
    calls: Vec<ToolCall>,
    phase: CyclePhase,
}

impl ToolCallBatch {
    pub fn calls(&self) -> &[ToolCall] {
        &self.calls
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub(crate) fn discard(&mut self) {
        self.calls.clear();
        self.phase = CyclePhase::Idle;
    }

    pub(crate) fn replace(&mut self, calls: Vec<ToolCall>) {
        self.calls = calls;
        self.phase = CyclePhase::Detected;
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.phase = CyclePhase::Resolved;
    }

    /// 周期结束回到 Idle，批次保留
    pub(crate) fn finish(&mut self) {
        self.phase = CyclePhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_transitions() {
        let mut batch = ToolCallBatch::default();
        assert_eq!(batch.phase(), CyclePhase::Idle);

        batch.replace(vec![ToolCall::new("c1", "add", "{}")]);
        assert_eq!(batch.phase(), CyclePhase::Detected);

        batch.mark_resolved();
        batch.finish();
        assert_eq!(batch.phase(), CyclePhase::Idle);
        assert_eq!(batch.calls().len(), 1);

        batch.discard();
        assert!(batch.is_empty());
    }
}
