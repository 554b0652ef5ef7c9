//! 完成编排：同步完成与流式完成
//!
//! 请求体 = 生成参数 + 当前对话记录。complete 取第一个 choice 的文本；
//! complete_streaming 逐个拉取增量，回调返回 `ControlFlow::Break` 时立即停止拉取。
//! 两者都不会把回复写回对话记录，由调用方决定是否追加。

use std::ops::ControlFlow;

use futures_util::StreamExt;

use crate::core::agent::Agent;
use crate::core::AgentError;

/// 流式完成的结束方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// 流自然结束
    Completed,
    /// 回调要求停止，携带停止原因
    Stopped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    /// 已交付给回调的全部增量拼接
    pub content: String,
    pub end: StreamEnd,
}

impl Agent {
    /// 发送一次请求，返回第一个 choice 的文本内容（无内容时为空串）
    pub async fn complete(&mut self) -> Result<String, AgentError> {
        let request = self.request();
        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat completion");
        let response = self.backend.complete(request).await?;
        let choice = response.choices.into_iter().next().ok_or(AgentError::NoChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }

    /// 流式完成：每个非空增量先交给回调再累积
    pub async fn complete_streaming<F>(&mut self, mut on_chunk: F) -> Result<StreamOutcome, AgentError>
    where
        F: FnMut(&str) -> ControlFlow<String> + Send,
    {
        let request = self.request().streaming();
        tracing::debug!(model = %request.model, messages = request.messages.len(), "chat completion stream");
        let mut stream = self.backend.complete_stream(request).await?;
        let mut content = String::new();

        while let Some(item) = stream.next().await {
            let chunk = match item {
                Ok(chunk) => chunk,
                Err(source) => {
                    tracing::warn!(error = %source, received = content.len(), "stream interrupted");
                    return Err(AgentError::StreamInterrupted { partial: content, source });
                }
            };
            let Some(delta) = chunk.content() else {
                continue;
            };
            let flow = on_chunk(delta);
            content.push_str(delta);
            if let ControlFlow::Break(reason) = flow {
                tracing::debug!(reason = %reason, "stream stopped by callback");
                return Ok(StreamOutcome {
                    content,
                    end: StreamEnd::Stopped(reason),
                });
            }
        }

        Ok(StreamOutcome {
            content,
            end: StreamEnd::Completed,
        })
    }
}
