//! Mock LLM 客户端（用于测试与无 API Key 时的本地运行）
//!
//! 按顺序返回预置回复；队列耗尽后重复最后一条，从未预置则返回 `{}`。
//! 记录每次请求，便于断言调用次数与 system prompt 内容。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{CompletionRequest, LlmClient, LlmError};

/// 单条预置回复：正常文本或模拟的 Gateway 失败
#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Fail(LlmError),
}

#[derive(Debug, Default)]
struct MockInner {
    queue: VecDeque<Scripted>,
    last: Option<Scripted>,
    requests: Vec<CompletionRequest>,
}

/// Mock 客户端：脚本化回复 + 请求记录
#[derive(Debug, Default)]
pub struct MockLlmClient {
    inner: Mutex<MockInner>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次返回给定回复
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new();
        for reply in replies {
            client.push_reply(reply);
        }
        client
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.lock().queue.push_back(Scripted::Reply(reply.into()));
    }

    /// 下一次调用返回错误
    pub fn push_error(&self, err: LlmError) {
        self.lock().queue.push_back(Scripted::Fail(err));
    }

    /// 已收到的请求数
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// 已收到请求的副本（按调用顺序）
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        // 中毒只会出现在测试 panic 后，继续使用内部数据即可
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete_json(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let mut inner = self.lock();
        inner.requests.push(request.clone());

        let next = match inner.queue.pop_front() {
            Some(s) => {
                inner.last = Some(s.clone());
                Some(s)
            }
            None => inner.last.clone(),
        };

        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(err)) => Err(err),
            None => Ok("{}".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let mock = MockLlmClient::with_replies(["a", "b"]);
        let req = CompletionRequest::new("sys", vec![]);
        assert_eq!(mock.complete_json(&req).await.unwrap(), "a");
        assert_eq!(mock.complete_json(&req).await.unwrap(), "b");
        assert_eq!(mock.complete_json(&req).await.unwrap(), "b");
        assert_eq!(mock.call_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_returns_empty_object() {
        let mock = MockLlmClient::new();
        let req = CompletionRequest::new("sys", vec![]);
        assert_eq!(mock.complete_json(&req).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let mock = MockLlmClient::new();
        mock.push_error(LlmError::ApiError("down".into()));
        let req = CompletionRequest::new("sys", vec![]);
        assert!(mock.complete_json(&req).await.is_err());
        assert_eq!(mock.requests()[0].system, "sys");
    }
}
