//! Model Gateway 抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：complete_json 发送 system + 对话，
//! 要求模型返回 JSON 对象，原样返回回复文本；解析与字段兜底由调用方（agents）负责。

use async_trait::async_trait;
use thiserror::Error;

use crate::memory::Message;

/// Gateway 调用失败（网络 / API 返回错误 / 请求构造），由编排层边界统一转为兜底回复
#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// 一次 JSON 模式的补全请求
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub messages: Vec<Message>,
    /// None 表示不传 temperature（部分模型不支持）
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            system: system.into(),
            messages,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// LLM 客户端 trait：必须可跨会话并发使用
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// JSON 模式补全，返回原始回复文本
    async fn complete_json(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
