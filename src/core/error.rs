//! 编排层错误类型
//!
//! 模型回复畸形、督导拒绝耗尽、紧急症状都不是错误（各自在 agents / orchestrator 内消化）；
//! 这里只有 Gateway 失败与请求体问题，由 `TriageOrchestrator::respond` 统一转为兜底回复。

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for TriageError {
    fn from(e: serde_json::Error) -> Self {
        TriageError::InvalidRequest(e.to_string())
    }
}
