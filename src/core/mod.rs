//! 核心编排层：错误类型、会话状态、升级通知、问诊状态机

pub mod error;
pub mod escalation;
pub mod orchestrator;
pub mod state;

pub use error::TriageError;
pub use escalation::{
    create_escalation_from_config, EscalationSink, LogEscalation, RecordingEscalation,
    WebhookEscalation,
};
pub use orchestrator::{fail_safe_response, ReviewOutcome, TriageOrchestrator};
pub use state::{ChatRequest, ChatResponse, ConversationState, Phase};
