//! 会话状态与请求 / 响应结构
//!
//! ConversationState 由调用方持有，每轮按值传入、按值返回；编排层自身不保存任何会话数据。
//! 字段名按 camelCase 序列化，与 HTTP 接口的 JSON 一致。

use serde::{Deserialize, Serialize};

use crate::agents::CounselorResult;
use crate::core::TriageError;
use crate::memory::Message;

/// 会话阶段：collecting → counseling，任意阶段 → escalated；completed 只由外部设置
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Collecting,
    Counseling,
    Escalated,
    Completed,
}

impl Phase {
    /// 已结束的会话不再调用任何 agent
    pub fn is_closed(&self) -> bool {
        matches!(self, Phase::Escalated | Phase::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Collecting => "collecting",
            Phase::Counseling => "counseling",
            Phase::Escalated => "escalated",
            Phase::Completed => "completed",
        }
    }
}

/// 会话状态：collected_info 只增不减；assessment / plan 在进入 counseling 时写入，之后不再变化
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub collected_info: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

impl ConversationState {
    /// 追问通过：记录本条患者消息，阶段不变
    pub fn with_collected(mut self, message: &str) -> Self {
        self.collected_info.push(message.to_string());
        self
    }

    /// 进入 counseling 并冻结评估与方案
    pub fn into_counseling(
        self,
        message: &str,
        assessment: Option<String>,
        plan: Option<String>,
    ) -> Self {
        let mut next = self.with_collected(message);
        next.phase = Phase::Counseling;
        next.assessment = assessment;
        next.plan = plan;
        next
    }

    /// 升级给人工，其余字段保持
    pub fn escalated(mut self) -> Self {
        self.phase = Phase::Escalated;
        self
    }
}

/// 调用方传入的一轮请求
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub chat_state: Option<ConversationState>,
    #[serde(default)]
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, chat_state: ConversationState, history: Vec<Message>) -> Self {
        Self {
            message: message.into(),
            chat_state: Some(chat_state),
            history,
        }
    }

    pub fn from_json(body: &str) -> Result<Self, TriageError> {
        Ok(serde_json::from_str(body)?)
    }

    /// 发送给 agent 的对话：历史 + 本条用户消息
    pub fn conversation(&self) -> Vec<Message> {
        let mut conversation = self.history.clone();
        conversation.push(Message::user(self.message.clone()));
        conversation
    }
}

/// 单轮响应：response 为已渲染的展示文本
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counselor: Option<CounselorResult>,
    pub new_state: ConversationState,
    pub is_emergency: bool,
    pub show_phase_transition: bool,
}

impl ChatResponse {
    pub fn text(response: impl Into<String>, new_state: ConversationState) -> Self {
        Self {
            response: response.into(),
            counselor: None,
            new_state,
            is_emergency: false,
            show_phase_transition: false,
        }
    }

    pub fn emergency(response: impl Into<String>, new_state: ConversationState) -> Self {
        Self {
            is_emergency: true,
            ..Self::text(response, new_state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_wire_format() {
        let state: ConversationState =
            serde_json::from_str(r#"{"phase": "counseling", "collectedInfo": ["a"], "assessment": "x"}"#).unwrap();
        assert_eq!(state.phase, Phase::Counseling);
        assert_eq!(state.collected_info, vec!["a"]);
        assert_eq!(state.assessment.as_deref(), Some("x"));
        assert!(state.plan.is_none());

        let json = serde_json::to_value(ConversationState::default()).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "collecting", "collectedInfo": []}));
    }

    #[test]
    fn test_transitions() {
        let s = ConversationState::default().with_collected("headache");
        assert_eq!(s.phase, Phase::Collecting);

        let s = s.into_counseling("two days", Some("Tension".into()), Some("Rest".into()));
        assert_eq!(s.phase, Phase::Counseling);
        assert_eq!(s.collected_info, vec!["headache", "two days"]);
        assert_eq!(s.plan.as_deref(), Some("Rest"));

        let s = s.escalated();
        assert_eq!(s.phase, Phase::Escalated);
        assert_eq!(s.collected_info.len(), 2);
        assert!(s.phase.is_closed());
    }

    #[test]
    fn test_request_defaults() {
        let req = ChatRequest::from_json(r#"{"message": "hi"}"#).unwrap();
        assert!(req.chat_state.is_none());
        assert!(req.history.is_empty());
        assert_eq!(req.conversation(), vec![Message::user("hi")]);
    }

    #[test]
    fn test_request_parse_failure() {
        let err = ChatRequest::from_json("{not json").unwrap_err();
        assert!(matches!(err, TriageError::InvalidRequest(_)));
    }

    #[test]
    fn test_response_wire_format() {
        let resp = ChatResponse::emergency("help", ConversationState::default().escalated());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["isEmergency"], true);
        assert_eq!(json["showPhaseTransition"], false);
        assert_eq!(json["newState"]["phase"], "escalated");
        assert!(json.get("counselor").is_none());
    }
}
