//! Supervisor：在回复送达患者前按固定规则审核医生 / 咨询师的本轮输出
//!
//! 审核结果只有通过 / 拒绝两种，不改写回复；拒绝理由作为下一次医生尝试的反馈。
//! 回复缺少 `approved` 字段或无法解析时默认通过（fail-open），避免畸形回复卡住对话。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::prompts::{counselor_supervisor_prompt, doctor_supervisor_prompt};
use crate::agents::reply::{bool_field, non_empty_str_field, parse_json_object};
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::memory::{latest_user_message, render_transcript, Message};

/// `approved` 缺失时的缺省值
pub const DEFAULT_APPROVED: bool = true;

/// 被审核的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewRole {
    Doctor,
    Counselor,
}

impl ReviewRole {
    fn response_label(&self) -> &'static str {
        match self {
            ReviewRole::Doctor => "Doctor response",
            ReviewRole::Counselor => "Counselor response",
        }
    }
}

/// 审核结论；reason 仅在拒绝时有值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorVerdict {
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SupervisorVerdict {
    pub fn approved() -> Self {
        Self {
            approved: true,
            reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason.into()),
        }
    }

    pub fn from_reply(raw: &str) -> Self {
        let Some(obj) = parse_json_object(raw) else {
            tracing::debug!("Supervisor reply is not a JSON object, defaulting to approved");
            return Self::approved();
        };
        let approved = bool_field(&obj, "approved").unwrap_or(DEFAULT_APPROVED);
        Self {
            approved,
            reason: if approved {
                None
            } else {
                non_empty_str_field(&obj, "reason")
            },
        }
    }
}

/// 审核输入：待审回复与上下文
#[derive(Debug, Clone, Copy)]
pub struct ReviewInput<'a> {
    pub response_text: &'a str,
    pub decision_type: &'a str,
    pub conversation: &'a [Message],
    pub assessment: Option<&'a str>,
    pub plan: Option<&'a str>,
    pub role: ReviewRole,
}

/// 拼接审核用的 user 消息：决策类型、最近患者消息、完整转录、待审回复、医生评估与方案
pub fn build_review_message(input: &ReviewInput<'_>) -> String {
    format!(
        "Decision type: {}\nLatest patient message: {}\nConversation transcript:\n{}\n{}:\n{}\nDoctor assessment:\n{}\nDoctor plan:\n{}",
        input.decision_type,
        latest_user_message(input.conversation),
        render_transcript(input.conversation),
        input.role.response_label(),
        input.response_text,
        input.assessment.unwrap_or(""),
        input.plan.unwrap_or(""),
    )
}

/// Supervisor agent：按角色选择规则 prompt
pub struct Supervisor {
    llm: Arc<dyn LlmClient>,
    doctor_prompt: String,
    counselor_prompt: String,
    temperature: Option<f32>,
}

impl Supervisor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            doctor_prompt: doctor_supervisor_prompt(),
            counselor_prompt: counselor_supervisor_prompt(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    fn prompt_for(&self, role: ReviewRole) -> &str {
        match role {
            ReviewRole::Doctor => &self.doctor_prompt,
            ReviewRole::Counselor => &self.counselor_prompt,
        }
    }

    pub async fn review(&self, input: ReviewInput<'_>) -> Result<SupervisorVerdict, LlmError> {
        let request = CompletionRequest::new(
            self.prompt_for(input.role),
            vec![Message::user(build_review_message(&input))],
        )
        .with_temperature(self.temperature);

        let raw = self.llm.complete_json(&request).await?;
        Ok(SupervisorVerdict::from_reply(&raw))
    }
}
