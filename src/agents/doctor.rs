//! Doctor：症状采集与就绪 / 紧急判断
//!
//! 每次调用把固定策略、已采集信息与（仅本次有效的）督导反馈拼成 system prompt，
//! 要求模型返回 `{type, response, assessment?, plan?}`。回复不合规时不报错，按缺省值降级为追问。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agents::prompts::doctor_prompt;
use crate::agents::reply::{non_empty_str_field, parse_json_object, str_field};
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::memory::Message;

/// `type` 缺失或无法识别时的缺省决策
pub const DEFAULT_DECISION_KIND: DecisionKind = DecisionKind::Probe;

/// `response` 缺失时的缺省追问
pub const DEFAULT_PROBE_RESPONSE: &str = "Could you tell me more about your symptoms?";

/// 医生决策类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    /// 信息不足，继续追问
    Probe,
    /// 信息足够，给出评估与方案
    Ready,
    /// 检测到紧急症状，立即升级
    Emergency,
}

impl DecisionKind {
    /// 大小写不敏感；未知值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "probe" => Some(Self::Probe),
            "ready" => Some(Self::Ready),
            "emergency" => Some(Self::Emergency),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Probe => "probe",
            Self::Ready => "ready",
            Self::Emergency => "emergency",
        }
    }

    /// ready / emergency 直接结束审核循环，不经督导
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Emergency)
    }
}

/// 医生单轮输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorDecision {
    #[serde(rename = "type")]
    pub kind: DecisionKind,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

impl DoctorDecision {
    /// 把模型原始回复解析为决策，缺失 / 非法字段走缺省值
    pub fn from_reply(raw: &str) -> Self {
        let Some(obj) = parse_json_object(raw) else {
            tracing::debug!("Doctor reply is not a JSON object, defaulting to probe");
            return Self {
                kind: DEFAULT_DECISION_KIND,
                response: DEFAULT_PROBE_RESPONSE.to_string(),
                assessment: None,
                plan: None,
            };
        };

        let kind = str_field(&obj, "type")
            .as_deref()
            .and_then(DecisionKind::parse)
            .unwrap_or(DEFAULT_DECISION_KIND);

        Self {
            kind,
            response: non_empty_str_field(&obj, "response")
                .unwrap_or_else(|| DEFAULT_PROBE_RESPONSE.to_string()),
            assessment: str_field(&obj, "assessment"),
            plan: str_field(&obj, "plan"),
        }
    }
}

/// 拼接 system prompt：策略 + 已采集信息（非空时）+ 督导反馈（有时）
pub fn build_doctor_system(
    base: &str,
    collected_info: &[String],
    supervisor_feedback: Option<&str>,
) -> String {
    let mut system = base.to_string();
    if !collected_info.is_empty() {
        system.push_str("\n\nInformation collected so far:\n");
        system.push_str(&collected_info.join("\n"));
    }
    if let Some(feedback) = supervisor_feedback {
        system.push_str("\n\nSupervisor feedback to fix before responding:\n");
        system.push_str(feedback);
    }
    system
}

/// Doctor agent：持有 Gateway、策略 prompt 与 temperature
pub struct Doctor {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: Option<f32>,
}

impl Doctor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: doctor_prompt(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// 运行一次医生决策；只有 Gateway 失败才返回错误
    pub async fn decide(
        &self,
        conversation: &[Message],
        collected_info: &[String],
        supervisor_feedback: Option<&str>,
    ) -> Result<DoctorDecision, LlmError> {
        let system = build_doctor_system(&self.system_prompt, collected_info, supervisor_feedback);
        let request = CompletionRequest::new(system, conversation.to_vec())
            .with_temperature(self.temperature);
        let raw = self.llm.complete_json(&request).await?;
        Ok(DoctorDecision::from_reply(&raw))
    }
}
