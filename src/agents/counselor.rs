//! Counselor：向患者解释医生的评估与方案，并回答后续问题
//!
//! 每次调用都把冻结的 assessment / plan 原文拼进 system prompt（Answer 模式也一样）。
//! 模式判定：显式 `mode` 优先；否则出现任一方案字段即为 Plan，其余为 Answer。
//! 回复无法解析为 JSON 对象时，把原始文本当作答案返回。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::prompts::counselor_prompt;
use crate::agents::reply::{parse_strict_json_object, str_field, value_to_string, JsonObject};
use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::memory::Message;

/// 咨询师输出：两种形态只取其一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CounselorResult {
    Plan {
        assessment: String,
        #[serde(rename = "treatmentPlan")]
        treatment_plan: Vec<String>,
        #[serde(rename = "followUp")]
        follow_up: String,
    },
    Answer {
        answer: String,
    },
}

impl CounselorResult {
    pub fn is_plan(&self) -> bool {
        matches!(self, CounselorResult::Plan { .. })
    }

    pub fn mode(&self) -> &'static str {
        match self {
            CounselorResult::Plan { .. } => "plan",
            CounselorResult::Answer { .. } => "answer",
        }
    }

    pub fn from_reply(raw: &str) -> Self {
        let Some(obj) = parse_strict_json_object(raw) else {
            tracing::debug!("Counselor reply is not a JSON object, falling back to answer mode");
            return CounselorResult::Answer {
                answer: raw.to_string(),
            };
        };

        if is_plan_mode(&obj) {
            let treatment_plan = match obj.get("treatment_plan") {
                Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
                _ => Vec::new(),
            };
            CounselorResult::Plan {
                assessment: str_field(&obj, "assessment").unwrap_or_default(),
                treatment_plan,
                follow_up: str_field(&obj, "follow_up").unwrap_or_default(),
            }
        } else {
            CounselorResult::Answer {
                answer: str_field(&obj, "answer").unwrap_or_else(|| raw.to_string()),
            }
        }
    }
}

fn is_plan_mode(obj: &JsonObject) -> bool {
    match str_field(obj, "mode").map(|m| m.trim().to_ascii_lowercase()).as_deref() {
        Some("plan") => true,
        Some("answer") => false,
        _ => {
            matches!(obj.get("assessment"), Some(Value::String(_)))
                || matches!(obj.get("treatment_plan"), Some(Value::Array(_)))
                || matches!(obj.get("follow_up"), Some(Value::String(_)))
        }
    }
}

/// 策略 + 医生评估与方案
pub fn build_counselor_system(base: &str, assessment: &str, plan: &str) -> String {
    format!(
        "{}\n\nDoctor's Assessment: {}\n\nTreatment Plan: {}",
        base, assessment, plan
    )
}

/// Counselor agent
pub struct Counselor {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
    temperature: Option<f32>,
}

impl Counselor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: counselor_prompt(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub async fn counsel(
        &self,
        conversation: &[Message],
        assessment: &str,
        plan: &str,
    ) -> Result<CounselorResult, LlmError> {
        let system = build_counselor_system(&self.system_prompt, assessment, plan);
        let request = CompletionRequest::new(system, conversation.to_vec())
            .with_temperature(self.temperature);
        let raw = self.llm.complete_json(&request).await?;
        Ok(CounselorResult::from_reply(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_invalid_json_falls_back_to_raw_answer() {
        let raw = "Sorry, I cannot produce JSON right now.";
        assert_eq!(
            CounselorResult::from_reply(raw),
            CounselorResult::Answer { answer: raw.to_string() }
        );
    }

    #[test]
    fn test_prose_with_embedded_object_stays_raw_answer() {
        let raw = "I understand. Here is the summary: {\"assessment\": \"Cold\"} Let me know if that helps.";
        assert_eq!(
            CounselorResult::from_reply(raw),
            CounselorResult::Answer { answer: raw.to_string() }
        );

        let fenced = "```json\n{\"mode\": \"plan\", \"assessment\": \"Cold\"}\n```";
        assert_eq!(
            CounselorResult::from_reply(fenced),
            CounselorResult::Answer { answer: fenced.to_string() }
        );
    }

    #[test]
    fn test_explicit_plan_mode() {
        let r = CounselorResult::from_reply(
            r#"{"mode": "plan", "assessment": "Mild cold", "treatment_plan": ["Rest", 2, null], "follow_up": "3 days"}"#,
        );
        assert_eq!(
            r,
            CounselorResult::Plan {
                assessment: "Mild cold".into(),
                treatment_plan: vec!["Rest".into(), "2".into(), "".into()],
                follow_up: "3 days".into(),
            }
        );
    }

    #[test]
    fn test_explicit_plan_mode_without_fields() {
        let r = CounselorResult::from_reply(r#"{"mode": "plan"}"#);
        assert_eq!(
            r,
            CounselorResult::Plan {
                assessment: String::new(),
                treatment_plan: vec![],
                follow_up: String::new(),
            }
        );
    }

    #[test]
    fn test_explicit_answer_mode_wins_over_plan_fields() {
        let r = CounselorResult::from_reply(
            r#"{"mode": "answer", "answer": "Take it with food.", "assessment": "x"}"#,
        );
        assert_eq!(r, CounselorResult::Answer { answer: "Take it with food.".into() });
    }

    #[test]
    fn test_inferred_plan_mode() {
        let r = CounselorResult::from_reply(r#"{"follow_up": "See a doctor in a week"}"#);
        assert!(r.is_plan());
        let r = CounselorResult::from_reply(r#"{"treatment_plan": "not an array"}"#);
        assert!(!r.is_plan());
    }

    #[test]
    fn test_answer_mode_without_answer_uses_raw() {
        let raw = r#"{"mode": "answer"}"#;
        assert_eq!(
            CounselorResult::from_reply(raw),
            CounselorResult::Answer { answer: raw.to_string() }
        );
    }

    #[test]
    fn test_serialize_wire_shape() {
        let plan = CounselorResult::Plan {
            assessment: "a".into(),
            treatment_plan: vec!["b".into()],
            follow_up: "c".into(),
        };
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"mode": "plan", "assessment": "a", "treatmentPlan": ["b"], "followUp": "c"})
        );
        let answer = serde_json::to_value(CounselorResult::Answer { answer: "d".into() }).unwrap();
        assert_eq!(answer, serde_json::json!({"mode": "answer", "answer": "d"}));
    }

    #[tokio::test]
    async fn test_counsel_includes_assessment_and_plan() {
        let mock = Arc::new(MockLlmClient::with_replies([r#"{"mode": "answer", "answer": "Yes"}"#]));
        let counselor = Counselor::new(mock.clone());
        let result = counselor
            .counsel(&[Message::user("Can I exercise?")], "Tension headache", "1. Rest")
            .await
            .unwrap();
        assert_eq!(result.mode(), "answer");

        let system = &mock.requests()[0].system;
        assert!(system.ends_with("Doctor's Assessment: Tension headache\n\nTreatment Plan: 1. Rest"));
    }
}
