//! 问诊编排器：每轮用户输入的状态机
//!
//! 按阶段分派，每个阶段一个处理函数，返回新的状态（旧状态按值消费）：
//! - collecting：医生 → 督导审核（最多 N 次，拒绝理由作为下次反馈）；ready / emergency 不经督导。
//!   审核耗尽或 emergency → 升级；ready → 咨询师首答并进入 counseling；probe 通过 → 原样返回追问。
//! - counseling：每轮调用咨询师，沿用冻结的评估与方案，状态不变。
//! - escalated / completed：不调用任何 agent，返回固定结束语。
//!
//! 编排器本身无会话数据，可被多个会话并发共享。

use std::sync::Arc;

use crate::agents::{
    Counselor, DecisionKind, Doctor, DoctorDecision, ReviewInput, ReviewRole, Supervisor,
};
use crate::config::AppConfig;
use crate::core::escalation::EscalationSink;
use crate::core::{ChatRequest, ChatResponse, ConversationState, Phase, TriageError};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::plan::render_counselor;

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// 督导拒绝但未给理由时的反馈
pub const DEFAULT_REJECTION_FEEDBACK: &str = "Supervisor rejected. Ensure all constraints are met.";

pub const HANDOFF_MESSAGE: &str = "I want to make sure you get the best care possible. A human healthcare provider will be in touch with you shortly to continue this conversation.";

pub const EMERGENCY_HANDOFF_SUFFIX: &str = "\n\nA human healthcare provider will be in touch with you shortly.";

pub const CONSULTATION_ENDED_MESSAGE: &str = "This consultation has ended. Please contact a healthcare provider if you need further assistance.";

pub const FAIL_SAFE_MESSAGE: &str = "I apologize, but I'm having trouble right now. If this is an emergency, please call 911 immediately.";

/// 医生-督导循环的结果
#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    /// 得到可用决策（ready / emergency 直接放行，probe 经督导通过）
    Approved {
        decision: DoctorDecision,
        attempts: usize,
    },
    /// 所有尝试都被督导拒绝
    Exhausted { last_reason: String },
}

/// 不可恢复失败时的兜底回复：强制升级并清空已采集信息
pub fn fail_safe_response() -> ChatResponse {
    ChatResponse::emergency(
        FAIL_SAFE_MESSAGE,
        ConversationState {
            phase: Phase::Escalated,
            ..ConversationState::default()
        },
    )
}

/// 编排器：持有三个 agent 与升级通知
pub struct TriageOrchestrator {
    doctor: Doctor,
    supervisor: Supervisor,
    counselor: Counselor,
    escalation: Arc<dyn EscalationSink>,
    max_attempts: usize,
}

impl TriageOrchestrator {
    /// 三个 agent 共用同一个 Gateway，temperature 不设置
    pub fn new(llm: Arc<dyn LlmClient>, escalation: Arc<dyn EscalationSink>) -> Self {
        Self {
            doctor: Doctor::new(llm.clone()),
            supervisor: Supervisor::new(llm.clone()),
            counselor: Counselor::new(llm),
            escalation,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn from_config(
        cfg: &AppConfig,
        llm: Arc<dyn LlmClient>,
        escalation: Arc<dyn EscalationSink>,
    ) -> Self {
        Self {
            doctor: Doctor::new(llm.clone()).with_temperature(cfg.llm.doctor_temperature),
            supervisor: Supervisor::new(llm.clone())
                .with_temperature(cfg.llm.supervisor_temperature),
            counselor: Counselor::new(llm).with_temperature(cfg.llm.counselor_temperature),
            escalation,
            max_attempts: cfg.triage.attempts(),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// 对外边界：任何错误都记录并转为兜底回复
    pub async fn respond(&self, request: ChatRequest) -> ChatResponse {
        match self.process_turn(request).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!("Turn failed: {}", e);
                fail_safe_response()
            }
        }
    }

    /// 解析原始 JSON 请求体后处理
    pub async fn process_raw(&self, body: &str) -> Result<ChatResponse, TriageError> {
        let request = ChatRequest::from_json(body)?;
        self.process_turn(request).await
    }

    /// 处理一轮输入；缺省状态为 collecting + 空 collected_info
    pub async fn process_turn(&self, request: ChatRequest) -> Result<ChatResponse, TriageError> {
        let conversation = request.conversation();
        let state = request.chat_state.unwrap_or_default();

        match state.phase {
            Phase::Collecting => {
                self.handle_collecting(state, &conversation, &request.message)
                    .await
            }
            Phase::Counseling => self.handle_counseling(state, &conversation).await,
            Phase::Escalated | Phase::Completed => Ok(ChatResponse::text(
                CONSULTATION_ENDED_MESSAGE,
                state,
            )),
        }
    }

    /// 医生-督导循环：ready / emergency 直接放行；probe 需督导通过，拒绝理由带入下一次尝试
    pub async fn review_doctor(
        &self,
        conversation: &[Message],
        collected_info: &[String],
    ) -> Result<ReviewOutcome, TriageError> {
        let mut feedback: Option<String> = None;

        for attempt in 1..=self.max_attempts {
            let decision = self
                .doctor
                .decide(conversation, collected_info, feedback.as_deref())
                .await?;
            tracing::info!(
                attempt,
                kind = decision.kind.as_str(),
                "Doctor output: {}",
                decision.response
            );

            if decision.kind.is_terminal() {
                return Ok(ReviewOutcome::Approved { decision, attempts: attempt });
            }

            let verdict = self
                .supervisor
                .review(ReviewInput {
                    response_text: &decision.response,
                    decision_type: decision.kind.as_str(),
                    conversation,
                    assessment: decision.assessment.as_deref(),
                    plan: decision.plan.as_deref(),
                    role: ReviewRole::Doctor,
                })
                .await?;

            if verdict.approved {
                return Ok(ReviewOutcome::Approved { decision, attempts: attempt });
            }

            let reason = verdict
                .reason
                .unwrap_or_else(|| DEFAULT_REJECTION_FEEDBACK.to_string());
            tracing::warn!(attempt, "Supervisor rejected: {}", reason);
            feedback = Some(reason);
        }

        Ok(ReviewOutcome::Exhausted {
            last_reason: feedback.unwrap_or_else(|| DEFAULT_REJECTION_FEEDBACK.to_string()),
        })
    }

    async fn handle_collecting(
        &self,
        state: ConversationState,
        conversation: &[Message],
        message: &str,
    ) -> Result<ChatResponse, TriageError> {
        let decision = match self.review_doctor(conversation, &state.collected_info).await? {
            ReviewOutcome::Approved { decision, attempts } => {
                tracing::info!(attempts, kind = decision.kind.as_str(), "Doctor decision approved");
                decision
            }
            ReviewOutcome::Exhausted { last_reason } => {
                tracing::warn!("Supervisor never approved, last reason: {}", last_reason);
                self.escalation
                    .escalate(&format!(
                        "Supervisor validation failed after {} attempts",
                        self.max_attempts
                    ))
                    .await;
                return Ok(ChatResponse::emergency(HANDOFF_MESSAGE, state.escalated()));
            }
        };

        match decision.kind {
            DecisionKind::Emergency => {
                self.escalation
                    .escalate(&format!("Emergency symptoms detected: {}", message))
                    .await;
                Ok(ChatResponse::emergency(
                    format!("{}{}", decision.response, EMERGENCY_HANDOFF_SUFFIX),
                    state.escalated(),
                ))
            }
            DecisionKind::Ready => {
                let result = self
                    .counselor
                    .counsel(
                        conversation,
                        decision.assessment.as_deref().unwrap_or(""),
                        decision.plan.as_deref().unwrap_or(""),
                    )
                    .await?;
                tracing::info!(mode = result.mode(), "Assessment ready, moving to counseling");

                Ok(ChatResponse {
                    response: render_counselor(&result),
                    counselor: Some(result),
                    new_state: state.into_counseling(message, decision.assessment, decision.plan),
                    is_emergency: false,
                    show_phase_transition: true,
                })
            }
            DecisionKind::Probe => Ok(ChatResponse::text(
                decision.response,
                state.with_collected(message),
            )),
        }
    }

    async fn handle_counseling(
        &self,
        state: ConversationState,
        conversation: &[Message],
    ) -> Result<ChatResponse, TriageError> {
        let result = self
            .counselor
            .counsel(
                conversation,
                state.assessment.as_deref().unwrap_or(""),
                state.plan.as_deref().unwrap_or(""),
            )
            .await?;

        Ok(ChatResponse {
            response: render_counselor(&result),
            counselor: Some(result),
            new_state: state,
            is_emergency: false,
            show_phase_transition: false,
        })
    }

    /// 审核咨询师回复（counseling 阶段默认不接入）
    pub async fn review_counselor(
        &self,
        response_text: &str,
        conversation: &[Message],
        state: &ConversationState,
    ) -> Result<crate::agents::SupervisorVerdict, TriageError> {
        Ok(self
            .supervisor
            .review(ReviewInput {
                response_text,
                decision_type: "counseling",
                conversation,
                assessment: state.assessment.as_deref(),
                plan: state.plan.as_deref(),
                role: ReviewRole::Counselor,
            })
            .await?)
    }
}
