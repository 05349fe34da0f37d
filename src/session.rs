//! 会话驱动：终端 / HTTP 之外的客户端侧逻辑
//!
//! create_orchestrator 从配置构建 Gateway、升级通知与编排器；
//! TriageSession 持有一次问诊的状态与两段对话（采集阶段 / 咨询阶段），
//! 每轮把对应阶段的历史交给编排器，并处理开场白、阶段切换提示与输入锁定。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::Instrument;
use uuid::Uuid;

use crate::config::{load_config_or_default, AppConfig};
use crate::core::{
    create_escalation_from_config, ChatRequest, ChatResponse, ConversationState, Phase,
    TriageOrchestrator,
};
use crate::llm::create_llm_from_config;
use crate::memory::Message;

/// 进入咨询阶段时插入采集阶段末尾的提示
pub const PHASE_TRANSITION_BANNER: &str = "Assessment Complete\n\nI now have enough information to provide my assessment. Let me hand you over to our patient counselor who will explain the findings and next steps.";

/// 按配置构建编排器（Gateway 与升级通知都显式创建后注入）
pub fn create_orchestrator(cfg: &AppConfig) -> TriageOrchestrator {
    let llm = create_llm_from_config(cfg);
    let escalation = create_escalation_from_config(cfg);
    TriageOrchestrator::from_config(cfg, llm, escalation)
}

/// 加载配置并构建编排器，返回二者供调用方继续使用
pub fn create_orchestrator_from_path(config_path: Option<PathBuf>) -> (AppConfig, TriageOrchestrator) {
    let cfg = load_config_or_default(config_path);
    let orchestrator = create_orchestrator(&cfg);
    (cfg, orchestrator)
}

/// 回复的说话人（决定展示标签）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    Doctor,
    Counselor,
    System,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Doctor => "Dr. Amigo",
            Speaker::Counselor => "Health Counselor",
            Speaker::System => "System",
        }
    }
}

/// 一轮的展示结果
#[derive(Debug, Clone)]
pub struct SessionReply {
    pub speaker: Speaker,
    /// 阶段切换时先展示的提示
    pub transition_banner: Option<String>,
    pub response: ChatResponse,
}

/// 单次问诊会话
pub struct TriageSession {
    id: Uuid,
    orchestrator: Arc<TriageOrchestrator>,
    state: ConversationState,
    phase_one: Vec<Message>,
    phase_two: Vec<Message>,
}

impl TriageSession {
    /// 新会话：采集阶段以助手开场白开始
    pub fn new(orchestrator: Arc<TriageOrchestrator>, greeting: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            orchestrator,
            state: ConversationState::default(),
            phase_one: vec![Message::assistant(greeting)],
            phase_two: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn phase_one(&self) -> &[Message] {
        &self.phase_one
    }

    pub fn phase_two(&self) -> &[Message] {
        &self.phase_two
    }

    pub fn greeting(&self) -> Option<&str> {
        self.phase_one.first().map(|m| m.content.as_str())
    }

    /// 会话结束（escalated / completed）后不再接受输入
    pub fn input_disabled(&self) -> bool {
        self.state.phase.is_closed()
    }

    /// 提交一条用户输入；空输入或会话已结束返回 None
    pub async fn send(&mut self, input: &str) -> Option<SessionReply> {
        let content = input.trim();
        if content.is_empty() || self.input_disabled() {
            return None;
        }

        let in_counseling = self.state.phase == Phase::Counseling;
        let history = if in_counseling {
            self.phase_two.clone()
        } else {
            self.phase_one.clone()
        };
        let user_message = Message::user(content);
        if in_counseling {
            self.phase_two.push(user_message);
        } else {
            self.phase_one.push(user_message);
        }

        let request = ChatRequest::new(content, self.state.clone(), history);
        let span = tracing::info_span!("session", id = %self.id, phase = self.state.phase.as_str());
        let response = self.orchestrator.respond(request).instrument(span).await;

        let transition_banner = if response.show_phase_transition {
            self.phase_one
                .push(Message::assistant(PHASE_TRANSITION_BANNER));
            tracing::info!(session = %self.id, "Phase transition: collecting -> counseling");
            Some(PHASE_TRANSITION_BANNER.to_string())
        } else {
            None
        };

        let assistant = Message::assistant(response.response.clone());
        let speaker = if response.is_emergency {
            Speaker::System
        } else if response.new_state.phase == Phase::Counseling {
            Speaker::Counselor
        } else {
            Speaker::Doctor
        };

        if response.new_state.phase == Phase::Counseling {
            if response.show_phase_transition {
                self.phase_two = vec![assistant];
            } else {
                self.phase_two.push(assistant);
            }
        } else {
            self.phase_one.push(assistant);
        }
        self.state = response.new_state.clone();

        Some(SessionReply {
            speaker,
            transition_banner,
            response,
        })
    }
}
