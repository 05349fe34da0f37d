//! Amigo - Rust 两阶段问诊助手
//!
//! 模块划分：
//! - **agents**: Doctor（采集与判断）、Supervisor（审核）、Counselor（解释与答疑）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 问诊状态机、会话状态、错误类型、升级通知
//! - **llm**: Model Gateway 抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 对话记录与转录工具
//! - **observability**: 日志初始化
//! - **plan**: 治疗方案清洗与咨询师回复渲染
//! - **session**: 客户端侧会话驱动（开场白、分阶段历史、阶段切换）

pub mod agents;
pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod plan;
pub mod session;

pub use crate::core::{ChatRequest, ChatResponse, ConversationState, Phase, TriageOrchestrator};
pub use session::TriageSession;
