//! 记忆层：会话内对话记录（状态由调用方持有，核心不做持久化）

pub mod conversation;

pub use conversation::{latest_user_message, render_transcript, Message, Role};
