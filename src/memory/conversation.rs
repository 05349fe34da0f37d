//! 对话记录：单条消息（Turn）与转录工具
//!
//! 对话只追加不修改；督导审核时需要「最近一条患者消息」与按顺序拼接的「ROLE: content」转录。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致，序列化为小写）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// 从后往前找最近一条 User 消息，没有则返回空串
pub fn latest_user_message(messages: &[Message]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// 按原顺序渲染为 `USER: ...` / `ASSISTANT: ...` 行
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_user_message() {
        let messages = vec![
            Message::assistant("What brings you in?"),
            Message::user("I have a headache"),
            Message::assistant("When did this first start?"),
            Message::user("Yesterday"),
            Message::assistant("Thanks"),
        ];
        assert_eq!(latest_user_message(&messages), "Yesterday");
    }

    #[test]
    fn test_latest_user_message_empty() {
        let messages = vec![Message::assistant("Hello")];
        assert_eq!(latest_user_message(&messages), "");
        assert_eq!(latest_user_message(&[]), "");
    }

    #[test]
    fn test_render_transcript() {
        let messages = vec![Message::user("I feel dizzy"), Message::assistant("Since when?")];
        assert_eq!(
            render_transcript(&messages),
            "USER: I feel dizzy\nASSISTANT: Since when?"
        );
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let parsed: Message = serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
        assert_eq!(parsed.role, Role::Assistant);
    }
}
