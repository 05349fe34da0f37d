//! OpenAI 兼容 API 客户端
//!
//! 通过 async_openai 调用任意 OpenAI 兼容端点（可配置 base_url）；所有请求都使用 JSON 对象回复格式。

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::llm::{CompletionRequest, LlmClient, LlmError};
use crate::memory::{Message, Role};

/// gpt-5 系列不接受自定义 temperature
pub fn supports_temperature(model: &str) -> bool {
    !model.starts_with("gpt-5")
}

/// OpenAI 兼容客户端：持有 Client 与 model 名，complete_json 时转 Message 为 API 格式并取首条 content
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: Option<&str>, model: &str, api_key: Option<&str>) -> Self {
        let api_key = api_key
            .map(String::from)
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .unwrap_or_else(|| "sk-placeholder".to_string());

        let config = if let Some(url) = base_url {
            OpenAIConfig::new().with_api_base(url).with_api_key(api_key)
        } else {
            OpenAIConfig::new().with_api_key(api_key)
        };

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_openai_messages(
        &self,
        request: &CompletionRequest,
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        let mut out = Vec::with_capacity(request.messages.len() + 1);
        out.push(ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system.clone())
                .build()?,
        ));
        for m in &request.messages {
            out.push(to_openai_message(m)?);
        }
        Ok(out)
    }
}

fn to_openai_message(m: &Message) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    Ok(match m.role {
        Role::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(m.content.clone())
                .build()?,
        ),
        Role::Assistant => ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(m.content.clone())
                .build()?,
        ),
    })
}

fn map_openai_error(e: OpenAIError) -> LlmError {
    match e {
        OpenAIError::InvalidArgument(msg) => LlmError::InvalidRequest(msg),
        other => LlmError::ApiError(other.to_string()),
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete_json(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let messages = self.to_openai_messages(request).map_err(map_openai_error)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject);
        if let Some(t) = request.temperature.filter(|_| supports_temperature(&self.model)) {
            args.temperature(t);
        }
        let api_request = args.build().map_err(map_openai_error)?;

        let response = self
            .client
            .chat()
            .create(api_request)
            .await
            .map_err(map_openai_error)?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = %self.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion finished"
            );
        }

        // 空回复按空对象处理，交给 agents 的字段兜底
        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "{}".to_string());

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports_temperature() {
        assert!(!supports_temperature("gpt-5.2"));
        assert!(!supports_temperature("gpt-5"));
        assert!(supports_temperature("gpt-4o-mini"));
        assert!(supports_temperature("deepseek-chat"));
    }

    #[test]
    fn test_to_openai_messages_prepends_system() {
        let client = OpenAiClient::new(None, "gpt-4o-mini", Some("sk-test"));
        let req = CompletionRequest::new(
            "policy",
            vec![Message::user("hi"), Message::assistant("hello")],
        );
        let msgs = client.to_openai_messages(&req).unwrap();
        assert_eq!(msgs.len(), 3);
        assert!(matches!(msgs[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(msgs[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(msgs[2], ChatCompletionRequestMessage::Assistant(_)));
    }
}
