//! 根据配置与环境变量构建 Gateway（DeepSeek / OpenAI 兼容 / Mock）

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{LlmClient, MockLlmClient, OpenAiClient};

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";

/// 后端选择结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    DeepSeek,
    OpenAi,
    Mock,
}

/// 有 DeepSeek Key 或 provider=deepseek 时走 DeepSeek；有 OpenAI Key 走 OpenAI；否则 Mock
pub fn select_backend(provider: &str, has_deepseek_key: bool, has_openai_key: bool) -> Backend {
    let provider = provider.to_lowercase();
    if has_deepseek_key || (provider == "deepseek" && has_openai_key) {
        Backend::DeepSeek
    } else if has_openai_key {
        Backend::OpenAi
    } else {
        Backend::Mock
    }
}

pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let deepseek_key = std::env::var("DEEPSEEK_API_KEY").ok();
    let openai_key = std::env::var("OPENAI_API_KEY").ok();

    match select_backend(&cfg.llm.provider, deepseek_key.is_some(), openai_key.is_some()) {
        Backend::DeepSeek => {
            let model = if cfg.llm.model.starts_with("deepseek") {
                cfg.llm.model.clone()
            } else {
                std::env::var("DEEPSEEK_MODEL").unwrap_or_else(|_| DEEPSEEK_CHAT.to_string())
            };
            let key = deepseek_key.or(openai_key);
            tracing::info!("Using DeepSeek gateway ({})", model);
            Arc::new(OpenAiClient::new(
                Some(DEEPSEEK_BASE_URL),
                &model,
                key.as_deref(),
            ))
        }
        Backend::OpenAi => {
            tracing::info!("Using OpenAI gateway ({})", cfg.llm.model);
            Arc::new(OpenAiClient::new(
                cfg.llm.base_url.as_deref(),
                &cfg.llm.model,
                openai_key.as_deref(),
            ))
        }
        Backend::Mock => {
            tracing::warn!("No API key set, using Mock gateway (every reply is `{{}}`)");
            Arc::new(MockLlmClient::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_backend() {
        assert_eq!(select_backend("openai", true, false), Backend::DeepSeek);
        assert_eq!(select_backend("deepseek", false, true), Backend::DeepSeek);
        assert_eq!(select_backend("OpenAI", false, true), Backend::OpenAi);
        assert_eq!(select_backend("openai", false, false), Backend::Mock);
        assert_eq!(select_backend("deepseek", false, false), Backend::Mock);
    }
}
