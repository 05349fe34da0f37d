//! LLM 层：Model Gateway 抽象与实现（OpenAI 兼容 / DeepSeek / Mock）

pub mod factory;
pub mod mock;
pub mod openai;
pub mod traits;

pub use factory::{create_llm_from_config, Backend};
pub use mock::MockLlmClient;
pub use openai::{supports_temperature, OpenAiClient};
pub use traits::{CompletionRequest, LlmClient, LlmError};
