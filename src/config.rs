//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `AMIGO__*` 覆盖（双下划线表示嵌套，如 `AMIGO__LLM__MODEL=gpt-4o`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub triage: TriageSection,
    pub web: WebSection,
}

/// [app] 段：开场白
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    /// 会话开始时助手的第一句话
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
        }
    }
}

fn default_greeting() -> String {
    "Hello, I'm Dr. Amigo, your virtual primary care assistant. I'm here to help understand what you're experiencing today.\n\nWhat brings you in?".to_string()
}

/// [llm] 段：后端、模型与各 agent 的 temperature
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / deepseek；优先级由 API Key 与 provider 共同决定
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    #[serde(default = "default_doctor_temperature")]
    pub doctor_temperature: f32,
    #[serde(default = "default_supervisor_temperature")]
    pub supervisor_temperature: f32,
    #[serde(default = "default_counselor_temperature")]
    pub counselor_temperature: f32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            doctor_temperature: default_doctor_temperature(),
            supervisor_temperature: default_supervisor_temperature(),
            counselor_temperature: default_counselor_temperature(),
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-5.2".to_string()
}

fn default_doctor_temperature() -> f32 {
    0.7
}

fn default_supervisor_temperature() -> f32 {
    0.3
}

fn default_counselor_temperature() -> f32 {
    0.7
}

/// [triage] 段：督导重试上限与升级通知地址
#[derive(Debug, Clone, Deserialize)]
pub struct TriageSection {
    #[serde(default = "default_max_supervisor_attempts")]
    pub max_supervisor_attempts: usize,
    /// 设置后升级事件 POST 到该地址，否则仅写日志
    pub escalation_webhook: Option<String>,
}

impl Default for TriageSection {
    fn default() -> Self {
        Self {
            max_supervisor_attempts: default_max_supervisor_attempts(),
            escalation_webhook: None,
        }
    }
}

impl TriageSection {
    /// 至少尝试一次
    pub fn attempts(&self) -> usize {
        self.max_supervisor_attempts.max(1)
    }
}

fn default_max_supervisor_attempts() -> usize {
    3
}

/// [web] 段：amigo-web 监听地址
#[derive(Debug, Clone, Deserialize)]
pub struct WebSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

/// 从 config 目录加载配置，环境变量 AMIGO__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 AMIGO__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("AMIGO")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 加载失败时记录 warn 并回落到默认配置
pub fn load_config_or_default(config_path: Option<PathBuf>) -> AppConfig {
    load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    })
}
