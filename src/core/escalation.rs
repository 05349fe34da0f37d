//! 升级通知：把会话移交人工
//!
//! 发出即忘：调用方不读取返回值，通知失败只记录日志，不影响患者看到的回复；
//! Webhook 请求放到后台任务里，慢端点不会拖住本轮回复。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::AppConfig;

#[async_trait]
pub trait EscalationSink: Send + Sync {
    async fn escalate(&self, reason: &str);
}

/// 仅写 warn 日志
#[derive(Debug, Default, Clone)]
pub struct LogEscalation;

#[async_trait]
impl EscalationSink for LogEscalation {
    async fn escalate(&self, reason: &str) {
        tracing::warn!("[ESCALATION] Reason: {}", reason);
    }
}

#[derive(Debug, Serialize)]
struct EscalationPayload {
    reason: String,
    escalated_at: String,
}

/// POST JSON 到外部地址（如值班系统 Webhook）；请求在后台任务中发送，escalate 立即返回
pub struct WebhookEscalation {
    client: reqwest::Client,
    url: String,
}

impl WebhookEscalation {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl EscalationSink for WebhookEscalation {
    async fn escalate(&self, reason: &str) {
        tracing::warn!("[ESCALATION] Reason: {}", reason);
        let payload = EscalationPayload {
            reason: reason.to_string(),
            escalated_at: chrono::Utc::now().to_rfc3339(),
        };
        let client = self.client.clone();
        let url = self.url.clone();
        tokio::spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("Escalation delivered to {}", url);
                }
                Ok(resp) => {
                    tracing::error!("Escalation webhook returned {}", resp.status());
                }
                Err(e) => {
                    tracing::error!("Escalation webhook failed: {}", e);
                }
            }
        });
    }
}

/// 记录所有升级原因（测试与嵌入方检查用）
#[derive(Debug, Default, Clone)]
pub struct RecordingEscalation {
    reasons: Arc<Mutex<Vec<String>>>,
}

impl RecordingEscalation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.reasons
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EscalationSink for RecordingEscalation {
    async fn escalate(&self, reason: &str) {
        if let Ok(mut r) = self.reasons.lock() {
            r.push(reason.to_string());
        }
    }
}

/// 配置了 triage.escalation_webhook 则用 Webhook，否则写日志
pub fn create_escalation_from_config(cfg: &AppConfig) -> Arc<dyn EscalationSink> {
    match cfg.triage.escalation_webhook.as_deref() {
        Some(url) if !url.trim().is_empty() => {
            tracing::info!("Escalations will be posted to {}", url);
            Arc::new(WebhookEscalation::new(url.trim()))
        }
        _ => Arc::new(LogEscalation),
    }
}
