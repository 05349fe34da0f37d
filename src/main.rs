//! Amigo 终端问诊
//!
//! 入口：初始化日志、按配置创建编排器，在终端中逐行读取患者输入并打印回复。
//! 可选参数：配置文件路径（覆盖 config/default.toml）。

use std::path::PathBuf;
use std::sync::Arc;

use amigo::observability;
use amigo::session::{create_orchestrator_from_path, TriageSession};
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let (cfg, orchestrator) = create_orchestrator_from_path(config_path);
    let mut session = TriageSession::new(Arc::new(orchestrator), cfg.app.greeting.clone());
    tracing::info!(session = %session.id(), "Consultation started");

    let mut stdout = tokio::io::stdout();
    if let Some(greeting) = session.greeting() {
        stdout
            .write_all(format!("Dr. Amigo: {}\n\n", greeting).as_bytes())
            .await?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("/quit") || line.eq_ignore_ascii_case("/exit") {
            break;
        }

        let Some(reply) = session.send(line).await else {
            continue;
        };

        let mut out = String::new();
        if let Some(banner) = &reply.transition_banner {
            out.push_str(&format!("\n--- {} ---\n", banner));
        }
        if reply.response.is_emergency {
            out.push_str("[Important Notice]\n");
        }
        out.push_str(&format!("\n{}: {}\n\n", reply.speaker.label(), reply.response.response));
        stdout.write_all(out.as_bytes()).await?;

        if session.input_disabled() {
            stdout
                .write_all(b"(This consultation has ended.)\n")
                .await?;
            break;
        }
    }

    Ok(())
}
