//! drone-a2a：把 Agent 以 A2A 协议暴露为 HTTP 服务
//!
//! 需要 feature `a2a`：`cargo run --bin drone-a2a --features a2a`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use drone::a2a::server;
use drone::agent::{agent_card, task_handler};
use drone::config::load_config;
use drone::{observability, prepare_agent};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serve a configured agent over A2A", long_about = None)]
struct Cli {
    /// 追加的 TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config).context("Failed to load config")?;
    let addr: SocketAddr = cfg
        .a2a
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", cfg.a2a.bind))?;

    let template = prepare_agent(&cfg).await.context("Failed to create agent")?;
    let card = agent_card(&cfg.a2a);
    let handler = Arc::new(task_handler(&cfg.a2a, template));

    server::serve(addr, card, handler).await.context("A2A server failed")?;
    Ok(())
}
