//! Drone 命令行：按配置组装 Agent，对一条提问做流式完成并打印
//!
//! 用法：`drone [--config path.toml] <prompt...>`；没有 prompt 时从 stdin 读一行。

use std::io::Write;
use std::ops::ControlFlow;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use drone::config::load_config;
use drone::core::StreamEnd;
use drone::memory::rag::format_context;
use drone::memory::Message;
use drone::{observability, prepare_agent};

#[derive(Parser, Debug)]
#[command(author, version, about = "Stream one completion from a configured agent", long_about = None)]
struct Cli {
    /// 追加的 TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 提问；为空时从 stdin 读一行
    prompt: Vec<String>,
}

/// 写出一段增量；写失败（如管道关闭）时停止拉流
fn write_chunk<W: Write>(out: &mut W, chunk: &str) -> ControlFlow<String> {
    match out.write_all(chunk.as_bytes()).and_then(|_| out.flush()) {
        Ok(()) => ControlFlow::Continue(()),
        Err(e) => ControlFlow::Break(format!("stdout write failed: {e}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config).context("Failed to load config")?;

    let prompt = if cli.prompt.is_empty() {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).context("Failed to read prompt")?;
        line.trim().to_string()
    } else {
        cli.prompt.join(" ")
    };
    anyhow::ensure!(!prompt.is_empty(), "empty prompt");

    let mut agent = prepare_agent(&cfg).await.context("Failed to create agent")?;

    // 命中记忆时作为 system 上下文附加
    if agent.memory().is_some() {
        let hits = agent
            .search_memory_top_n(&prompt, cfg.memory.threshold, cfg.memory.top_n)
            .await
            .context("Memory search failed")?;
        if !hits.is_empty() {
            agent.push_message(Message::system(format_context(&hits)));
        }
    }
    agent.push_message(Message::user(prompt));

    let mut stdout = std::io::stdout();
    let outcome = agent
        .complete_streaming(|chunk| write_chunk(&mut stdout, chunk))
        .await
        .context("Completion failed")?;

    if let StreamEnd::Stopped(reason) = outcome.end {
        tracing::warn!(%reason, "stream stopped");
        return Ok(());
    }
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_cli_config_and_prompt() {
        let cli = Cli::try_parse_from(["drone", "--config", "bob.toml", "What", "is", "A2A?"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("bob.toml")));
        assert_eq!(cli.prompt.join(" "), "What is A2A?");
    }

    #[test]
    fn test_cli_rejects_config_without_value() {
        assert!(Cli::try_parse_from(["drone", "--config"]).is_err());
    }

    #[test]
    fn test_cli_help_is_not_a_prompt() {
        let err = Cli::try_parse_from(["drone", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_write_chunk() {
        let mut out = Vec::new();
        assert_eq!(write_chunk(&mut out, "Hello"), ControlFlow::Continue(()));
        assert_eq!(out, b"Hello");

        match write_chunk(&mut ClosedPipe, "Hello") {
            ControlFlow::Break(reason) => assert!(reason.contains("stdout write failed")),
            ControlFlow::Continue(()) => panic!("write to a closed pipe must stop the stream"),
        }
    }
}
