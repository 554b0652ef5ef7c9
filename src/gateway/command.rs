//! 网关启动命令：常用预设与配置中的任意命令行

use std::collections::HashMap;

/// 工具集监听地址（Docker Desktop 的 MCP Toolkit）
pub const TOOLKIT_ENDPOINT: &str = "TCP:host.docker.internal:8811";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCommand {
    pub program: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl GatewayCommand {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: HashMap::new(),
        }
    }

    /// 通过 alpine/socat 容器桥接到工具集
    pub fn docker_toolkit() -> Self {
        Self::new(
            "docker",
            ["run", "-i", "--rm", "alpine/socat", "STDIO", TOOLKIT_ENDPOINT],
        )
    }

    /// 本机 socat 直接桥接
    pub fn socat_toolkit() -> Self {
        Self::new("socat", ["STDIO", TOOLKIT_ENDPOINT])
    }

    /// 由 argv 构造；空列表或空程序名返回 None
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.iter().cloned()))
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(
            GatewayCommand::docker_toolkit().argv(),
            vec!["docker", "run", "-i", "--rm", "alpine/socat", "STDIO", "TCP:host.docker.internal:8811"]
        );
        assert_eq!(
            GatewayCommand::socat_toolkit().argv(),
            vec!["socat", "STDIO", "TCP:host.docker.internal:8811"]
        );
    }

    #[test]
    fn test_from_argv() {
        let cmd = GatewayCommand::from_argv(&["npx".into(), "-y".into(), "server".into()]).unwrap();
        assert_eq!(cmd.program, "npx");
        assert_eq!(cmd.args, vec!["-y", "server"]);
        assert!(GatewayCommand::from_argv(&[]).is_none());
        assert!(GatewayCommand::from_argv(&[" ".into()]).is_none());
    }
}
