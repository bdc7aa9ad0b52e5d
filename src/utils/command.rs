// 命令执行原语
//
// 所有外部进程调用都经过这里：带超时、捕获输出、分类结果。
// 检测探针的失败（超时/非零退出/启动失败）由调用方折叠为"未找到"，
// 不会作为错误向外传播。

use crate::utils::platform::PlatformInfo;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

/// 存在性探针超时（which/where、进程枚举）
pub const QUICK_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// 版本查询超时
pub const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(10);
/// 包管理器查询超时（npm list 等）
pub const PACKAGE_QUERY_TIMEOUT: Duration = Duration::from_secs(15);
/// 安装/卸载命令超时
pub const INSTALL_TIMEOUT: Duration = Duration::from_secs(30);

/// 进程调用错误分类
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("命令执行超时（{0:?}）")]
    Timeout(Duration),

    #[error("命令退出码非零（{code:?}）: {stderr}")]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("进程启动失败: {0}")]
    Spawn(String),
}

/// 命令执行结果
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl CommandResult {
    pub fn from_output(output: std::process::Output) -> Self {
        CommandResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            exit_code: output.status.code(),
            timed_out: false,
        }
    }

    pub fn from_spawn_error(error: std::io::Error) -> Self {
        CommandResult {
            success: false,
            stdout: String::new(),
            stderr: error.to_string(),
            exit_code: None,
            timed_out: false,
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        CommandResult {
            success: false,
            stdout: String::new(),
            stderr: format!("执行超过 {} 秒未完成", timeout.as_secs()),
            exit_code: None,
            timed_out: true,
        }
    }

    /// 按错误分类转换为 Result（安装/卸载路径使用；检测路径直接折叠为否定信号）
    pub fn into_process_result(self, timeout: Duration) -> Result<String, ProcessError> {
        if self.timed_out {
            return Err(ProcessError::Timeout(timeout));
        }
        if self.success {
            return Ok(self.stdout);
        }
        if self.exit_code.is_some() {
            Err(ProcessError::NonZeroExit {
                code: self.exit_code,
                stderr: self.stderr,
            })
        } else {
            Err(ProcessError::Spawn(self.stderr))
        }
    }
}

/// 命令执行接口
///
/// 生产实现为 [`CommandExecutor`]；测试中用脚本化实现替换，
/// 以便对"零进程调用"这类属性做断言。
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// 执行命令并等待结束，超时后结果标记 `timed_out`
    async fn run(&self, command: &str, timeout: Duration) -> CommandResult;

    /// 流式执行：逐行转发 stdout/stderr（安装脚本的实时日志）
    ///
    /// 默认实现退化为一次性执行后按行转发。
    async fn run_streaming(
        &self,
        command: &str,
        timeout: Duration,
        lines: UnboundedSender<String>,
    ) -> CommandResult {
        let result = self.run(command, timeout).await;
        for line in result.stdout.lines().chain(result.stderr.lines()) {
            let _ = lines.send(line.to_string());
        }
        result
    }

    /// 解析可执行文件路径（which/where，短超时）
    ///
    /// 任何失败都返回 None，不区分原因。
    async fn resolve_executable(&self, name: &str) -> Option<String> {
        let lookup = if cfg!(windows) {
            format!("where {name}")
        } else {
            format!("which {name}")
        };

        let result = self.run(&lookup, QUICK_PROBE_TIMEOUT).await;
        if !result.success {
            return None;
        }

        let first = result.stdout.lines().next()?.trim();
        if first.is_empty() {
            None
        } else {
            Some(first.to_string())
        }
    }

    /// 检查命令是否存在
    async fn command_exists(&self, name: &str) -> bool {
        self.resolve_executable(name).await.is_some()
    }
}

/// 命令执行器（生产实现）
///
/// 统一通过 shell 执行（`sh -c` / `cmd /C`），使用增强的 PATH。
pub struct CommandExecutor {
    platform: PlatformInfo,
}

impl CommandExecutor {
    pub fn new() -> Self {
        CommandExecutor {
            platform: PlatformInfo::current(),
        }
    }

    fn build_command(&self, command_str: &str) -> Command {
        let enhanced_path = self.platform.build_enhanced_path();

        let mut cmd = if self.platform.is_windows() {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command_str]);
            #[cfg(windows)]
            cmd.creation_flags(0x08000000); // CREATE_NO_WINDOW
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command_str]);
            cmd
        };

        cmd.env("PATH", enhanced_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for CommandExecutor {
    async fn run(&self, command: &str, timeout: Duration) -> CommandResult {
        let mut cmd = self.build_command(command);

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => CommandResult::from_output(output),
            Ok(Err(e)) => {
                tracing::warn!(command = %command, error = %e, "进程启动失败");
                CommandResult::from_spawn_error(e)
            }
            Err(_) => {
                tracing::warn!(command = %command, timeout_secs = timeout.as_secs(), "命令执行超时");
                CommandResult::timed_out(timeout)
            }
        }
    }

    async fn run_streaming(
        &self,
        command: &str,
        timeout: Duration,
        lines: UnboundedSender<String>,
    ) -> CommandResult {
        let mut cmd = self.build_command(command);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(command = %command, error = %e, "进程启动失败");
                return CommandResult::from_spawn_error(e);
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stdout_lines = lines.clone();
        let stdout_task = tokio::spawn(async move {
            let mut collected = String::new();
            if let Some(out) = stdout {
                let mut reader = BufReader::new(out).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    let _ = stdout_lines.send(line.clone());
                    collected.push_str(&line);
                    collected.push('\n');
                }
            }
            collected
        });

        let stderr_lines = lines;
        let stderr_task = tokio::spawn(async move {
            let mut collected = String::new();
            if let Some(err) = stderr {
                let mut reader = BufReader::new(err).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    let _ = stderr_lines.send(line.clone());
                    collected.push_str(&line);
                    collected.push('\n');
                }
            }
            collected
        });

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return CommandResult::from_spawn_error(e),
            Err(_) => {
                let _ = child.start_kill();
                tracing::warn!(command = %command, timeout_secs = timeout.as_secs(), "流式命令超时，已终止");
                return CommandResult::timed_out(timeout);
            }
        };

        let stdout_text = stdout_task.await.unwrap_or_default();
        let stderr_text = stderr_task.await.unwrap_or_default();

        CommandResult {
            success: status.success(),
            stdout: stdout_text.trim().to_string(),
            stderr: stderr_text.trim().to_string(),
            exit_code: status.code(),
            timed_out: false,
        }
    }
}
