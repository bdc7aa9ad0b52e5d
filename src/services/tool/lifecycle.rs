//! 进程生命周期管理
//!
//! 运行状态永远实时探测，不进缓存。进程名按完全匹配过滤
//! （pgrep -x / tasklist IMAGENAME eq），避免误伤同名片段的
//! 无关进程。终止操作幂等：目标进程本就不存在时同样视为成功。

use crate::utils::command::{CommandRunner, QUICK_PROBE_TIMEOUT};
use crate::utils::platform::PlatformInfo;
use std::sync::Arc;
use std::time::Duration;

/// 优雅终止信号后的等待时间
const TERMINATE_GRACE: Duration = Duration::from_secs(1);

/// 进程生命周期管理器
pub struct ProcessLifecycle {
    runner: Arc<dyn CommandRunner>,
    platform: PlatformInfo,
}

impl ProcessLifecycle {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: PlatformInfo) -> Self {
        ProcessLifecycle { runner, platform }
    }

    /// 检测进程是否在运行（完全匹配进程名）
    ///
    /// tasklist 过滤无结果时仍然退出 0，所以必须检查输出内容
    /// 是否真的包含目标进程名，不能只看退出码。
    pub async fn is_running(&self, process_name: &str) -> bool {
        if self.platform.is_windows() {
            let image = format!("{process_name}.exe");
            let command = format!("tasklist /FI \"IMAGENAME eq {image}\" /FO CSV /NH");
            let result = self.runner.run(&command, QUICK_PROBE_TIMEOUT).await;

            result.success
                && result
                    .stdout
                    .to_lowercase()
                    .contains(&format!("\"{}\"", image.to_lowercase()))
        } else {
            let command = format!("pgrep -x {process_name}");
            let result = self.runner.run(&command, QUICK_PROBE_TIMEOUT).await;

            result.success && !result.stdout.trim().is_empty()
        }
    }

    /// 终止进程：先优雅信号，等待后复查，仍存活再强制
    ///
    /// 返回 true 表示终态为"无此进程"，包括一开始就没有的情况。
    pub async fn terminate(&self, process_name: &str) -> bool {
        if !self.is_running(process_name).await {
            tracing::debug!(process = process_name, "进程不存在，无需终止");
            return true;
        }

        tracing::info!(process = process_name, "发送优雅终止信号");
        self.send_terminate(process_name, false).await;
        tokio::time::sleep(TERMINATE_GRACE).await;

        if !self.is_running(process_name).await {
            return true;
        }

        tracing::warn!(process = process_name, "优雅终止无效，强制终止");
        self.send_terminate(process_name, true).await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        !self.is_running(process_name).await
    }

    async fn send_terminate(&self, process_name: &str, force: bool) {
        let command = if self.platform.is_windows() {
            let image = format!("{process_name}.exe");
            if force {
                format!("taskkill /F /IM {image}")
            } else {
                format!("taskkill /IM {image}")
            }
        } else if force {
            format!("pkill -9 -x {process_name}")
        } else {
            format!("pkill -x {process_name}")
        };

        let result = self.runner.run(&command, QUICK_PROBE_TIMEOUT).await;
        if !result.success {
            // 进程可能恰好在信号发出前退出，由随后的复查判定
            tracing::debug!(command = %command, stderr = %result.stderr, "终止命令未成功");
        }
    }
}
