//! 安装 / 卸载 / 进程操作
//!
//! 卸载的来源判定只依赖观测到的安装来源：优先取有效缓存，否则
//! 现场完整检测，从不按用户输入猜测。安装或卸载成功后使相关
//! 缓存条目失效，下次检测重新观测真实状态。

use super::ToolRegistry;
use crate::models::{InstallMethod, InstallResult, NodeEnvironment, UninstallResult};
use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;

impl ToolRegistry {
    /// 以指定方式安装工具
    pub async fn install_tool(&self, tool_id: &str, method: InstallMethod) -> Result<InstallResult> {
        self.install_tool_with_progress(tool_id, method, None).await
    }

    /// 安装工具并逐行转发安装脚本输出
    pub async fn install_tool_with_progress(
        &self,
        tool_id: &str,
        method: InstallMethod,
        progress: Option<UnboundedSender<String>>,
    ) -> Result<InstallResult> {
        let detector = self.detector(tool_id)?;
        let result = self
            .installer
            .install_with_progress(detector.as_ref(), method, progress)
            .await;

        if result.success {
            // 旧的否定/过期结果作废，下次检测观测新状态
            self.forget(tool_id);
        }
        Ok(result)
    }

    /// 卸载工具，按观测到的安装来源分发
    pub async fn uninstall_tool(&self, tool_id: &str) -> Result<UninstallResult> {
        let detector = self.detector(tool_id)?;

        // 来源判定：有效缓存优先，否则现场完整检测
        let observed = match self.cache.get(tool_id) {
            Some(cached) => cached,
            None => {
                let fresh = detector
                    .full_check(self.runner.as_ref(), &self.platform)
                    .await;
                self.remember(tool_id, fresh.clone());
                fresh
            }
        };

        if !observed.installed {
            return Ok(UninstallResult::ok(
                format!("{} 未安装，无需卸载", detector.tool_name()),
                String::new(),
            ));
        }

        let method = observed.install_method.unwrap_or(InstallMethod::Unknown);
        let result = self.uninstaller.uninstall(detector.as_ref(), method).await;

        if result.success {
            self.forget(tool_id);
        }
        Ok(result)
    }

    /// 工具进程是否在运行（实时探测，不缓存）
    pub async fn is_tool_running(&self, tool_id: &str) -> Result<bool> {
        let detector = self.detector(tool_id)?;
        Ok(self.lifecycle.is_running(detector.process_name()).await)
    }

    /// 终止工具进程（优雅 → 强制），进程不存在时也返回成功
    pub async fn kill_tool(&self, tool_id: &str) -> Result<bool> {
        let detector = self.detector(tool_id)?;
        Ok(self.lifecycle.terminate(detector.process_name()).await)
    }

    /// 检测 Node/npm 环境
    pub async fn node_environment(&self) -> NodeEnvironment {
        self.installer.node_environment().await
    }
}
