//! 卸载编排
//!
//! 严格按检测到的安装来源分发卸载策略，从不猜测：
//! npm → npm uninstall；系统包管理器 → brew/winget uninstall；
//! 脚本安装 → Windows 走兜底链，macOS/Linux 返回手动卸载指引；
//! 未知来源 → 列出全部手动路径。

use crate::models::{InstallMethod, UninstallResult};
use crate::services::tool::detector_trait::ToolDetector;
use crate::services::tool::installer::{run_fallback_chain, ChainOutcome};
use crate::services::tool::tools_config;
use crate::utils::command::{CommandRunner, INSTALL_TIMEOUT};
use crate::utils::installer_scanner;
use crate::utils::platform::PlatformInfo;
use futures_util::future::BoxFuture;
use std::sync::Arc;

/// 卸载服务
pub struct UninstallerService {
    runner: Arc<dyn CommandRunner>,
    platform: PlatformInfo,
}

impl UninstallerService {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: PlatformInfo) -> Self {
        UninstallerService { runner, platform }
    }

    /// 按安装来源卸载工具
    pub async fn uninstall(
        &self,
        detector: &dyn ToolDetector,
        method: InstallMethod,
    ) -> UninstallResult {
        tracing::info!(
            tool_id = detector.tool_id(),
            method = method.as_str(),
            "开始卸载"
        );

        match method {
            InstallMethod::Npm => self.uninstall_npm(detector).await,
            InstallMethod::Brew => self.uninstall_brew(detector).await,
            InstallMethod::Official => self.uninstall_official(detector).await,
            InstallMethod::Unknown => UninstallResult::failure(format!(
                "无法确定 {} 的安装来源，请手动卸载:\n{}",
                detector.tool_name(),
                detector.manual_uninstall_hints().join("\n"),
            )),
        }
    }

    /// npm 来源
    async fn uninstall_npm(&self, detector: &dyn ToolDetector) -> UninstallResult {
        if !self.runner.command_exists("npm").await {
            return UninstallResult::failure(
                "npm 未找到，无法执行 npm 卸载\n\n请确认 Node.js 环境后重试",
            );
        }

        let command = format!("npm uninstall -g {}", detector.npm_package());
        let result = self.runner.run(&command, INSTALL_TIMEOUT).await;

        match result.into_process_result(INSTALL_TIMEOUT) {
            Ok(output) => UninstallResult::ok(
                format!("{} 卸载成功（npm）", detector.tool_name()),
                output,
            ),
            Err(e) => UninstallResult::failure(format!("❌ npm 卸载失败\n\n{e}")),
        }
    }

    /// 系统包管理器来源
    async fn uninstall_brew(&self, detector: &dyn ToolDetector) -> UninstallResult {
        let command = match detector.system_package_uninstall_command(&self.platform) {
            Some(cmd) => cmd,
            None => {
                return UninstallResult::failure(format!(
                    "{} 在 {} 平台没有系统包管理器卸载命令，请手动卸载:\n{}",
                    detector.tool_name(),
                    self.platform.os.as_str(),
                    detector.manual_uninstall_hints().join("\n"),
                ))
            }
        };

        let result = self.runner.run(&command, INSTALL_TIMEOUT).await;
        match result.into_process_result(INSTALL_TIMEOUT) {
            Ok(output) => UninstallResult::ok(
                format!("{} 卸载成功（系统包管理器）", detector.tool_name()),
                output,
            ),
            Err(e) => UninstallResult::failure(format!("❌ 系统包管理器卸载失败\n\n{e}")),
        }
    }

    /// 脚本安装来源
    ///
    /// 只有 Windows 存在可静默调用的卸载路径；其余平台返回
    /// 指向官方卸载脚本的手动指引。
    async fn uninstall_official(&self, detector: &dyn ToolDetector) -> UninstallResult {
        if !tools_config::has_silent_script_uninstall(self.platform.os) {
            return UninstallResult::failure(format!(
                "{} 为脚本安装，当前平台没有静默卸载路径\n\n{}",
                detector.tool_name(),
                detector.manual_uninstall_hints().join("\n"),
            ));
        }

        let tool_name = detector.tool_name().to_string();
        let mut attempts: Vec<(&'static str, BoxFuture<'_, Result<String, String>>)> = Vec::new();

        attempts.push((
            "official-uninstall-script",
            Box::pin(self.try_uninstall_script(detector)),
        ));
        attempts.push((
            "system-package-manager",
            Box::pin(self.try_system_package_uninstall(detector)),
        ));
        attempts.push((
            "bundled-uninstaller",
            Box::pin(self.try_bundled_uninstaller(detector)),
        ));

        match run_fallback_chain(attempts).await {
            ChainOutcome::Success { strategy, output } => UninstallResult::ok(
                format!("{tool_name} 卸载成功（策略: {strategy}）"),
                output,
            ),
            ChainOutcome::Exhausted(failures) => {
                let mut message = format!("❌ {tool_name} 所有卸载方式均失败\n");
                for failure in &failures {
                    message.push_str(&format!("\n[{}] {}", failure.strategy, failure.reason));
                }
                message.push_str("\n\n可尝试的手动方式:\n");
                message.push_str(&detector.manual_uninstall_hints().join("\n"));
                UninstallResult::failure(message)
            }
        }
    }

    async fn try_uninstall_script(&self, detector: &dyn ToolDetector) -> Result<String, String> {
        let command = detector
            .uninstall_script_command(&self.platform)
            .ok_or_else(|| "该工具没有官方卸载脚本".to_string())?;

        let result = self.runner.run(&command, INSTALL_TIMEOUT).await;
        result
            .into_process_result(INSTALL_TIMEOUT)
            .map_err(|e| e.to_string())
    }

    async fn try_system_package_uninstall(
        &self,
        detector: &dyn ToolDetector,
    ) -> Result<String, String> {
        let command = detector
            .system_package_uninstall_command(&self.platform)
            .ok_or_else(|| "该平台没有对应的系统包管理器卸载命令".to_string())?;

        let result = self.runner.run(&command, INSTALL_TIMEOUT).await;
        result
            .into_process_result(INSTALL_TIMEOUT)
            .map_err(|e| e.to_string())
    }

    async fn try_bundled_uninstaller(
        &self,
        detector: &dyn ToolDetector,
    ) -> Result<String, String> {
        let candidates =
            installer_scanner::known_uninstaller_candidates(detector.tool_id(), &self.platform);
        let found = installer_scanner::scan_existing(candidates);

        if found.is_empty() {
            return Err("已知位置未找到卸载器二进制".to_string());
        }

        let mut reasons = Vec::new();
        for uninstaller in found {
            let command = if self.platform.is_windows() {
                format!("\"{}\" /S", uninstaller.display())
            } else {
                format!("sh \"{}\"", uninstaller.display())
            };

            let result = self.runner.run(&command, INSTALL_TIMEOUT).await;
            match result.into_process_result(INSTALL_TIMEOUT) {
                Ok(output) => return Ok(output),
                Err(e) => reasons.push(format!("{}: {e}", uninstaller.display())),
            }
        }

        Err(reasons.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tool::detectors::{ClaudeCodeDetector, CodexDetector};
    use crate::utils::command::testing::ScriptedRunner;
    use crate::utils::platform::OsFamily;

    fn uninstaller(
        runner: ScriptedRunner,
        os: OsFamily,
    ) -> (UninstallerService, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (
            UninstallerService::new(runner.clone(), PlatformInfo::for_os(os)),
            runner,
        )
    }

    #[tokio::test]
    async fn test_npm_uninstall_dispatch() {
        let (service, runner) = uninstaller(
            ScriptedRunner::new()
                .ok("which npm", "/usr/bin/npm")
                .ok("npm uninstall -g @anthropic-ai/claude-code", "removed 1 package"),
            OsFamily::Linux,
        );

        let result = service
            .uninstall(&ClaudeCodeDetector, InstallMethod::Npm)
            .await;

        assert!(result.success);
        assert_eq!(
            runner.calls_matching("npm uninstall -g @anthropic-ai/claude-code"),
            1
        );
    }

    #[tokio::test]
    async fn test_brew_uninstall_dispatch() {
        let (service, runner) = uninstaller(
            ScriptedRunner::new().ok("brew uninstall --cask codex", "Uninstalling codex"),
            OsFamily::Macos,
        );

        let result = service.uninstall(&CodexDetector, InstallMethod::Brew).await;

        assert!(result.success);
        assert_eq!(runner.calls_matching("brew uninstall"), 1);
    }

    // 脚本安装来源在没有静默卸载路径的平台上给出手动指引，零进程调用
    #[tokio::test]
    async fn test_official_uninstall_manual_on_unix() {
        let (service, runner) = uninstaller(ScriptedRunner::new(), OsFamily::Macos);

        let result = service
            .uninstall(&ClaudeCodeDetector, InstallMethod::Official)
            .await;

        assert!(!result.success);
        assert!(result.message.contains("claude uninstall"));
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_official_uninstall_chain_on_windows() {
        // 卸载脚本失败 → winget 成功
        let (service, _runner) = uninstaller(
            ScriptedRunner::new()
                .fail("powershell", "script error")
                .ok("winget uninstall", "Successfully uninstalled"),
            OsFamily::Windows,
        );

        let result = service
            .uninstall(&ClaudeCodeDetector, InstallMethod::Official)
            .await;

        assert!(result.success);
        assert!(result.message.contains("system-package-manager"));
    }

    #[tokio::test]
    async fn test_unknown_provenance_lists_manual_paths() {
        let (service, runner) = uninstaller(ScriptedRunner::new(), OsFamily::Linux);

        let result = service
            .uninstall(&ClaudeCodeDetector, InstallMethod::Unknown)
            .await;

        assert!(!result.success);
        assert!(result.message.contains("npm uninstall -g"));
        assert!(result.message.contains("claude uninstall"));
        assert_eq!(runner.call_count(), 0);
    }
}
