//! 安装编排
//!
//! 每次安装：能力矩阵查表 → 前置条件检查 → 执行 → 报告。
//! 官方脚本方式按有序兜底链执行：官方脚本 → 系统包管理器 →
//! 扫描已知安装器二进制静默调用；全部失败时聚合每一步的失败
//! 原因并列出手动修复选项。

use crate::models::{InstallMethod, InstallResult, NodeEnvironment};
use crate::services::tool::detector_trait::{extract_version, ToolDetector};
use crate::services::tool::tools_config;
use crate::utils::command::{
    CommandRunner, INSTALL_TIMEOUT, VERSION_QUERY_TIMEOUT,
};
use crate::utils::installer_scanner;
use crate::utils::platform::PlatformInfo;
use futures_util::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// npm 安装方式要求的最低 Node.js 主版本
pub const MIN_NODE_MAJOR: u64 = 18;

/// 兜底链中单个策略的失败记录
pub(crate) struct StrategyFailure {
    pub strategy: &'static str,
    pub reason: String,
}

/// 兜底链的终态
pub(crate) enum ChainOutcome {
    Success {
        strategy: &'static str,
        output: String,
    },
    Exhausted(Vec<StrategyFailure>),
}

/// 有序策略组合器：从左到右求值，返回首个成功，
/// 或携带每个策略失败原因的聚合失败。
pub(crate) async fn run_fallback_chain(
    attempts: Vec<(&'static str, BoxFuture<'_, Result<String, String>>)>,
) -> ChainOutcome {
    let mut failures = Vec::new();

    for (strategy, attempt) in attempts {
        tracing::info!(strategy = strategy, "尝试策略");
        match attempt.await {
            Ok(output) => {
                tracing::info!(strategy = strategy, "策略成功");
                return ChainOutcome::Success { strategy, output };
            }
            Err(reason) => {
                tracing::warn!(strategy = strategy, reason = %reason, "策略失败，继续下一个");
                failures.push(StrategyFailure { strategy, reason });
            }
        }
    }

    ChainOutcome::Exhausted(failures)
}

/// 安装服务
pub struct InstallerService {
    runner: Arc<dyn CommandRunner>,
    platform: PlatformInfo,
}

impl InstallerService {
    pub fn new(runner: Arc<dyn CommandRunner>, platform: PlatformInfo) -> Self {
        InstallerService { runner, platform }
    }

    /// 安装工具
    ///
    /// 平台/方式不匹配与前置条件不满足都在任何进程启动之前拒绝。
    pub async fn install(
        &self,
        detector: &dyn ToolDetector,
        method: InstallMethod,
    ) -> InstallResult {
        self.install_with_progress(detector, method, None).await
    }

    /// 安装工具，可选地逐行转发安装脚本输出
    pub async fn install_with_progress(
        &self,
        detector: &dyn ToolDetector,
        method: InstallMethod,
        progress: Option<UnboundedSender<String>>,
    ) -> InstallResult {
        let tool_id = detector.tool_id();

        // 能力矩阵查表：不支持的 (工具, 平台, 方式) 直接拒绝，零进程调用
        if !tools_config::method_supported(tool_id, self.platform.os, method) {
            return InstallResult::failure(format!(
                "{} 在 {} 平台不支持「{}」安装方式\n\n可用方式: {}",
                detector.tool_name(),
                self.platform.os.as_str(),
                method.label(),
                available_methods_text(tool_id, &self.platform),
            ));
        }

        match method {
            InstallMethod::Npm => self.install_npm(detector).await,
            InstallMethod::Brew => self.install_brew(detector).await,
            InstallMethod::Official => self.install_official(detector, progress).await,
            InstallMethod::Unknown => InstallResult::failure(format!(
                "无法以「未知来源」方式安装\n\n{}",
                detector.manual_install_hints().join("\n"),
            )),
        }
    }

    /// 检测 Node/npm 环境
    pub async fn node_environment(&self) -> NodeEnvironment {
        let node = self.runner.run("node --version", VERSION_QUERY_TIMEOUT).await;
        let npm = self.runner.run("npm --version", VERSION_QUERY_TIMEOUT).await;

        NodeEnvironment {
            node_available: node.success,
            node_version: node.success.then(|| node.stdout.trim().to_string()),
            npm_available: npm.success,
            npm_version: npm.success.then(|| npm.stdout.trim().to_string()),
        }
    }

    /// npm 方式的前置条件：Node.js 主版本 >= 18
    ///
    /// 返回 Some(失败结果) 表示不满足；检查本身只调用一次 node。
    async fn node_prerequisite(&self) -> Option<InstallResult> {
        let result = self.runner.run("node --version", VERSION_QUERY_TIMEOUT).await;
        if !result.success {
            return Some(InstallResult::failure(format!(
                "未检测到 Node.js\n\n请先安装 Node.js {MIN_NODE_MAJOR} 或更高版本: https://nodejs.org"
            )));
        }

        let raw = result.stdout.trim();
        let parsed = extract_version(raw).and_then(|v| semver::Version::parse(&v).ok());

        match parsed {
            Some(version) if version.major >= MIN_NODE_MAJOR => None,
            Some(version) => Some(InstallResult::failure(format!(
                "Node.js 版本过低: {version}\n\nnpm 安装方式要求 Node.js 主版本 >= {MIN_NODE_MAJOR}，请升级后重试"
            ))),
            None => {
                // 版本字符串无法解析时不阻塞安装，只记录
                tracing::warn!(output = %raw, "无法解析 Node.js 版本号");
                None
            }
        }
    }

    /// 使用 npm 安装
    async fn install_npm(&self, detector: &dyn ToolDetector) -> InstallResult {
        if let Some(unmet) = self.node_prerequisite().await {
            return unmet;
        }

        if !self.runner.command_exists("npm").await {
            return InstallResult::failure(
                "npm 未安装或未找到\n\n请先安装 Node.js（包含 npm）: https://nodejs.org",
            );
        }

        let command = format!("npm install -g {}@latest", detector.npm_package());
        let result = self.runner.run(&command, INSTALL_TIMEOUT).await;

        match result.into_process_result(INSTALL_TIMEOUT) {
            Ok(output) => InstallResult::ok(
                format!("{} 安装成功（npm）", detector.tool_name()),
                output,
            ),
            Err(e) => InstallResult::failure_with_output(
                format!("❌ npm 安装失败\n\n{e}"),
                String::new(),
            ),
        }
    }

    /// 使用系统包管理器安装
    async fn install_brew(&self, detector: &dyn ToolDetector) -> InstallResult {
        let command = match detector.system_package_install_command(&self.platform) {
            Some(cmd) => cmd,
            None => {
                return InstallResult::failure(format!(
                    "{} 在 {} 平台没有系统包管理器安装包",
                    detector.tool_name(),
                    self.platform.os.as_str(),
                ))
            }
        };

        if self.platform.is_macos() && !self.runner.command_exists("brew").await {
            return InstallResult::failure(
                "❌ Homebrew 未安装\n\n请先安装 Homebrew: https://brew.sh",
            );
        }

        let result = self.runner.run(&command, INSTALL_TIMEOUT).await;
        match result.into_process_result(INSTALL_TIMEOUT) {
            Ok(output) => InstallResult::ok(
                format!("{} 安装成功（系统包管理器）", detector.tool_name()),
                output,
            ),
            Err(e) => InstallResult::failure_with_output(
                format!("❌ 系统包管理器安装失败\n\n{e}"),
                String::new(),
            ),
        }
    }

    /// 官方脚本方式：有序兜底链
    async fn install_official(
        &self,
        detector: &dyn ToolDetector,
        progress: Option<UnboundedSender<String>>,
    ) -> InstallResult {
        let tool_name = detector.tool_name().to_string();

        let mut attempts: Vec<(&'static str, BoxFuture<'_, Result<String, String>>)> = Vec::new();

        attempts.push((
            "official-script",
            Box::pin(self.try_install_script(detector, progress)),
        ));
        attempts.push((
            "system-package-manager",
            Box::pin(self.try_system_package(detector)),
        ));
        attempts.push((
            "bundled-installer",
            Box::pin(self.try_bundled_installer(detector)),
        ));

        match run_fallback_chain(attempts).await {
            ChainOutcome::Success { strategy, output } => InstallResult::ok(
                format!("{tool_name} 安装成功（策略: {strategy}）"),
                output,
            ),
            ChainOutcome::Exhausted(failures) => {
                let mut message = format!("❌ {tool_name} 所有安装方式均失败\n");
                for failure in &failures {
                    message.push_str(&format!("\n[{}] {}", failure.strategy, failure.reason));
                }
                message.push_str("\n\n可尝试的手动方式:\n");
                message.push_str(&detector.manual_install_hints().join("\n"));
                InstallResult::failure(message)
            }
        }
    }

    /// 策略 1：官方安装脚本（流式输出）
    async fn try_install_script(
        &self,
        detector: &dyn ToolDetector,
        progress: Option<UnboundedSender<String>>,
    ) -> Result<String, String> {
        let command = detector
            .install_script_command(&self.platform)
            .ok_or_else(|| "该工具没有官方安装脚本".to_string())?;

        let lines = match progress {
            Some(tx) => tx,
            None => tokio::sync::mpsc::unbounded_channel().0,
        };

        let result = self
            .runner
            .run_streaming(&command, INSTALL_TIMEOUT, lines)
            .await;
        result
            .into_process_result(INSTALL_TIMEOUT)
            .map_err(|e| e.to_string())
    }

    /// 策略 2：系统包管理器
    async fn try_system_package(&self, detector: &dyn ToolDetector) -> Result<String, String> {
        let command = detector
            .system_package_install_command(&self.platform)
            .ok_or_else(|| "该平台没有对应的系统包管理器安装包".to_string())?;

        if self.platform.is_macos() && !self.runner.command_exists("brew").await {
            return Err("Homebrew 未安装".to_string());
        }

        let result = self.runner.run(&command, INSTALL_TIMEOUT).await;
        result
            .into_process_result(INSTALL_TIMEOUT)
            .map_err(|e| e.to_string())
    }

    /// 策略 3：扫描已知位置的安装器二进制并静默调用
    async fn try_bundled_installer(&self, detector: &dyn ToolDetector) -> Result<String, String> {
        let candidates =
            installer_scanner::known_installer_candidates(detector.tool_id(), &self.platform);
        let found = installer_scanner::scan_existing(candidates);

        if found.is_empty() {
            return Err("已知位置未找到安装器二进制".to_string());
        }

        let mut reasons = Vec::new();
        for installer in found {
            let command = if self.platform.is_windows() {
                format!("\"{}\" /S", installer.display())
            } else {
                format!("sh \"{}\"", installer.display())
            };

            let result = self.runner.run(&command, INSTALL_TIMEOUT).await;
            match result.into_process_result(INSTALL_TIMEOUT) {
                Ok(output) => return Ok(output),
                Err(e) => reasons.push(format!("{}: {e}", installer.display())),
            }
        }

        Err(reasons.join("; "))
    }
}

fn available_methods_text(tool_id: &str, platform: &PlatformInfo) -> String {
    let methods = tools_config::install_methods_for(tool_id, platform.os);
    if methods.is_empty() {
        "无".to_string()
    } else {
        methods
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join("、")
    }
}
