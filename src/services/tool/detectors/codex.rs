// CodeX Detector
//
// CodeX 的检测实现：macOS 上优先识别 Homebrew cask 安装

use super::super::detector_trait::ToolDetector;
use crate::models::{InstallMethod, ToolCheckResult};
use crate::utils::command::{CommandRunner, PACKAGE_QUERY_TIMEOUT};
use crate::utils::platform::PlatformInfo;
use async_trait::async_trait;

/// CodeX 工具检测器
pub struct CodexDetector;

#[async_trait]
impl ToolDetector for CodexDetector {
    fn tool_id(&self) -> &str {
        "codex"
    }

    fn tool_name(&self) -> &str {
        "CodeX"
    }

    fn npm_package(&self) -> &str {
        "@openai/codex"
    }

    fn executable(&self) -> &str {
        "codex"
    }

    fn system_package_install_command(&self, platform: &PlatformInfo) -> Option<String> {
        if platform.is_macos() {
            Some("brew install --cask codex".to_string())
        } else {
            None
        }
    }

    fn system_package_uninstall_command(&self, platform: &PlatformInfo) -> Option<String> {
        if platform.is_macos() {
            Some("brew uninstall --cask codex".to_string())
        } else {
            None
        }
    }

    fn manual_install_hints(&self) -> Vec<String> {
        vec![
            format!("手动执行: npm install -g {}@latest", self.npm_package()),
            "macOS 可使用: brew install --cask codex".to_string(),
        ]
    }

    fn manual_uninstall_hints(&self) -> Vec<String> {
        vec![
            format!("npm 安装时: npm uninstall -g {}", self.npm_package()),
            "Homebrew 安装时: brew uninstall --cask codex".to_string(),
        ]
    }

    /// macOS 上先检查 brew cask；命中即短路后续探测
    async fn pre_probe(
        &self,
        runner: &dyn CommandRunner,
        platform: &PlatformInfo,
    ) -> Option<ToolCheckResult> {
        if !platform.is_macos() || !runner.command_exists("brew").await {
            return None;
        }

        let result = runner
            .run("brew list --cask codex 2>/dev/null", PACKAGE_QUERY_TIMEOUT)
            .await;
        if !result.success || !result.stdout.contains("codex") {
            return None;
        }

        let path = runner.resolve_executable(self.executable()).await;
        let version = self.query_version(runner).await;
        Some(ToolCheckResult::installed(path, version, InstallMethod::Brew))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::testing::ScriptedRunner;
    use crate::utils::platform::OsFamily;

    #[test]
    fn test_basic_info() {
        let detector = CodexDetector;
        assert_eq!(detector.tool_id(), "codex");
        assert_eq!(detector.npm_package(), "@openai/codex");
        assert_eq!(detector.executable(), "codex");
    }

    #[tokio::test]
    async fn test_brew_cask_short_circuits_on_macos() {
        let runner = ScriptedRunner::new()
            .ok("which brew", "/opt/homebrew/bin/brew")
            .ok("brew list --cask codex", "codex")
            .ok("which codex", "/opt/homebrew/bin/codex")
            .ok("codex --version", "codex-cli 0.9.0");
        let platform = PlatformInfo::for_os(OsFamily::Macos);

        let result = CodexDetector.full_check(&runner, &platform).await;

        assert!(result.installed);
        assert_eq!(result.install_method, Some(InstallMethod::Brew));
        assert_eq!(result.version.as_deref(), Some("0.9.0"));
        // 没有触发 npm 探测
        assert_eq!(runner.calls_matching("npm"), 0);
    }

    #[tokio::test]
    async fn test_brew_probe_skipped_on_linux() {
        let runner = ScriptedRunner::new()
            .fail("which npm", "not found")
            .fail("which codex", "not found");
        let platform = PlatformInfo::for_os(OsFamily::Linux);

        let result = CodexDetector.full_check(&runner, &platform).await;

        assert!(!result.installed);
        assert_eq!(runner.calls_matching("brew"), 0);
    }
}
