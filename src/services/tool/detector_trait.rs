// Tool Detector Trait - 工具检测器接口
//
// 每个受管 AI CLI 工具实现此 trait。快速检测（只判存在）和完整检测
// （安装状态/路径/版本/来源）的通用逻辑放在默认实现里，工具只补充
// 自己的差异（包名、可执行文件名、安装脚本等）。

use crate::models::{InstallMethod, ToolCheckResult};
use crate::services::tool::tools_config::classify_install_path;
use crate::utils::command::{
    CommandRunner, PACKAGE_QUERY_TIMEOUT, VERSION_QUERY_TIMEOUT,
};
use crate::utils::platform::PlatformInfo;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static VERSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"v?(\d+\.\d+\.\d+(?:-[\w.]+)?)").expect("版本号正则无效"));

/// 从命令输出中提取版本号
///
/// 匹配格式：v1.2.3 或 1.2.3-beta.1
pub fn extract_version(output: &str) -> Option<String> {
    VERSION_RE
        .captures(output)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

/// 工具检测器 Trait
#[async_trait]
pub trait ToolDetector: Send + Sync {
    // ==================== 基础信息 ====================

    /// 工具唯一标识（如 "claude-code"）
    fn tool_id(&self) -> &str;

    /// 工具显示名称（如 "Claude Code"）
    fn tool_name(&self) -> &str;

    /// npm 包名（如 "@anthropic-ai/claude-code"）
    fn npm_package(&self) -> &str;

    /// 可执行文件名（如 "claude"）
    fn executable(&self) -> &str;

    /// 进程名（用于运行状态检测与终止，默认同可执行文件名）
    fn process_name(&self) -> &str {
        self.executable()
    }

    /// 版本查询命令
    fn version_command(&self) -> String {
        format!("{} --version", self.executable())
    }

    // ==================== 安装相关数据 ====================

    /// 官方安装脚本命令（None 表示该平台没有官方脚本）
    fn install_script_command(&self, _platform: &PlatformInfo) -> Option<String> {
        None
    }

    /// 系统包管理器安装命令（brew / winget）
    fn system_package_install_command(&self, _platform: &PlatformInfo) -> Option<String> {
        None
    }

    /// 系统包管理器卸载命令
    fn system_package_uninstall_command(&self, _platform: &PlatformInfo) -> Option<String> {
        None
    }

    /// 官方卸载脚本命令（用于脚本安装来源的卸载兜底链）
    fn uninstall_script_command(&self, _platform: &PlatformInfo) -> Option<String> {
        None
    }

    /// 手动修复提示（所有自动方式失败时完整列出）
    fn manual_install_hints(&self) -> Vec<String> {
        vec![format!(
            "手动执行: npm install -g {}@latest",
            self.npm_package()
        )]
    }

    /// 手动卸载提示
    fn manual_uninstall_hints(&self) -> Vec<String> {
        vec![format!("手动执行: npm uninstall -g {}", self.npm_package())]
    }

    // ==================== 检测逻辑 ====================

    /// 快速检测：只做一次可执行文件解析，短超时
    ///
    /// 不产生路径/版本/来源细节。
    async fn quick_check(&self, runner: &dyn CommandRunner) -> bool {
        runner.resolve_executable(self.executable()).await.is_some()
    }

    /// 工具特有的前置探测（如 brew cask），命中时短路完整检测
    async fn pre_probe(
        &self,
        _runner: &dyn CommandRunner,
        _platform: &PlatformInfo,
    ) -> Option<ToolCheckResult> {
        None
    }

    /// 完整检测：有序短路探测链
    ///
    /// 1. npm 全局包探测（包存在时以 `npm root -g` 解析安装根目录）
    /// 2. 可执行文件解析 + 按已知目录表识别安装来源
    /// 3. 两者都未命中 → 完整否定结果
    ///
    /// 版本查询失败不影响肯定结果，版本字段直接省略。
    async fn full_check(
        &self,
        runner: &dyn CommandRunner,
        platform: &PlatformInfo,
    ) -> ToolCheckResult {
        if let Some(result) = self.pre_probe(runner, platform).await {
            return result;
        }

        // 探测 1：npm 全局包
        if let Some(path) = self.npm_probe(runner).await {
            let version = self.query_version(runner).await;
            return ToolCheckResult::installed(path, version, InstallMethod::Npm);
        }

        // 探测 2：可执行文件解析 + 路径分类
        if let Some(path) = runner.resolve_executable(self.executable()).await {
            let method = classify_install_path(&path, platform.os);
            let version = self.query_version(runner).await;
            return ToolCheckResult::installed(Some(path), version, method);
        }

        ToolCheckResult::not_installed()
    }

    /// 查询已安装版本（尽力而为）
    async fn query_version(&self, runner: &dyn CommandRunner) -> Option<String> {
        let result = runner
            .run(&self.version_command(), VERSION_QUERY_TIMEOUT)
            .await;
        if result.success {
            extract_version(&result.stdout)
        } else {
            None
        }
    }

    /// npm 全局包探测
    ///
    /// 返回 Some(安装根路径) 表示包已安装；"(empty)" 标记只是尽力而为的
    /// 否定信号，真正的肯定证据是 `npm root -g` 下能定位到包目录。
    async fn npm_probe(&self, runner: &dyn CommandRunner) -> Option<Option<String>> {
        if !runner.command_exists("npm").await {
            return None;
        }

        let redirect = if cfg!(windows) { "2>nul" } else { "2>/dev/null" };
        let list_cmd = format!(
            "npm list -g {} --depth=0 {redirect}",
            self.npm_package()
        );
        let listed = runner.run(&list_cmd, PACKAGE_QUERY_TIMEOUT).await;

        if !listed.success
            || listed.stdout.contains("(empty)")
            || !listed.stdout.contains(self.npm_package())
        {
            return None;
        }

        // 解析实际安装根目录作为更可靠的证据
        let root = runner.run("npm root -g", PACKAGE_QUERY_TIMEOUT).await;
        let path = if root.success {
            root.stdout.lines().next().map(|r| {
                Path::new(r.trim())
                    .join(self.npm_package())
                    .to_string_lossy()
                    .to_string()
            })
        } else {
            None
        };

        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::testing::ScriptedRunner;
    use crate::utils::platform::OsFamily;

    /// 通用检测器：只给出必需的基础信息，全部逻辑走默认实现
    struct PlainDetector {
        id: &'static str,
        package: &'static str,
        exec: &'static str,
    }

    #[async_trait]
    impl ToolDetector for PlainDetector {
        fn tool_id(&self) -> &str {
            self.id
        }
        fn tool_name(&self) -> &str {
            self.id
        }
        fn npm_package(&self) -> &str {
            self.package
        }
        fn executable(&self) -> &str {
            self.exec
        }
    }

    fn tool_a() -> PlainDetector {
        PlainDetector {
            id: "tool-a",
            package: "@example/tool-a",
            exec: "toolA",
        }
    }

    #[test]
    fn test_extract_version_formats() {
        assert_eq!(extract_version("1.2.3"), Some("1.2.3".to_string()));
        assert_eq!(extract_version("v2.0.1 (build 7)"), Some("2.0.1".to_string()));
        assert_eq!(
            extract_version("tool 1.4.0-beta.2"),
            Some("1.4.0-beta.2".to_string())
        );
        assert_eq!(extract_version("no version here"), None);
    }

    #[tokio::test]
    async fn test_quick_check_resolves_executable() {
        let runner = ScriptedRunner::new().ok("which toolA", "/usr/local/bin/toolA");
        assert!(tool_a().quick_check(&runner).await);
        assert_eq!(runner.call_count(), 1);

        let runner = ScriptedRunner::new().fail("which toolA", "not found");
        assert!(!tool_a().quick_check(&runner).await);
    }

    #[tokio::test]
    async fn test_quick_check_folds_timeout_into_absence() {
        let runner = ScriptedRunner::new().timeout("which toolA");
        assert!(!tool_a().quick_check(&runner).await);
    }

    // npm 探测未命中，可执行文件解析到 /usr/local/bin/toolA，
    // 版本查询返回 1.2.3 → 脚本安装来源的完整肯定结果
    #[tokio::test]
    async fn test_full_check_scenario_script_install_on_macos() {
        let runner = ScriptedRunner::new()
            .fail("which npm", "not found")
            .ok("which toolA", "/usr/local/bin/toolA")
            .ok("toolA --version", "toolA version 1.2.3");
        let platform = PlatformInfo::for_os(OsFamily::Macos);

        let result = tool_a().full_check(&runner, &platform).await;

        assert!(result.installed);
        assert_eq!(result.path.as_deref(), Some("/usr/local/bin/toolA"));
        assert_eq!(result.version.as_deref(), Some("1.2.3"));
        assert_eq!(result.install_method, Some(InstallMethod::Official));
    }

    #[tokio::test]
    async fn test_full_check_prefers_npm_provenance() {
        let runner = ScriptedRunner::new()
            .ok("which npm", "/usr/bin/npm")
            .ok(
                "npm list -g @example/tool-a",
                "/usr/lib\n└── @example/tool-a@1.0.0",
            )
            .ok("npm root -g", "/usr/lib/node_modules")
            .ok("toolA --version", "1.0.0");
        let platform = PlatformInfo::for_os(OsFamily::Linux);

        let result = tool_a().full_check(&runner, &platform).await;

        assert!(result.installed);
        assert_eq!(result.install_method, Some(InstallMethod::Npm));
        assert_eq!(
            result.path.as_deref(),
            Some("/usr/lib/node_modules/@example/tool-a")
        );
    }

    #[tokio::test]
    async fn test_full_check_empty_marker_falls_through() {
        let runner = ScriptedRunner::new()
            .ok("which npm", "/usr/bin/npm")
            .ok("npm list -g @example/tool-a", "/usr/lib\n└── (empty)")
            .fail("which toolA", "not found");
        let platform = PlatformInfo::for_os(OsFamily::Linux);

        let result = tool_a().full_check(&runner, &platform).await;

        assert_eq!(result, ToolCheckResult::not_installed());
    }

    #[tokio::test]
    async fn test_full_check_version_failure_keeps_positive() {
        let runner = ScriptedRunner::new()
            .fail("which npm", "not found")
            .ok("which toolA", "/usr/local/bin/toolA")
            .timeout("toolA --version");
        let platform = PlatformInfo::for_os(OsFamily::Macos);

        let result = tool_a().full_check(&runner, &platform).await;

        assert!(result.installed);
        assert!(result.version.is_none());
        assert_eq!(result.install_method, Some(InstallMethod::Official));
    }

    #[tokio::test]
    async fn test_full_check_no_probe_resolves_is_complete_negative() {
        let runner = ScriptedRunner::new();
        let platform = PlatformInfo::for_os(OsFamily::Linux);

        let result = tool_a().full_check(&runner, &platform).await;

        assert_eq!(result, ToolCheckResult::not_installed());
    }
}
