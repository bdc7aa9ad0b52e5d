// Claude Code Detector
//
// Claude Code 工具的检测与安装数据

use super::super::detector_trait::ToolDetector;
use crate::utils::platform::PlatformInfo;
use async_trait::async_trait;

/// Claude Code 工具检测器
pub struct ClaudeCodeDetector;

#[async_trait]
impl ToolDetector for ClaudeCodeDetector {
    fn tool_id(&self) -> &str {
        "claude-code"
    }

    fn tool_name(&self) -> &str {
        "Claude Code"
    }

    fn npm_package(&self) -> &str {
        "@anthropic-ai/claude-code"
    }

    fn executable(&self) -> &str {
        "claude"
    }

    fn install_script_command(&self, platform: &PlatformInfo) -> Option<String> {
        if platform.is_windows() {
            Some(
                "powershell -NoProfile -ExecutionPolicy Bypass -Command \
                 \"irm https://claude.ai/install.ps1 | iex\""
                    .to_string(),
            )
        } else {
            Some("curl -fsSL https://claude.ai/install.sh | bash".to_string())
        }
    }

    fn system_package_install_command(&self, platform: &PlatformInfo) -> Option<String> {
        if platform.is_windows() {
            Some(
                "winget install --exact --id Anthropic.ClaudeCode \
                 --silent --accept-package-agreements --accept-source-agreements"
                    .to_string(),
            )
        } else {
            // macOS/Linux 没有官方 brew 包
            None
        }
    }

    fn system_package_uninstall_command(&self, platform: &PlatformInfo) -> Option<String> {
        if platform.is_windows() {
            Some("winget uninstall --exact --id Anthropic.ClaudeCode --silent".to_string())
        } else {
            None
        }
    }

    fn uninstall_script_command(&self, platform: &PlatformInfo) -> Option<String> {
        if platform.is_windows() {
            Some(
                "powershell -NoProfile -ExecutionPolicy Bypass -Command \
                 \"irm https://claude.ai/install.ps1 | iex; claude uninstall\""
                    .to_string(),
            )
        } else {
            None
        }
    }

    fn manual_install_hints(&self) -> Vec<String> {
        vec![
            "手动执行官方脚本: curl -fsSL https://claude.ai/install.sh | bash".to_string(),
            format!("或使用 npm: npm install -g {}@latest", self.npm_package()),
        ]
    }

    fn manual_uninstall_hints(&self) -> Vec<String> {
        vec![
            "执行官方卸载命令: claude uninstall".to_string(),
            format!("npm 安装时: npm uninstall -g {}", self.npm_package()),
        ]
    }
}
