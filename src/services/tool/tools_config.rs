//! 工具能力矩阵
//!
//! 平台相关逻辑以数据表达：每个 (工具, 平台) 对应一个有序的安装方式
//! 列表，安装/卸载编排在执行前只做一次查表，不在各工具代码里分散
//! 写条件分支。同时维护按路径识别安装来源的已知目录表。

use crate::models::InstallMethod;
use crate::utils::platform::OsFamily;

/// 单个 (工具, 平台) 的能力描述
pub struct ToolCapability {
    pub tool_id: &'static str,
    pub os: OsFamily,
    /// 有序：推荐方式在前
    pub install_methods: &'static [InstallMethod],
}

/// 安装能力矩阵
static INSTALL_MATRIX: &[ToolCapability] = &[
    ToolCapability {
        tool_id: "claude-code",
        os: OsFamily::Macos,
        install_methods: &[InstallMethod::Official, InstallMethod::Npm],
    },
    ToolCapability {
        tool_id: "claude-code",
        os: OsFamily::Linux,
        install_methods: &[InstallMethod::Official, InstallMethod::Npm],
    },
    ToolCapability {
        tool_id: "claude-code",
        os: OsFamily::Windows,
        install_methods: &[InstallMethod::Official, InstallMethod::Npm],
    },
    ToolCapability {
        tool_id: "codex",
        os: OsFamily::Macos,
        install_methods: &[InstallMethod::Npm, InstallMethod::Brew],
    },
    ToolCapability {
        tool_id: "codex",
        os: OsFamily::Linux,
        install_methods: &[InstallMethod::Npm],
    },
    ToolCapability {
        tool_id: "codex",
        os: OsFamily::Windows,
        install_methods: &[InstallMethod::Npm],
    },
    ToolCapability {
        tool_id: "gemini-cli",
        os: OsFamily::Macos,
        install_methods: &[InstallMethod::Npm],
    },
    ToolCapability {
        tool_id: "gemini-cli",
        os: OsFamily::Linux,
        install_methods: &[InstallMethod::Npm],
    },
    ToolCapability {
        tool_id: "gemini-cli",
        os: OsFamily::Windows,
        install_methods: &[InstallMethod::Npm],
    },
];

/// 查询 (工具, 平台) 可用的安装方式（有序）
pub fn install_methods_for(tool_id: &str, os: OsFamily) -> &'static [InstallMethod] {
    INSTALL_MATRIX
        .iter()
        .find(|cap| cap.tool_id == tool_id && cap.os == os)
        .map(|cap| cap.install_methods)
        .unwrap_or(&[])
}

/// 判断某安装方式在 (工具, 平台) 上是否可用
pub fn method_supported(tool_id: &str, os: OsFamily, method: InstallMethod) -> bool {
    install_methods_for(tool_id, os).contains(&method)
}

/// 脚本安装来源是否存在已知的静默卸载路径
///
/// Windows 的脚本安装会落下卸载器二进制；macOS/Linux 没有
/// 可静默调用的卸载入口，只能提示手动执行官方卸载脚本。
pub fn has_silent_script_uninstall(os: OsFamily) -> bool {
    os == OsFamily::Windows
}

/// 按解析出的可执行文件路径识别安装来源
///
/// 查表顺序：包管理器 cellar 目录 → 脚本安装目录 → 未知。
/// 该结果只作为 provenance 信号，不影响 installed 判定。
pub fn classify_install_path(path: &str, os: OsFamily) -> InstallMethod {
    match os {
        OsFamily::Macos => {
            const BREW_DIRS: [&str; 3] = [
                "/opt/homebrew/",
                "/usr/local/Cellar/",
                "/usr/local/Caskroom/",
            ];
            if BREW_DIRS.iter().any(|dir| path.starts_with(dir)) {
                return InstallMethod::Brew;
            }
            if path.starts_with("/usr/local/bin/")
                || path.contains("/.local/bin/")
                || path.contains("/.claude/")
            {
                return InstallMethod::Official;
            }
            InstallMethod::Unknown
        }
        OsFamily::Linux => {
            if path.starts_with("/home/linuxbrew/.linuxbrew/") {
                return InstallMethod::Brew;
            }
            if path.starts_with("/usr/local/bin/")
                || path.contains("/.local/bin/")
                || path.contains("/.claude/")
            {
                return InstallMethod::Official;
            }
            InstallMethod::Unknown
        }
        OsFamily::Windows => {
            let lower = path.to_lowercase().replace('/', "\\");
            if lower.contains("\\windowsapps\\")
                || lower.contains("\\chocolatey\\")
                || lower.contains("\\scoop\\")
            {
                return InstallMethod::Brew;
            }
            if lower.contains("\\appdata\\local\\programs\\")
                || lower.contains("\\program files\\")
                || lower.contains("\\.local\\bin\\")
            {
                return InstallMethod::Official;
            }
            InstallMethod::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_lookup_is_ordered() {
        let methods = install_methods_for("claude-code", OsFamily::Macos);
        assert_eq!(methods[0], InstallMethod::Official);
        assert!(methods.contains(&InstallMethod::Npm));
    }

    #[test]
    fn test_unsupported_combinations_are_empty_or_missing() {
        assert!(install_methods_for("unknown-tool", OsFamily::Linux).is_empty());
        assert!(!method_supported("gemini-cli", OsFamily::Linux, InstallMethod::Official));
        assert!(!method_supported("codex", OsFamily::Linux, InstallMethod::Brew));
        assert!(method_supported("codex", OsFamily::Macos, InstallMethod::Brew));
    }

    #[test]
    fn test_classify_macos_paths() {
        assert_eq!(
            classify_install_path("/opt/homebrew/bin/codex", OsFamily::Macos),
            InstallMethod::Brew
        );
        assert_eq!(
            classify_install_path("/usr/local/bin/claude", OsFamily::Macos),
            InstallMethod::Official
        );
        assert_eq!(
            classify_install_path("/Users/dev/.local/bin/gemini", OsFamily::Macos),
            InstallMethod::Official
        );
        assert_eq!(
            classify_install_path("/Users/dev/custom/claude", OsFamily::Macos),
            InstallMethod::Unknown
        );
    }

    #[test]
    fn test_classify_windows_paths() {
        assert_eq!(
            classify_install_path(
                "C:\\Users\\dev\\AppData\\Local\\Programs\\claude\\claude.exe",
                OsFamily::Windows
            ),
            InstallMethod::Official
        );
        assert_eq!(
            classify_install_path(
                "C:\\Users\\dev\\scoop\\shims\\codex.exe",
                OsFamily::Windows
            ),
            InstallMethod::Brew
        );
        assert_eq!(
            classify_install_path("D:\\tools\\claude.exe", OsFamily::Windows),
            InstallMethod::Unknown
        );
    }

    #[test]
    fn test_silent_script_uninstall_is_windows_only() {
        assert!(has_silent_script_uninstall(OsFamily::Windows));
        assert!(!has_silent_script_uninstall(OsFamily::Macos));
        assert!(!has_silent_script_uninstall(OsFamily::Linux));
    }
}
