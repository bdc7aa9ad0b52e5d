use serde::{Deserialize, Serialize};

/// 工具状态（轻量级，用于列表展示）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolStatus {
    pub id: String,
    pub name: String,
    pub installed: bool,
    pub version: Option<String>,
}

/// 安装方法（安装来源）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum InstallMethod {
    Npm,      // npm 全局安装
    Brew,     // 系统包管理器（macOS Homebrew / Windows winget）
    Official, // 官方安装脚本
    Unknown,  // 无法识别的安装来源
}

impl InstallMethod {
    /// 转换为字符串（用于持久化和日志）
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallMethod::Npm => "npm",
            InstallMethod::Brew => "brew",
            InstallMethod::Official => "official",
            InstallMethod::Unknown => "unknown",
        }
    }

    /// 用户可读名称
    pub fn label(&self) -> &'static str {
        match self {
            InstallMethod::Npm => "npm 全局安装",
            InstallMethod::Brew => "系统包管理器",
            InstallMethod::Official => "官方安装脚本",
            InstallMethod::Unknown => "未知来源",
        }
    }
}

/// 一次完整检测的结果
///
/// 要么是完整的否定结果（`installed=false`），要么是肯定结果加上
/// 能够恢复到的路径/版本/安装来源细节。细节字段只由完整检测写入，
/// 快速检测绝不推断它们。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolCheckResult {
    pub installed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_method: Option<InstallMethod>,
}

impl ToolCheckResult {
    /// 完整的否定结果
    pub fn not_installed() -> Self {
        ToolCheckResult {
            installed: false,
            path: None,
            version: None,
            install_method: None,
        }
    }

    /// 肯定结果（细节字段尽力而为）
    pub fn installed(
        path: Option<String>,
        version: Option<String>,
        install_method: InstallMethod,
    ) -> Self {
        ToolCheckResult {
            installed: true,
            path,
            version,
            install_method: Some(install_method),
        }
    }
}

/// 安装结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallResult {
    pub success: bool,
    pub message: String,
    pub output: String,
}

impl InstallResult {
    pub fn ok(message: impl Into<String>, output: impl Into<String>) -> Self {
        InstallResult {
            success: true,
            message: message.into(),
            output: output.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        InstallResult {
            success: false,
            message: message.into(),
            output: String::new(),
        }
    }

    pub fn failure_with_output(message: impl Into<String>, output: impl Into<String>) -> Self {
        InstallResult {
            success: false,
            message: message.into(),
            output: output.into(),
        }
    }
}

/// 卸载结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UninstallResult {
    pub success: bool,
    pub message: String,
    pub output: String,
}

impl UninstallResult {
    pub fn ok(message: impl Into<String>, output: impl Into<String>) -> Self {
        UninstallResult {
            success: true,
            message: message.into(),
            output: output.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        UninstallResult {
            success: false,
            message: message.into(),
            output: String::new(),
        }
    }

    pub fn failure_with_output(message: impl Into<String>, output: impl Into<String>) -> Self {
        UninstallResult {
            success: false,
            message: message.into(),
            output: output.into(),
        }
    }
}

/// Node 环境信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEnvironment {
    pub node_available: bool,
    pub node_version: Option<String>,
    pub npm_available: bool,
    pub npm_version: Option<String>,
}
