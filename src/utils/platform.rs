// 平台信息
//
// 会话级只读快照：操作系统家族、架构、系统版本描述。
// 进程内只计算一次，之后按值克隆使用。

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// 操作系统家族
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Windows,
    Macos,
    Linux,
}

impl OsFamily {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "macos") {
            OsFamily::Macos
        } else {
            OsFamily::Linux
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Windows => "windows",
            OsFamily::Macos => "macos",
            OsFamily::Linux => "linux",
        }
    }
}

/// 平台信息快照
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformInfo {
    pub os: OsFamily,
    pub arch: String,
    pub os_version: String,
}

static CURRENT: Lazy<PlatformInfo> = Lazy::new(|| PlatformInfo {
    os: OsFamily::current(),
    arch: env::consts::ARCH.to_string(),
    os_version: detect_os_version(),
});

impl PlatformInfo {
    /// 获取当前平台信息（进程内只探测一次）
    pub fn current() -> Self {
        CURRENT.clone()
    }

    /// 构造指定平台信息（测试用）
    pub fn for_os(os: OsFamily) -> Self {
        PlatformInfo {
            os,
            arch: env::consts::ARCH.to_string(),
            os_version: String::new(),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == OsFamily::Windows
    }

    pub fn is_macos(&self) -> bool {
        self.os == OsFamily::Macos
    }

    pub fn is_linux(&self) -> bool {
        self.os == OsFamily::Linux
    }

    /// PATH 分隔符
    pub fn path_separator(&self) -> char {
        if self.is_windows() {
            ';'
        } else {
            ':'
        }
    }

    /// 构建增强的 PATH
    ///
    /// GUI 进程继承的 PATH 往往缺少用户 shell 中的工具目录，
    /// 这里把常见的安装位置补到现有 PATH 后面。
    pub fn build_enhanced_path(&self) -> String {
        let separator = self.path_separator();
        let mut path = env::var("PATH").unwrap_or_default();

        for candidate in self.extra_path_candidates() {
            let candidate_str = candidate.to_string_lossy().to_string();
            if !path.split(separator).any(|p| p == candidate_str) {
                if !path.is_empty() {
                    path.push(separator);
                }
                path.push_str(&candidate_str);
            }
        }

        path
    }

    fn extra_path_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        let home = dirs::home_dir();

        if self.is_windows() {
            if let Some(data_local) = dirs::data_local_dir() {
                candidates.push(data_local.join("Programs").join("claude"));
            }
            if let Some(roaming) = dirs::data_dir() {
                candidates.push(roaming.join("npm"));
            }
            if let Some(home) = home {
                candidates.push(home.join(".local").join("bin"));
            }
        } else {
            candidates.push(PathBuf::from("/usr/local/bin"));
            if self.is_macos() {
                candidates.push(PathBuf::from("/opt/homebrew/bin"));
            } else {
                candidates.push(PathBuf::from("/home/linuxbrew/.linuxbrew/bin"));
            }
            if let Some(home) = home {
                candidates.push(home.join(".local").join("bin"));
                candidates.push(home.join(".npm-global").join("bin"));
                candidates.push(home.join(".claude").join("local"));
            }
        }

        candidates
    }
}

/// 探测系统版本描述字符串（尽力而为，失败时返回空串）
fn detect_os_version() -> String {
    #[cfg(target_os = "macos")]
    {
        run_version_probe("sw_vers", &["-productVersion"])
    }
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content.lines().find_map(|line| {
                    line.strip_prefix("PRETTY_NAME=")
                        .map(|v| v.trim_matches('"').to_string())
                })
            })
            .unwrap_or_default()
    }
    #[cfg(target_os = "windows")]
    {
        run_version_probe("cmd", &["/C", "ver"])
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        String::new()
    }
}

#[allow(dead_code)]
fn run_version_probe(program: &str, args: &[&str]) -> String {
    std::process::Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_default()
}
