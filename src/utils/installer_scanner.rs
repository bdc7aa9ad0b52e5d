// 安装器/卸载器路径扫描
//
// 固定候选位置列表：安装与卸载的兜底策略会扫描这些位置，
// 找到随工具分发的安装器/卸载器二进制后静默调用。

use crate::utils::platform::{OsFamily, PlatformInfo};
use std::path::PathBuf;

/// 已知的安装器二进制候选位置
pub fn known_installer_candidates(tool_id: &str, platform: &PlatformInfo) -> Vec<PathBuf> {
    candidate_roots(tool_id, platform)
        .into_iter()
        .flat_map(|root| {
            if platform.is_windows() {
                vec![root.join("install.exe"), root.join("setup.exe")]
            } else {
                vec![root.join("install.sh")]
            }
        })
        .collect()
}

/// 已知的卸载器二进制候选位置
pub fn known_uninstaller_candidates(tool_id: &str, platform: &PlatformInfo) -> Vec<PathBuf> {
    candidate_roots(tool_id, platform)
        .into_iter()
        .flat_map(|root| {
            if platform.is_windows() {
                vec![root.join("uninstall.exe"), root.join("Uninstall.exe")]
            } else {
                vec![root.join("uninstall.sh")]
            }
        })
        .collect()
}

/// 过滤出实际存在的文件
pub fn scan_existing(candidates: Vec<PathBuf>) -> Vec<PathBuf> {
    candidates.into_iter().filter(|p| p.is_file()).collect()
}

fn candidate_roots(tool_id: &str, platform: &PlatformInfo) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    let exe_name = executable_name(tool_id);

    match platform.os {
        OsFamily::Windows => {
            if let Some(data_local) = dirs::data_local_dir() {
                roots.push(data_local.join("Programs").join(exe_name));
                roots.push(data_local.join(exe_name));
            }
            if let Ok(program_files) = std::env::var("ProgramFiles") {
                roots.push(PathBuf::from(program_files).join(exe_name));
            }
        }
        OsFamily::Macos | OsFamily::Linux => {
            if let Some(home) = dirs::home_dir() {
                roots.push(home.join(format!(".{exe_name}")).join("local"));
                roots.push(home.join(".local").join("share").join(exe_name));
            }
        }
    }

    roots
}

/// 工具 ID 到可执行文件名的映射
pub fn executable_name(tool_id: &str) -> &str {
    match tool_id {
        "claude-code" => "claude",
        "gemini-cli" => "gemini",
        "codex" => "codex",
        _ => tool_id,
    }
}
