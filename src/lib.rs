//! aidock - AI CLI 工具管理核心
//!
//! 检测、安装、卸载受管的 AI CLI 工具（Claude Code / Codex /
//! Gemini CLI），并管理其进程生命周期。入口是
//! [`ToolRegistry`]：持有命令执行器、检测缓存与持久化存储，
//! 对外暴露全部工具管理操作。

pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use models::{
    InstallMethod, InstallResult, NodeEnvironment, ToolCheckResult, ToolStatus, UninstallResult,
};
pub use services::tool::{ToolDetector, ToolRegistry};
pub use utils::command::{CommandExecutor, CommandRunner};
pub use utils::platform::{OsFamily, PlatformInfo};
