// Tool State Store - 工具状态持久化（JSON 文件）
//
// 跨重启保存缓存条目和少量用户偏好。整文件读改写，
// 文档结构简单且操作都由用户触发，不需要更细的并发控制。

use crate::services::tool::cache::CacheEntry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// 持久化文档结构
#[derive(Debug, Default, Serialize, Deserialize)]
struct ToolStateFile {
    #[serde(default)]
    entries: HashMap<String, CacheEntry>,
    #[serde(default)]
    preferences: HashMap<String, String>,
    #[serde(default)]
    updated_at: String,
}

/// 工具状态存储
pub struct ToolStateStore {
    path: PathBuf,
}

impl ToolStateStore {
    /// 默认位置 ~/.aidock/tools.json
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("无法获取用户主目录")?;
        let aidock_dir = home_dir.join(".aidock");
        std::fs::create_dir_all(&aidock_dir).context("无法创建 .aidock 目录")?;

        Ok(ToolStateStore {
            path: aidock_dir.join("tools.json"),
        })
    }

    /// 指定文件路径（测试用）
    pub fn at_path(path: PathBuf) -> Self {
        ToolStateStore { path }
    }

    fn load(&self) -> Result<ToolStateFile> {
        if !self.path.exists() {
            return Ok(ToolStateFile::default());
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("读取 {} 失败", self.path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("解析 {} 失败", self.path.display()))
    }

    fn save(&self, mut file: ToolStateFile) -> Result<()> {
        file.updated_at = chrono::Utc::now().to_rfc3339();
        let content = serde_json::to_string_pretty(&file).context("序列化工具状态失败")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("写入 {} 失败", self.path.display()))
    }

    /// 读取所有持久化的缓存条目
    pub fn load_entries(&self) -> Result<HashMap<String, CacheEntry>> {
        Ok(self.load()?.entries)
    }

    /// 写入或更新一条缓存条目
    pub fn upsert_entry(&self, tool_id: &str, entry: &CacheEntry) -> Result<()> {
        let mut file = self.load()?;
        file.entries.insert(tool_id.to_string(), entry.clone());
        self.save(file)
    }

    /// 删除一条缓存条目
    pub fn remove_entry(&self, tool_id: &str) -> Result<()> {
        let mut file = self.load()?;
        file.entries.remove(tool_id);
        self.save(file)
    }

    /// 清空所有缓存条目（保留偏好）
    pub fn clear_entries(&self) -> Result<()> {
        let mut file = self.load()?;
        file.entries.clear();
        self.save(file)
    }

    /// 写入用户偏好
    pub fn set_preference(&self, key: &str, value: &str) -> Result<()> {
        let mut file = self.load()?;
        file.preferences.insert(key.to_string(), value.to_string());
        self.save(file)
    }

    /// 读取用户偏好
    pub fn get_preference(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.preferences.get(key).cloned())
    }
}
