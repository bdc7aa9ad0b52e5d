//! 检测结果缓存
//!
//! 每个工具最多保留一条最近完整检测的结果，带 TTL。过期条目视为
//! 不存在，不会被返回。条目只通过 set/invalidate 变更，写入采用
//! last-writer-wins，无需额外同步。

use crate::models::ToolCheckResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

/// 缓存有效期（秒）
pub const DETECTION_CACHE_TTL_SECS: i64 = 300;

/// 缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub result: ToolCheckResult,
    /// 观测时间（Unix 秒）
    pub observed_at: i64,
}

impl CacheEntry {
    pub fn now(result: ToolCheckResult) -> Self {
        CacheEntry {
            result,
            observed_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_expired(&self, ttl_secs: i64) -> bool {
        chrono::Utc::now().timestamp() - self.observed_at > ttl_secs
    }
}

/// 检测结果缓存
pub struct DetectionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl_secs: i64,
}

impl DetectionCache {
    pub fn new() -> Self {
        Self::with_ttl(DETECTION_CACHE_TTL_SECS)
    }

    /// 指定 TTL（测试用）
    pub fn with_ttl(ttl_secs: i64) -> Self {
        DetectionCache {
            entries: Mutex::new(HashMap::new()),
            ttl_secs,
        }
    }

    /// 读取未过期的缓存结果；过期条目顺手清除
    pub fn get(&self, tool_id: &str) -> Option<ToolCheckResult> {
        let mut entries = self.entries.lock().expect("检测缓存锁被毒化");

        match entries.get(tool_id) {
            Some(entry) if !entry.is_expired(self.ttl_secs) => Some(entry.result.clone()),
            Some(_) => {
                entries.remove(tool_id);
                None
            }
            None => None,
        }
    }

    /// 写入结果并盖上当前时间戳，返回写入的条目（供持久化）
    pub fn set(&self, tool_id: &str, result: ToolCheckResult) -> CacheEntry {
        let entry = CacheEntry::now(result);
        self.entries
            .lock()
            .expect("检测缓存锁被毒化")
            .insert(tool_id.to_string(), entry.clone());
        entry
    }

    /// 按给定观测时间写入（启动时从持久化存储回填，或测试构造过期条目）
    pub fn set_at(&self, tool_id: &str, result: ToolCheckResult, observed_at: i64) {
        self.entries
            .lock()
            .expect("检测缓存锁被毒化")
            .insert(tool_id.to_string(), CacheEntry { result, observed_at });
    }

    pub fn invalidate(&self, tool_id: &str) {
        self.entries
            .lock()
            .expect("检测缓存锁被毒化")
            .remove(tool_id);
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().expect("检测缓存锁被毒化").clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("检测缓存锁被毒化").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DetectionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InstallMethod;

    fn positive() -> ToolCheckResult {
        ToolCheckResult::installed(
            Some("/usr/local/bin/claude".to_string()),
            Some("1.0.0".to_string()),
            InstallMethod::Official,
        )
    }

    #[test]
    fn test_set_get_round_trip() {
        let cache = DetectionCache::new();
        cache.set("claude-code", positive());

        let result = cache.get("claude-code").unwrap();
        assert!(result.installed);
        assert_eq!(result.install_method, Some(InstallMethod::Official));
    }

    #[test]
    fn test_expired_entry_treated_as_absent() {
        let cache = DetectionCache::new();
        let stale = chrono::Utc::now().timestamp() - DETECTION_CACHE_TTL_SECS - 10;
        cache.set_at("claude-code", positive(), stale);

        assert!(cache.get("claude-code").is_none());
        // 过期条目已被清除
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_within_ttl_is_returned() {
        let cache = DetectionCache::new();
        let recent = chrono::Utc::now().timestamp() - DETECTION_CACHE_TTL_SECS + 60;
        cache.set_at("claude-code", positive(), recent);

        assert!(cache.get("claude-code").is_some());
    }

    #[test]
    fn test_invalidate_and_invalidate_all() {
        let cache = DetectionCache::new();
        cache.set("claude-code", positive());
        cache.set("codex", ToolCheckResult::not_installed());

        cache.invalidate("claude-code");
        assert!(cache.get("claude-code").is_none());
        assert!(cache.get("codex").is_some());

        cache.invalidate_all();
        assert!(cache.is_empty());
    }
}
