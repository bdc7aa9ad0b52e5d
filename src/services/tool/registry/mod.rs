//! 工具注册中心
//!
//! 组合根：持有命令执行器、平台信息、检测器注册表、检测缓存、
//! 持久化存储和三个编排服务，对外暴露全部工具管理操作。缓存与
//! 存储都是注册中心的实例字段，由调用方决定生命周期，没有全局
//! 可变状态。

mod detection;
mod ops;

use crate::models::ToolCheckResult;
use crate::services::tool::cache::{CacheEntry, DetectionCache, DETECTION_CACHE_TTL_SECS};
use crate::services::tool::detector_trait::ToolDetector;
use crate::services::tool::detectors::DetectorRegistry;
use crate::services::tool::installer::InstallerService;
use crate::services::tool::lifecycle::ProcessLifecycle;
use crate::services::tool::store::ToolStateStore;
use crate::services::tool::uninstaller::UninstallerService;
use crate::utils::command::{CommandExecutor, CommandRunner};
use crate::utils::platform::PlatformInfo;
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// 工具注册中心
pub struct ToolRegistry {
    runner: Arc<dyn CommandRunner>,
    platform: PlatformInfo,
    detectors: DetectorRegistry,
    cache: DetectionCache,
    store: Option<ToolStateStore>,
    installer: InstallerService,
    uninstaller: UninstallerService,
    lifecycle: ProcessLifecycle,
}

impl ToolRegistry {
    /// 生产配置：真实命令执行器 + 默认位置的持久化存储
    ///
    /// 启动时回填上次会话持久化的未过期检测结果。
    pub fn new() -> Result<Self> {
        let store = ToolStateStore::new()?;
        let registry = Self::with_runner(
            Arc::new(CommandExecutor::new()),
            PlatformInfo::current(),
        )
        .with_store(store);
        registry.warm_cache_from_store();
        Ok(registry)
    }

    /// 注入命令执行器与平台信息（测试用），不带持久化
    pub fn with_runner(runner: Arc<dyn CommandRunner>, platform: PlatformInfo) -> Self {
        ToolRegistry {
            installer: InstallerService::new(runner.clone(), platform.clone()),
            uninstaller: UninstallerService::new(runner.clone(), platform.clone()),
            lifecycle: ProcessLifecycle::new(runner.clone(), platform.clone()),
            detectors: DetectorRegistry::new(),
            cache: DetectionCache::new(),
            store: None,
            runner,
            platform,
        }
    }

    /// 附加持久化存储
    pub fn with_store(mut self, store: ToolStateStore) -> Self {
        self.store = Some(store);
        self
    }

    /// 从持久化存储回填未过期的缓存条目
    fn warm_cache_from_store(&self) {
        let Some(store) = &self.store else { return };

        match store.load_entries() {
            Ok(entries) => {
                for (tool_id, entry) in entries {
                    if !entry.is_expired(DETECTION_CACHE_TTL_SECS) {
                        self.cache.set_at(&tool_id, entry.result, entry.observed_at);
                    }
                }
                tracing::debug!(count = self.cache.len(), "已回填持久化的检测结果");
            }
            Err(e) => {
                // 持久化数据损坏时退化为冷缓存，不阻塞启动
                tracing::warn!(error = %e, "读取持久化工具状态失败");
            }
        }
    }

    /// 受管工具 ID 列表
    pub fn tool_ids(&self) -> Vec<String> {
        self.detectors.tool_ids()
    }

    /// 注册中心使用的平台信息快照
    pub fn platform_info(&self) -> PlatformInfo {
        self.platform.clone()
    }

    pub(crate) fn detector(&self, tool_id: &str) -> Result<Arc<dyn ToolDetector>> {
        self.detectors
            .get(tool_id)
            .ok_or_else(|| anyhow!("未知工具: {tool_id}"))
    }

    /// 写入缓存并同步持久化
    pub(crate) fn remember(&self, tool_id: &str, result: ToolCheckResult) {
        let entry: CacheEntry = self.cache.set(tool_id, result);
        if let Some(store) = &self.store {
            if let Err(e) = store.upsert_entry(tool_id, &entry) {
                tracing::warn!(tool_id = tool_id, error = %e, "持久化检测结果失败");
            }
        }
    }

    /// 清除单个工具的缓存与持久化条目
    pub(crate) fn forget(&self, tool_id: &str) {
        self.cache.invalidate(tool_id);
        if let Some(store) = &self.store {
            if let Err(e) = store.remove_entry(tool_id) {
                tracing::warn!(tool_id = tool_id, error = %e, "清除持久化条目失败");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::testing::ScriptedRunner;
    use crate::utils::platform::OsFamily;

    // 平台信息从注册中心自身的快照取，而不是进程全局探测
    #[test]
    fn test_platform_info_returns_injected_snapshot() {
        let registry = ToolRegistry::with_runner(
            Arc::new(ScriptedRunner::new()),
            PlatformInfo::for_os(OsFamily::Macos),
        );

        let info = registry.platform_info();
        assert_eq!(info.os, OsFamily::Macos);
        assert!(!info.arch.is_empty());
    }
}
