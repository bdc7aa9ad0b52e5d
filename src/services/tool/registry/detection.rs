//! 检测操作与缓存调和
//!
//! 缓存命中不直接采信：肯定结果用快速检测复核，不一致时降级并
//! 落盘；否定结果在快速检测发现工具出现时升级为完整检测。完整
//! 检测的结果总是写回缓存与持久化存储。

use super::ToolRegistry;
use crate::models::{ToolCheckResult, ToolStatus};
use crate::services::tool::detector_trait::ToolDetector;
use anyhow::Result;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;

impl ToolRegistry {
    /// 强制完整检测，无视缓存
    pub async fn check_tool(&self, tool_id: &str) -> Result<ToolCheckResult> {
        let detector = self.detector(tool_id)?;
        Ok(self.full_check_and_remember(&detector).await)
    }

    /// 带缓存的检测（调和算法）
    pub async fn check_tool_cached(&self, tool_id: &str) -> Result<ToolCheckResult> {
        let detector = self.detector(tool_id)?;
        Ok(self.reconcile(&detector).await)
    }

    /// 并发检测全部受管工具
    pub async fn check_all_tools(&self) -> HashMap<String, ToolCheckResult> {
        let detectors = self.detectors.all();
        let checks = detectors.iter().map(|d| async {
            (d.tool_id().to_string(), self.reconcile(d).await)
        });
        join_all(checks).await.into_iter().collect()
    }

    /// 轻量状态列表（注册顺序）
    pub async fn tool_status_list(&self) -> Vec<ToolStatus> {
        let mut results = self.check_all_tools().await;
        self.detectors
            .all()
            .into_iter()
            .map(|d| {
                let result = results
                    .remove(d.tool_id())
                    .unwrap_or_else(ToolCheckResult::not_installed);
                ToolStatus {
                    id: d.tool_id().to_string(),
                    name: d.tool_name().to_string(),
                    installed: result.installed,
                    version: result.version,
                }
            })
            .collect()
    }

    /// 清空缓存与持久化的检测结果
    pub fn refresh_cache(&self) -> Result<()> {
        self.cache.invalidate_all();
        if let Some(store) = &self.store {
            store.clear_entries()?;
        }
        tracing::info!("检测缓存已清空");
        Ok(())
    }

    async fn reconcile(&self, detector: &Arc<dyn ToolDetector>) -> ToolCheckResult {
        let tool_id = detector.tool_id();

        let Some(cached) = self.cache.get(tool_id) else {
            // 未命中或已过期 → 完整检测
            return self.full_check_and_remember(detector).await;
        };

        let present = detector.quick_check(self.runner.as_ref()).await;

        if cached.installed {
            if present {
                // 快速复核一致，采信缓存细节
                cached
            } else {
                // 工具已消失 → 降级为否定结果并落盘
                tracing::info!(tool_id = tool_id, "缓存的已安装状态失效，降级");
                let demoted = ToolCheckResult::not_installed();
                self.remember(tool_id, demoted.clone());
                demoted
            }
        } else if present {
            // 缓存为否定但工具出现了 → 升级为完整检测
            tracing::info!(tool_id = tool_id, "检测到工具新出现，执行完整检测");
            self.full_check_and_remember(detector).await
        } else {
            cached
        }
    }

    async fn full_check_and_remember(&self, detector: &Arc<dyn ToolDetector>) -> ToolCheckResult {
        let result = detector
            .full_check(self.runner.as_ref(), &self.platform)
            .await;
        tracing::debug!(
            tool_id = detector.tool_id(),
            installed = result.installed,
            "完整检测完成"
        );
        self.remember(detector.tool_id(), result.clone());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InstallMethod;
    use crate::services::tool::cache::DETECTION_CACHE_TTL_SECS;
    use crate::services::tool::store::ToolStateStore;
    use crate::utils::command::testing::ScriptedRunner;
    use crate::utils::platform::{OsFamily, PlatformInfo};

    fn registry(runner: ScriptedRunner, os: OsFamily) -> (ToolRegistry, Arc<ScriptedRunner>) {
        let runner = Arc::new(runner);
        (
            ToolRegistry::with_runner(runner.clone(), PlatformInfo::for_os(os)),
            runner,
        )
    }

    fn installed_claude() -> ToolCheckResult {
        ToolCheckResult::installed(
            Some("/usr/local/bin/claude".to_string()),
            Some("1.2.0".to_string()),
            InstallMethod::Official,
        )
    }

    // 检测幂等：TTL 内第二次调用只做一次快速复核，不再完整检测
    #[tokio::test]
    async fn test_cached_check_is_idempotent_within_ttl() {
        let (registry, runner) = registry(
            ScriptedRunner::new()
                .fail("which npm", "not found")
                .ok("which claude", "/usr/local/bin/claude")
                .ok("claude --version", "1.2.0 (Claude Code)"),
            OsFamily::Linux,
        );

        let first = registry.check_tool_cached("claude-code").await.unwrap();
        assert!(first.installed);
        let full_probe_calls = runner.call_count();

        let second = registry.check_tool_cached("claude-code").await.unwrap();
        assert_eq!(second, first);
        // 只多了一次快速复核（可执行文件解析）
        assert_eq!(runner.call_count(), full_probe_calls + 1);
        assert_eq!(runner.calls_matching("claude --version"), 1);
    }

    // 缓存降级：缓存为已安装但快速检测未命中 → 返回并落盘否定结果
    #[tokio::test]
    async fn test_cached_positive_demoted_when_tool_vanishes() {
        let (registry, _runner) = registry(
            ScriptedRunner::new().fail("which claude", "not found"),
            OsFamily::Linux,
        );
        registry.cache.set("claude-code", installed_claude());

        let result = registry.check_tool_cached("claude-code").await.unwrap();

        assert!(!result.installed);
        // 降级结果写回了缓存
        assert_eq!(
            registry.cache.get("claude-code"),
            Some(ToolCheckResult::not_installed())
        );
    }

    // 未安装工具的缓存未命中 → 完整检测得到否定结果并缓存；
    // 再次调用直接复用缓存，不再触发 npm 探测
    #[tokio::test]
    async fn test_negative_result_is_cached() {
        let (registry, runner) = registry(ScriptedRunner::new(), OsFamily::Linux);

        let first = registry.check_tool_cached("codex").await.unwrap();
        assert_eq!(first, ToolCheckResult::not_installed());
        let probe_calls = runner.call_count();

        let npm_probes = runner.calls_matching("npm list");

        let second = registry.check_tool_cached("codex").await.unwrap();
        assert_eq!(second, first);
        // 第二次只有快速复核，没有新的 npm 探测
        assert_eq!(runner.calls_matching("npm list"), npm_probes);
        assert_eq!(runner.call_count(), probe_calls + 1);
    }

    // 缓存为否定但工具出现了 → 升级为完整检测
    #[tokio::test]
    async fn test_cached_negative_promoted_when_tool_appears() {
        let (registry, runner) = registry(
            ScriptedRunner::new()
                .fail("which npm", "not found")
                .ok("which gemini", "/usr/local/bin/gemini")
                .ok("gemini --version", "0.4.1"),
            OsFamily::Linux,
        );
        registry.cache.set("gemini-cli", ToolCheckResult::not_installed());

        let result = registry.check_tool_cached("gemini-cli").await.unwrap();

        assert!(result.installed);
        assert_eq!(result.version.as_deref(), Some("0.4.1"));
        // 完整检测被触发（版本查询发生了）
        assert_eq!(runner.calls_matching("gemini --version"), 1);
    }

    // 过期条目视为未命中 → 重新完整检测
    #[tokio::test]
    async fn test_expired_entry_triggers_full_check() {
        let (registry, runner) = registry(ScriptedRunner::new(), OsFamily::Linux);
        let stale = chrono::Utc::now().timestamp() - DETECTION_CACHE_TTL_SECS - 1;
        registry
            .cache
            .set_at("claude-code", installed_claude(), stale);

        let result = registry.check_tool_cached("claude-code").await.unwrap();

        assert!(!result.installed);
        // 完整检测探测链被执行（npm 存在性检查）
        assert!(runner.calls_matching("which npm") > 0);
    }

    #[tokio::test]
    async fn test_check_all_tools_covers_every_managed_tool() {
        let (registry, _runner) = registry(ScriptedRunner::new(), OsFamily::Linux);

        let results = registry.check_all_tools().await;

        assert_eq!(results.len(), 3);
        assert!(results.contains_key("claude-code"));
        assert!(results.contains_key("codex"));
        assert!(results.contains_key("gemini-cli"));
    }

    #[tokio::test]
    async fn test_tool_status_list_keeps_registration_order() {
        let (registry, _runner) = registry(ScriptedRunner::new(), OsFamily::Linux);

        let statuses = registry.tool_status_list().await;

        let ids: Vec<_> = statuses.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["claude-code", "codex", "gemini-cli"]);
        assert_eq!(statuses[0].name, "Claude Code");
    }

    #[tokio::test]
    async fn test_unknown_tool_id_is_an_error() {
        let (registry, runner) = registry(ScriptedRunner::new(), OsFamily::Linux);

        assert!(registry.check_tool_cached("vim").await.is_err());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_full_check_persists_to_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ToolStateStore::at_path(dir.path().join("tools.json"));
        let runner = Arc::new(
            ScriptedRunner::new()
                .fail("which npm", "not found")
                .ok("which claude", "/usr/local/bin/claude")
                .ok("claude --version", "1.2.0"),
        );
        let registry = ToolRegistry::with_runner(runner, PlatformInfo::for_os(OsFamily::Linux))
            .with_store(store);

        registry.check_tool("claude-code").await.unwrap();

        let persisted = ToolStateStore::at_path(dir.path().join("tools.json"))
            .load_entries()
            .unwrap();
        assert!(persisted.get("claude-code").unwrap().result.installed);
    }

    #[tokio::test]
    async fn test_refresh_cache_clears_cache_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ToolStateStore::at_path(dir.path().join("tools.json"));
        let registry = ToolRegistry::with_runner(
            Arc::new(ScriptedRunner::new()),
            PlatformInfo::for_os(OsFamily::Linux),
        )
        .with_store(store);
        registry.remember("claude-code", installed_claude());

        registry.refresh_cache().unwrap();

        assert!(registry.cache.is_empty());
        let persisted = ToolStateStore::at_path(dir.path().join("tools.json"))
            .load_entries()
            .unwrap();
        assert!(persisted.is_empty());
    }
}
