//! 工具检测器注册表
//!
//! 受管工具集合固定为三个 AI CLI 工具；注册表负责按 ID 查找。

mod claude_code;
mod codex;
mod gemini_cli;

pub use claude_code::ClaudeCodeDetector;
pub use codex::CodexDetector;
pub use gemini_cli::GeminiCliDetector;

use super::detector_trait::ToolDetector;
use std::collections::HashMap;
use std::sync::Arc;

/// 检测器注册表
pub struct DetectorRegistry {
    detectors: HashMap<String, Arc<dyn ToolDetector>>,
    /// 注册顺序（列表展示按此顺序）
    order: Vec<String>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        let mut registry = DetectorRegistry {
            detectors: HashMap::new(),
            order: Vec::new(),
        };

        registry.register(Arc::new(ClaudeCodeDetector));
        registry.register(Arc::new(CodexDetector));
        registry.register(Arc::new(GeminiCliDetector));
        registry
    }

    fn register(&mut self, detector: Arc<dyn ToolDetector>) {
        let id = detector.tool_id().to_string();
        self.order.push(id.clone());
        self.detectors.insert(id, detector);
    }

    /// 按工具 ID 查找检测器
    pub fn get(&self, tool_id: &str) -> Option<Arc<dyn ToolDetector>> {
        self.detectors.get(tool_id).cloned()
    }

    /// 所有检测器（注册顺序）
    pub fn all(&self) -> Vec<Arc<dyn ToolDetector>> {
        self.order
            .iter()
            .filter_map(|id| self.detectors.get(id).cloned())
            .collect()
    }

    /// 所有工具 ID（注册顺序）
    pub fn tool_ids(&self) -> Vec<String> {
        self.order.clone()
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
