//! 工具管理服务
//!
//! 检测、安装、卸载与进程生命周期管理，统一通过 ToolRegistry 暴露。

pub mod cache;
pub mod detector_trait;
pub mod detectors;
pub mod installer;
pub mod lifecycle;
pub mod registry;
pub mod store;
pub mod tools_config;
pub mod uninstaller;

pub use cache::{CacheEntry, DetectionCache, DETECTION_CACHE_TTL_SECS};
pub use detector_trait::{extract_version, ToolDetector};
pub use detectors::DetectorRegistry;
pub use installer::{InstallerService, MIN_NODE_MAJOR};
pub use lifecycle::ProcessLifecycle;
pub use registry::ToolRegistry;
pub use store::ToolStateStore;
pub use uninstaller::UninstallerService;
