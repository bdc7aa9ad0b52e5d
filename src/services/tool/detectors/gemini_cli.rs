// Gemini CLI Detector
//
// 仅支持 npm 安装，全部检测逻辑走默认实现

use super::super::detector_trait::ToolDetector;
use async_trait::async_trait;

/// Gemini CLI 工具检测器
pub struct GeminiCliDetector;

#[async_trait]
impl ToolDetector for GeminiCliDetector {
    fn tool_id(&self) -> &str {
        "gemini-cli"
    }

    fn tool_name(&self) -> &str {
        "Gemini CLI"
    }

    fn npm_package(&self) -> &str {
        "@google/gemini-cli"
    }

    fn executable(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_info() {
        let detector = GeminiCliDetector;
        assert_eq!(detector.tool_id(), "gemini-cli");
        assert_eq!(detector.tool_name(), "Gemini CLI");
        assert_eq!(detector.npm_package(), "@google/gemini-cli");
        assert_eq!(detector.executable(), "gemini");
        assert_eq!(detector.version_command(), "gemini --version");
    }
}
