//! Speech Engine Port - 语音合成引擎抽象
//!
//! 定义单行合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// 合成错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Failed to start speech engine: {0}")]
    Spawn(String),

    #[error("Speech engine exited with code {exit_code:?}: {stderr}")]
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Speech engine timed out after {after_secs}s")]
    Timeout { after_secs: u64 },

    #[error("Speech engine produced no audio at {0}")]
    EmptyOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 已规范化的文本（通过 stdin 传给引擎）
    pub text: String,
    /// 目标输出文件
    pub output_path: PathBuf,
}

/// Speech Engine Port
///
/// "把一段文本合成到一个文件" 的引擎
#[async_trait]
pub trait SpeechEnginePort: Send + Sync {
    /// 执行合成，成功时 output_path 处存在完整音频
    async fn synthesize(&self, request: SynthesisRequest) -> Result<(), SpeechError>;

    /// 引擎名称（用于日志）
    fn name(&self) -> &str;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
