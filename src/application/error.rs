//! 应用层错误定义
//!
//! 所有失败都向上传播到流水线顶层；不存在部分成功的输出

use thiserror::Error;

use crate::application::ports::{AudioEngineError, SpeechError, StorageError};
use crate::domain::BookError;

/// 单个文本单元的失败原因
#[derive(Debug, Error)]
pub enum UnitFailure {
    #[error(transparent)]
    Speech(#[from] SpeechError),

    #[error("duration probe failed: {0}")]
    Probe(#[from] AudioEngineError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("worker aborted: {0}")]
    Aborted(String),
}

/// 应用层错误
#[derive(Debug, Error)]
pub enum NarrateError {
    /// 输入结构无效
    #[error("Invalid book: {0}")]
    InvalidBook(#[from] BookError),

    /// 章节没有任何可合成的行
    #[error("Chapter {chapter} has no speakable lines")]
    EmptyChapter { chapter: u32 },

    /// 单行合成失败，定位到章节与行号
    #[error("Synthesis failed for chapter {chapter}, line {line}: {source}")]
    SynthesisFailed {
        chapter: u32,
        line: usize,
        #[source]
        source: UnitFailure,
    },

    /// 静音生成失败（整次运行致命）
    #[error("Failed to generate silence ({duration_secs}s): {source}")]
    SilenceFailed {
        duration_secs: f64,
        #[source]
        source: AudioEngineError,
    },

    /// 章节合并失败
    #[error("Failed to merge chapter {chapter}: {source}")]
    ChapterMergeFailed {
        chapter: u32,
        #[source]
        source: AudioEngineError,
    },

    /// 拼接 / 探测 / 打标签失败
    #[error("Audio engine error: {0}")]
    AudioEngine(#[from] AudioEngineError),

    /// 工作目录错误
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NarrateError {
    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// 失败所在章节（如果能定位）
    pub fn chapter(&self) -> Option<u32> {
        match self {
            NarrateError::EmptyChapter { chapter }
            | NarrateError::SynthesisFailed { chapter, .. }
            | NarrateError::ChapterMergeFailed { chapter, .. } => Some(*chapter),
            NarrateError::InvalidBook(BookError::EmptyChapter(chapter)) => Some(*chapter),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesis_error_names_chapter_and_line() {
        let err = NarrateError::SynthesisFailed {
            chapter: 1,
            line: 1,
            source: UnitFailure::Speech(SpeechError::Failed {
                exit_code: Some(1),
                stderr: "boom".to_string(),
            }),
        };
        let message = err.to_string();
        assert!(message.contains("chapter 1, line 1"));
        assert!(message.contains("boom"));
        assert_eq!(err.chapter(), Some(1));
    }
}
