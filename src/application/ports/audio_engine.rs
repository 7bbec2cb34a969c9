//! Audio Engine Port - 音频拼接 / 探测 / 打标签抽象
//!
//! 对应外部的 ffmpeg + ffprobe

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 音频引擎错误
#[derive(Debug, Error)]
pub enum AudioEngineError {
    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} exited with code {exit_code:?}: {stderr}")]
    Failed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{program} timed out after {after_secs}s")]
    Timeout { program: String, after_secs: u64 },

    #[error("Malformed probe output for {path}: {output:?}")]
    MalformedOutput { path: PathBuf, output: String },

    #[error("IO error: {0}")]
    Io(String),
}

/// 整个运行期固定的音频格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl AudioFormat {
    pub const fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// 声道布局: 1 -> mono, 2 -> stereo, n -> "{n}c"
    pub fn channel_layout(&self) -> String {
        match self.channels {
            1 => "mono".to_string(),
            2 => "stereo".to_string(),
            n => format!("{}c", n),
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::new(24000, 1)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Hz/{}", self.sample_rate, self.channel_layout())
    }
}

/// 输出编码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputCodec {
    /// 中间合并使用的 16-bit PCM
    Pcm16,
    /// 最终成品 AAC
    Aac { bitrate: String },
}

impl OutputCodec {
    pub fn ffmpeg_name(&self) -> &'static str {
        match self {
            OutputCodec::Pcm16 => "pcm_s16le",
            OutputCodec::Aac { .. } => "aac",
        }
    }
}

/// 拼接请求
#[derive(Debug, Clone)]
pub struct ConcatRequest {
    /// `file '<path>'` 列表文件，路径相对于列表文件所在目录
    pub list_path: PathBuf,
    pub output_path: PathBuf,
    pub format: AudioFormat,
    pub codec: OutputCodec,
}

/// 元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub comment: String,
}

/// 打标签请求
#[derive(Debug, Clone)]
pub struct TagRequest {
    pub input_path: PathBuf,
    /// FFMETADATA 章节文件
    pub chapters_path: PathBuf,
    pub output_path: PathBuf,
    pub metadata: BookMetadata,
    pub codec: OutputCodec,
}

/// Audio Engine Port
#[async_trait]
pub trait AudioEnginePort: Send + Sync {
    /// 生成固定时长、固定格式的静音文件
    async fn generate_silence(
        &self,
        duration_secs: f64,
        format: AudioFormat,
        output_path: &Path,
    ) -> Result<(), AudioEngineError>;

    /// 按列表文件拼接
    async fn concat(&self, request: &ConcatRequest) -> Result<(), AudioEngineError>;

    /// 实测时长（秒）
    async fn probe_duration(&self, path: &Path) -> Result<f64, AudioEngineError>;

    /// 采样率与声道数
    async fn probe_stream_info(&self, path: &Path) -> Result<AudioFormat, AudioEngineError>;

    /// 写入元数据与章节，产出最终文件
    async fn tag(&self, request: &TagRequest) -> Result<(), AudioEngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_layout() {
        assert_eq!(AudioFormat::new(22050, 1).channel_layout(), "mono");
        assert_eq!(AudioFormat::new(22050, 2).channel_layout(), "stereo");
        assert_eq!(AudioFormat::new(48000, 6).channel_layout(), "6c");
    }

    #[test]
    fn test_default_format() {
        assert_eq!(AudioFormat::default(), AudioFormat::new(24000, 1));
        assert_eq!(AudioFormat::default().to_string(), "24000Hz/mono");
    }

    #[test]
    fn test_codec_names() {
        assert_eq!(OutputCodec::Pcm16.ffmpeg_name(), "pcm_s16le");
        let aac = OutputCodec::Aac {
            bitrate: "128k".to_string(),
        };
        assert_eq!(aac.ffmpeg_name(), "aac");
    }
}
