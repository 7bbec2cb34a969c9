//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::narration::{FinalOutput, SilenceDurations};
use crate::application::ports::AudioFormat;
use crate::application::NarrateOptions;
use crate::domain::SilencePolicy;
use crate::infrastructure::adapters::{FfmpegConfig, SpeechEngineKind};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 合成引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 流水线配置
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 流程参数
    pub fn narrate_options(&self) -> NarrateOptions {
        NarrateOptions {
            concurrency: self.pipeline.concurrency,
            silence: SilenceDurations {
                short_secs: self.audio.short_silence_secs,
                long_secs: self.audio.long_silence_secs,
            },
            default_format: self.audio.default_format(),
            policy: self.pipeline.silence,
            final_output: FinalOutput {
                bitrate: self.audio.final_bitrate.clone(),
                final_end_sentinel: self.pipeline.final_end_sentinel,
            },
            keep_work_dir: self.pipeline.keep_work_dir,
        }
    }

    /// ffmpeg 适配器配置
    pub fn ffmpeg_config(&self) -> FfmpegConfig {
        FfmpegConfig {
            ffmpeg_bin: self.audio.ffmpeg_bin.clone(),
            ffprobe_bin: self.audio.ffprobe_bin.clone(),
            timeout_secs: self.audio.timeout_secs,
        }
    }
}

/// 合成引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 引擎选择（piper / fake）
    #[serde(default)]
    pub engine: SpeechEngineKind,

    /// 单行合成超时（秒），0 表示不限时
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,
}

fn default_tts_timeout() -> u64 {
    300
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            engine: SpeechEngineKind::default(),
            timeout_secs: default_tts_timeout(),
        }
    }
}

/// 音频配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: String,

    /// 行间短静音（秒）
    #[serde(default = "default_short_silence")]
    pub short_silence_secs: f64,

    /// 章节末尾长静音（秒）
    #[serde(default = "default_long_silence")]
    pub long_silence_secs: f64,

    /// 首行探测失败时的采样率
    #[serde(default = "default_sample_rate")]
    pub default_sample_rate: u32,

    /// 首行探测失败时的声道数
    #[serde(default = "default_channels")]
    pub default_channels: u16,

    /// 成品 AAC 码率
    #[serde(default = "default_final_bitrate")]
    pub final_bitrate: String,

    /// 单次 ffmpeg / ffprobe 调用超时（秒），0 表示不限时
    #[serde(default = "default_audio_timeout")]
    pub timeout_secs: u64,
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_bin() -> String {
    "ffprobe".to_string()
}

fn default_short_silence() -> f64 {
    0.8
}

fn default_long_silence() -> f64 {
    1.5
}

fn default_sample_rate() -> u32 {
    24000
}

fn default_channels() -> u16 {
    1 // 单声道
}

fn default_final_bitrate() -> String {
    "128k".to_string()
}

fn default_audio_timeout() -> u64 {
    600
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: default_ffmpeg_bin(),
            ffprobe_bin: default_ffprobe_bin(),
            short_silence_secs: default_short_silence(),
            long_silence_secs: default_long_silence(),
            default_sample_rate: default_sample_rate(),
            default_channels: default_channels(),
            final_bitrate: default_final_bitrate(),
            timeout_secs: default_audio_timeout(),
        }
    }
}

impl AudioConfig {
    pub fn default_format(&self) -> AudioFormat {
        AudioFormat::new(self.default_sample_rate, self.default_channels)
    }
}

/// 流水线配置
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 合成并发上限
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// 工作目录；未设置时按书籍生成在系统临时目录下
    #[serde(default)]
    pub work_dir: Option<PathBuf>,

    /// 成功后保留工作目录
    #[serde(default)]
    pub keep_work_dir: bool,

    /// 静音策略
    #[serde(default)]
    pub silence: SilencePolicy,

    /// 最后一章 END 的替代值（毫秒）
    #[serde(default)]
    pub final_end_sentinel: Option<u64>,
}

fn default_concurrency() -> usize {
    6
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            work_dir: None,
            keep_work_dir: false,
            silence: SilencePolicy::default(),
            final_end_sentinel: None,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
