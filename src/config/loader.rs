//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（narrate.toml / narrate.local.toml，或 --config 指定的文件）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;
use crate::infrastructure::adapters::SpeechEngineKind;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["narrate", "narrate.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `NARRATE_PIPELINE__CONCURRENCY=4`
/// - `NARRATE_TTS__ENGINE__KIND=piper`
/// - `NARRATE_TTS__ENGINE__VOICE=/models/en_US-lessac-medium.onnx`
/// - `NARRATE_AUDIO__FFMPEG_BIN=/usr/local/bin/ffmpeg`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_config_with_overrides(config_path, &[])
}

/// 加载配置并叠加命令行覆盖项（优先级高于环境变量）
///
/// `overrides` 为 `(key, value)`，key 使用点分层级，如 `pipeline.concurrency`
pub fn load_config_with_overrides(
    config_path: Option<&Path>,
    overrides: &[(String, String)],
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("tts.engine.kind", "piper")?
        .set_default("tts.timeout_secs", 300)?
        .set_default("audio.ffmpeg_bin", "ffmpeg")?
        .set_default("audio.ffprobe_bin", "ffprobe")?
        .set_default("audio.short_silence_secs", 0.8)?
        .set_default("audio.long_silence_secs", 1.5)?
        .set_default("audio.default_sample_rate", 24000)?
        .set_default("audio.default_channels", 1)?
        .set_default("audio.final_bitrate", "128k")?
        .set_default("audio.timeout_secs", 600)?
        .set_default("pipeline.concurrency", 6)?
        .set_default("pipeline.keep_work_dir", false)?
        .set_default("pipeline.silence.long_after_first_line", false)?
        .set_default("pipeline.silence.trailing_after_last_chapter", true)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: NARRATE_
    // 层级分隔符: __ (双下划线)
    builder = builder.add_source(
        Environment::with_prefix("NARRATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 命令行覆盖
    for (key, value) in overrides {
        builder = builder.set_override(key.as_str(), value.as_str())?;
    }

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.pipeline.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "Pipeline concurrency must be at least 1".to_string(),
        ));
    }

    if let SpeechEngineKind::Piper(piper) = &config.tts.engine {
        if piper.binary.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Piper binary cannot be empty".to_string(),
            ));
        }
        if piper.voice.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Piper voice model must be set (tts.engine.voice)".to_string(),
            ));
        }
        if piper.sentence_silence.is_nan() || piper.sentence_silence < 0.0 {
            return Err(ConfigError::ValidationError(
                "Piper sentence silence cannot be negative".to_string(),
            ));
        }
    }

    if config.audio.ffmpeg_bin.trim().is_empty() || config.audio.ffprobe_bin.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "ffmpeg / ffprobe binary cannot be empty".to_string(),
        ));
    }

    let positive = |secs: f64| secs.is_finite() && secs > 0.0;
    if !positive(config.audio.short_silence_secs) || !positive(config.audio.long_silence_secs) {
        return Err(ConfigError::ValidationError(
            "Silence durations must be positive".to_string(),
        ));
    }

    if config.audio.default_sample_rate == 0 || config.audio.default_channels == 0 {
        return Err(ConfigError::ValidationError(
            "Default sample rate and channels cannot be 0".to_string(),
        ));
    }

    if config.audio.final_bitrate.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Final bitrate cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Narrate Configuration ===");
    match &config.tts.engine {
        SpeechEngineKind::Piper(piper) => {
            tracing::info!("Speech Engine: piper ({})", piper.binary);
            tracing::info!("Voice: {}", piper.voice);
        }
        SpeechEngineKind::Fake(_) => tracing::info!("Speech Engine: fake"),
    }
    tracing::info!("TTS Timeout: {}s", config.tts.timeout_secs);
    tracing::info!("FFmpeg: {} / {}", config.audio.ffmpeg_bin, config.audio.ffprobe_bin);
    tracing::info!(
        "Silence: short={}s long={}s",
        config.audio.short_silence_secs,
        config.audio.long_silence_secs
    );
    tracing::info!("Default Format: {}", config.audio.default_format());
    tracing::info!("Concurrency: {}", config.pipeline.concurrency);
    if let Some(work_dir) = &config.pipeline.work_dir {
        tracing::info!("Work Directory: {:?}", work_dir);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=============================");
}
