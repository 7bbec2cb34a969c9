//! Silence Provider - 静音资产
//!
//! 每次运行只生成一次，之后所有章节按引用复用

use std::sync::Arc;

use crate::application::error::NarrateError;
use crate::application::ports::{AudioEnginePort, AudioFormat, SilenceKind, WorkStoragePort};
use crate::domain::{AssetKind, AudioAsset};

/// 短 / 长静音时长（秒）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceDurations {
    pub short_secs: f64,
    pub long_secs: f64,
}

impl Default for SilenceDurations {
    fn default() -> Self {
        Self {
            short_secs: 0.8,
            long_secs: 1.5,
        }
    }
}

/// 一次运行共享的静音资产
#[derive(Debug, Clone, PartialEq)]
pub struct SilenceAssets {
    pub short: AudioAsset,
    pub long: AudioAsset,
    pub format: AudioFormat,
}

/// 静音生成器
pub struct SilenceProvider {
    audio_engine: Arc<dyn AudioEnginePort>,
    storage: Arc<dyn WorkStoragePort>,
}

impl SilenceProvider {
    pub fn new(audio_engine: Arc<dyn AudioEnginePort>, storage: Arc<dyn WorkStoragePort>) -> Self {
        Self {
            audio_engine,
            storage,
        }
    }

    /// 生成一个固定时长、固定格式的静音资产；失败即致命
    pub async fn provision(
        &self,
        kind: SilenceKind,
        duration_secs: f64,
        format: AudioFormat,
    ) -> Result<AudioAsset, NarrateError> {
        let final_path = self.storage.silence_path(kind);
        let partial_path = self.storage.partial_path(&final_path);

        self.audio_engine
            .generate_silence(duration_secs, format, &partial_path)
            .await
            .map_err(|source| NarrateError::SilenceFailed {
                duration_secs,
                source,
            })?;
        self.storage.publish(&partial_path, &final_path).await?;

        tracing::debug!(
            kind = kind.as_str(),
            duration_secs,
            format = %format,
            path = %final_path.display(),
            "Silence generated"
        );

        Ok(AudioAsset::new(final_path, duration_secs, AssetKind::Silence))
    }

    /// 生成短 / 长两个静音资产
    pub async fn provision_pair(
        &self,
        durations: SilenceDurations,
        format: AudioFormat,
    ) -> Result<SilenceAssets, NarrateError> {
        let short = self
            .provision(SilenceKind::Short, durations.short_secs, format)
            .await?;
        let long = self
            .provision(SilenceKind::Long, durations.long_secs, format)
            .await?;

        Ok(SilenceAssets {
            short,
            long,
            format,
        })
    }

    /// 确定本次运行的音频格式
    ///
    /// 探测全书第一个合成行；没有可探测的文件或探测失败时使用默认格式
    pub async fn negotiate_format(
        &self,
        first_line: Option<&AudioAsset>,
        fallback: AudioFormat,
    ) -> AudioFormat {
        let Some(asset) = first_line else {
            return fallback;
        };

        match self.audio_engine.probe_stream_info(asset.path()).await {
            Ok(format) if format.sample_rate > 0 && format.channels > 0 => {
                tracing::info!(format = %format, "Audio format fixed from first line");
                format
            }
            Ok(format) => {
                tracing::warn!(format = %format, "Probed format invalid, using default");
                fallback
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stream probe failed, using default format");
                fallback
            }
        }
    }
}
