//! Fake TTS Client - 不依赖 piper 的合成引擎
//!
//! 按文本长度写出一段静音 WAV，用于演练（dry run）与测试

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{SpeechEnginePort, SpeechError, SynthesisRequest};

/// Fake TTS Client 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeOptions {
    /// 采样率
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// 每个字符对应的时长（毫秒）
    #[serde(default = "default_ms_per_char")]
    pub ms_per_char: u64,
    /// 模拟推理延迟（毫秒）
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_sample_rate() -> u32 {
    22050
}

fn default_ms_per_char() -> u64 {
    60
}

impl Default for FakeOptions {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            ms_per_char: default_ms_per_char(),
            delay_ms: 0,
        }
    }
}

/// Fake TTS Client
pub struct FakeTtsClient {
    options: FakeOptions,
}

impl FakeTtsClient {
    pub fn new(options: FakeOptions) -> Self {
        tracing::info!(
            sample_rate = options.sample_rate,
            ms_per_char = options.ms_per_char,
            "FakeTtsClient initialized"
        );
        Self { options }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(FakeOptions::default())
    }

    fn duration_ms(&self, text: &str) -> u64 {
        (text.chars().count() as u64 * self.options.ms_per_char).max(100)
    }
}

/// 16-bit 单声道静音 WAV
fn encode_silent_wav(sample_rate: u32, duration_ms: u64) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let num_channels: u16 = 1;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);

    let samples = (sample_rate as u64 * duration_ms / 1000) as usize;
    let data_size = samples * block_align as usize;
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + data_size);

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
    wav.resize(44 + data_size, 0);

    wav
}

#[async_trait]
impl SpeechEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<(), SpeechError> {
        let duration_ms = self.duration_ms(&request.text);
        tracing::debug!(
            text_len = request.text.len(),
            duration_ms,
            "FakeTtsClient: writing silent audio"
        );

        if self.options.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.options.delay_ms)).await;
        }

        let wav = encode_silent_wav(self.options.sample_rate, duration_ms);
        tokio::fs::write(&request.output_path, wav)
            .await
            .map_err(|e| SpeechError::Io(e.to_string()))
    }

    fn name(&self) -> &str {
        "fake"
    }
}
