//! Piper TTS Client - 调用本地 piper 可执行文件
//!
//! 实现 SpeechEnginePort trait，每行文本启动一次 piper 进程
//!
//! 调用方式:
//! piper --model <voice> --sentence-silence <s> --output-file <path>
//! 文本通过 stdin 传入，音频写到 output-file

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{SpeechEnginePort, SpeechError, SynthesisRequest};
use crate::infrastructure::adapters::command::{run_command, timeout_from_secs, CommandError};

/// Piper 客户端配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiperOptions {
    /// piper 可执行文件
    #[serde(default = "default_binary")]
    pub binary: String,
    /// 语音模型（.onnx）路径
    #[serde(default)]
    pub voice: String,
    /// 句间静音（秒）
    #[serde(default = "default_sentence_silence")]
    pub sentence_silence: f64,
}

fn default_binary() -> String {
    "piper".to_string()
}

fn default_sentence_silence() -> f64 {
    0.5
}

impl PiperOptions {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            binary: default_binary(),
            voice: voice.into(),
            sentence_silence: default_sentence_silence(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

/// Piper 客户端
pub struct PiperClient {
    options: PiperOptions,
    timeout: Option<Duration>,
}

impl PiperClient {
    /// `timeout_secs` 为 0 表示不限时
    pub fn new(options: PiperOptions, timeout_secs: u64) -> Self {
        Self {
            options,
            timeout: timeout_from_secs(timeout_secs),
        }
    }

    /// 构建命令行参数
    fn build_args(&self, output_path: &Path) -> Vec<String> {
        vec![
            "--model".to_string(),
            self.options.voice.clone(),
            "--sentence-silence".to_string(),
            self.options.sentence_silence.to_string(),
            "--output-file".to_string(),
            output_path.display().to_string(),
        ]
    }
}

#[async_trait]
impl SpeechEnginePort for PiperClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<(), SpeechError> {
        let args = self.build_args(&request.output_path);

        tracing::debug!(
            voice = %self.options.voice,
            text_len = request.text.len(),
            output = %request.output_path.display(),
            "Sending text to piper"
        );

        let output = run_command(
            &self.options.binary,
            &args,
            Some(&request.text),
            self.timeout,
        )
        .await
        .map_err(|e| match e {
            CommandError::Spawn { message, .. } => SpeechError::Spawn(message),
            CommandError::Timeout { after_secs, .. } => SpeechError::Timeout { after_secs },
            CommandError::Io { message, .. } => SpeechError::Io(message),
        })?;

        if !output.success {
            return Err(SpeechError::Failed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        tracing::debug!(
            output = %request.output_path.display(),
            elapsed_ms = output.elapsed.as_millis() as u64,
            "Piper synthesis completed"
        );

        Ok(())
    }

    fn name(&self) -> &str {
        "piper"
    }

    async fn health_check(&self) -> bool {
        match run_command(
            &self.options.binary,
            &["--help".to_string()],
            None,
            Some(Duration::from_secs(5)),
        )
        .await
        {
            Ok(output) => output.success,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default() {
        let options = PiperOptions::new("en_US-lessac-medium.onnx");
        assert_eq!(options.binary, "piper");
        assert_eq!(options.sentence_silence, 0.5);
    }

    #[test]
    fn test_build_args() {
        let client = PiperClient::new(
            PiperOptions::new("voice.onnx").with_binary("/opt/piper/piper"),
            300,
        );
        let args = client.build_args(Path::new("/tmp/work/chapter_1_line_0.partial.wav"));
        assert_eq!(
            args,
            vec![
                "--model",
                "voice.onnx",
                "--sentence-silence",
                "0.5",
                "--output-file",
                "/tmp/work/chapter_1_line_0.partial.wav",
            ]
        );
        assert_eq!(client.timeout, Some(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let client = PiperClient::new(
            PiperOptions::new("voice.onnx").with_binary("narrate-no-such-piper"),
            0,
        );
        let err = client
            .synthesize(SynthesisRequest {
                text: "Hello.".to_string(),
                output_path: std::env::temp_dir().join("narrate-never-written.wav"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Spawn(_)));
        assert!(!client.health_check().await);
    }
}
