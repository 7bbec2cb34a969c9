//! TTS Adapter - 合成引擎实现与选择

mod fake_tts_client;
mod piper_client;

pub use fake_tts_client::{FakeOptions, FakeTtsClient};
pub use piper_client::{PiperClient, PiperOptions};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::ports::SpeechEnginePort;

/// 合成引擎选择，启动时确定一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpeechEngineKind {
    Piper(PiperOptions),
    Fake(FakeOptions),
}

impl Default for SpeechEngineKind {
    fn default() -> Self {
        SpeechEngineKind::Piper(PiperOptions::new(""))
    }
}

/// 根据配置构建合成引擎
pub fn build_speech_engine(kind: &SpeechEngineKind, timeout_secs: u64) -> Arc<dyn SpeechEnginePort> {
    match kind {
        SpeechEngineKind::Piper(options) => Arc::new(PiperClient::new(options.clone(), timeout_secs)),
        SpeechEngineKind::Fake(options) => Arc::new(FakeTtsClient::new(options.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_deserialize() {
        let kind: SpeechEngineKind =
            serde_json::from_str(r#"{"kind": "piper", "voice": "en.onnx"}"#).unwrap();
        assert_eq!(kind, SpeechEngineKind::Piper(PiperOptions::new("en.onnx")));

        let kind: SpeechEngineKind = serde_json::from_str(r#"{"kind": "fake"}"#).unwrap();
        assert_eq!(kind, SpeechEngineKind::Fake(FakeOptions::default()));
    }

    #[test]
    fn test_build_speech_engine() {
        let engine = build_speech_engine(&SpeechEngineKind::Piper(PiperOptions::new("v.onnx")), 10);
        assert_eq!(engine.name(), "piper");
        let engine = build_speech_engine(&SpeechEngineKind::Fake(FakeOptions::default()), 10);
        assert_eq!(engine.name(), "fake");
    }
}
