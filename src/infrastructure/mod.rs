//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;

pub use adapters::{
    build_speech_engine, work_dir_key, FfmpegConfig, FfmpegEngine, FileWorkStorage,
    SpeechEngineKind,
};
pub use events::{EventPublisher, ProgressListener};
