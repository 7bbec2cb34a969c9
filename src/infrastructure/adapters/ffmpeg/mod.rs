//! FFmpeg Adapter - 音频引擎实现

mod ffmpeg_engine;

pub use ffmpeg_engine::{FfmpegConfig, FfmpegEngine};
