//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod command;
pub mod ffmpeg;
pub mod storage;
pub mod tts;

pub use ffmpeg::*;
pub use storage::*;
pub use tts::*;
