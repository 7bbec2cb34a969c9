//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（SpeechEngine、AudioEngine、WorkStorage、EventSink）
//! - narration: 合成调度、静音资产、时间线合并
//! - commands: NarrateBook 命令及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod narration;
pub mod ports;

// Re-exports
pub use commands::{
    handlers::{NarrateBookHandler, NarrateOptions, NarrateResponse},
    NarrateBook,
};

pub use error::{NarrateError, UnitFailure};

pub use narration::{
    FinalOutput, SilenceAssets, SilenceDurations, SilenceProvider, SynthesisScheduler,
    TimelineAssembler,
};

pub use ports::{
    // Audio engine
    AudioEngineError,
    AudioEnginePort,
    AudioFormat,
    BookMetadata,
    ConcatRequest,
    OutputCodec,
    TagRequest,
    // Events
    EventSinkPort,
    PipelineEvent,
    // Speech engine
    SpeechEnginePort,
    SpeechError,
    SynthesisRequest,
    // Work storage
    SilenceKind,
    StorageError,
    WorkStoragePort,
};
