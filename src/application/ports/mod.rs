//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_engine;
mod event_sink;
mod speech_engine;
mod work_storage;

pub use audio_engine::{
    AudioEngineError, AudioEnginePort, AudioFormat, BookMetadata, ConcatRequest, OutputCodec,
    TagRequest,
};
pub use event_sink::{EventSinkPort, PipelineEvent};
pub use speech_engine::{SpeechEnginePort, SpeechError, SynthesisRequest};
pub use work_storage::{SilenceKind, StorageError, WorkStoragePort};
