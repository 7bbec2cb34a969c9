//! Narrate - 有声书生成流水线
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 书籍 / 章节 / 文本单元
//! - 文本分割、朗读文本规范化、静音时间线、章节标记、进度状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechEngine, AudioEngine, WorkStorage, EventSink）
//! - Narration: 合成调度、静音资产、时间线合并
//! - Commands: NarrateBook 命令处理器
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: Piper / Fake TTS, FFmpeg, 工作目录, 进程执行
//! - Events: 事件发布与进度监听

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
