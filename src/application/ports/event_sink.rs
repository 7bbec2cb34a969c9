//! Event Sink Port - 流水线事件
//!
//! 单向事件：流水线 -> 事件 -> 订阅者。订阅者只做副作用，不参与正确性

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 流水线事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// 输入书籍已载入
    BookLoaded {
        title: String,
        author: String,
        chapters: usize,
        total_lines: usize,
    },
    /// 章节已分段，lines 为各文本单元的 line_index
    ChapterParsed { chapter: u32, lines: Vec<usize> },
    /// 开始合成
    SpeechStarted { concurrency: usize, total_units: usize },
    /// 单行开始合成
    LineSynthesisStarted { chapter: u32, line: usize },
    /// 单行合成完成（resumed 表示复用了已有文件）
    LineSynthesized {
        chapter: u32,
        line: usize,
        audio_file: PathBuf,
        duration_secs: f64,
        resumed: bool,
    },
    /// 章节开始合并
    ChapterMergeStarted { chapter: u32, total_files: usize },
    /// 章节合并完成
    ChapterMerged {
        chapter: u32,
        duration_secs: f64,
        audio_file: PathBuf,
    },
    /// 开始整本书合并
    BookAssemblyStarted { total_chapters: usize },
    /// 整本书合并完成
    BookAssembled {
        output_path: PathBuf,
        total_duration_secs: f64,
    },
    /// 全部完成
    ProcessingComplete {
        output_path: PathBuf,
        total_lines: usize,
        total_chapters: usize,
        total_duration_secs: f64,
    },
}

impl PipelineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PipelineEvent::BookLoaded { .. } => "book_loaded",
            PipelineEvent::ChapterParsed { .. } => "chapter_parsed",
            PipelineEvent::SpeechStarted { .. } => "speech_started",
            PipelineEvent::LineSynthesisStarted { .. } => "line_synthesis_started",
            PipelineEvent::LineSynthesized { .. } => "line_synthesized",
            PipelineEvent::ChapterMergeStarted { .. } => "chapter_merge_started",
            PipelineEvent::ChapterMerged { .. } => "chapter_merged",
            PipelineEvent::BookAssemblyStarted { .. } => "book_assembly_started",
            PipelineEvent::BookAssembled { .. } => "book_assembled",
            PipelineEvent::ProcessingComplete { .. } => "processing_complete",
        }
    }
}

/// Event Sink Port
///
/// publish 不得阻塞，也不得失败
pub trait EventSinkPort: Send + Sync {
    fn publish(&self, event: PipelineEvent);
}
