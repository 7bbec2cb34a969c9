//! Domain Layer - 领域层
//!
//! 纯类型与算法，不做任何 IO:
//! - Book Context: 书籍 / 章节 / 文本单元
//! - Narration: 音频资产与朗读结果
//! - 文本分割、朗读文本规范化、静音时间线、章节标记、进度状态机

pub mod book;
pub mod markers;
pub mod narration;
pub mod progress;
pub mod speech_text;
pub mod timeline;

mod text_segmenter;

pub use book::{Book, BookError, Chapter, TextUnit};
pub use markers::{calculate_chapter_markers, render_ffmetadata, ChapterMarker};
pub use narration::{AssetKind, AudioAsset, BookNarration, ChapterNarration};
pub use progress::{ProgressState, ProgressStats, ProgressTracker};
pub use speech_text::normalize_for_speech;
pub use text_segmenter::{estimate_reading_minutes, segment_book, segment_chapter};
pub use timeline::{
    plan_chapter_timeline, render_concat_list, resolve_timeline, SilencePolicy, TimelineEntry,
};
