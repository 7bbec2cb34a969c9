//! 文本分割器
//!
//! 把章节拆成有序的文本单元（每个非空行一个）

use super::book::{Book, Chapter, TextUnit};
use super::speech_text::is_speakable;

/// 阅读时长估算的语速（词/分钟）
pub const WORDS_PER_MINUTE: usize = 200;

/// 对章节进行分段
///
/// 分段策略：
/// 1. 每个原始行对应一个单元，line_index 为原始行位置
/// 2. trim 后为空的行跳过（其 index 保留不用）
/// 3. 没有任何可朗读字符的行（如 "* * *"）同样跳过
pub fn segment_chapter(chapter: &Chapter) -> Vec<TextUnit> {
    chapter
        .lines()
        .iter()
        .enumerate()
        .filter_map(|(line_index, line)| {
            let trimmed = line.trim();
            if trimmed.is_empty() || !is_speakable(trimmed) {
                return None;
            }
            Some(TextUnit::new(chapter.number(), line_index, trimmed))
        })
        .collect()
}

/// 整本书分段，按章节顺序
pub fn segment_book(book: &Book) -> Vec<(u32, Vec<TextUnit>)> {
    book.chapters()
        .iter()
        .map(|chapter| (chapter.number(), segment_chapter(chapter)))
        .collect()
}

/// 估算朗读时长（分钟，向上取整）
///
/// 仅用于进度预估，不参与章节标记计算
pub fn estimate_reading_minutes(text: &str) -> usize {
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE)
}
