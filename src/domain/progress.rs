//! Progress - 进度状态机
//!
//! 行状态: Pending → Parsed → Synthesized → ChapterMerged → BookMerged
//! 只允许前进，不允许回退；纯观察者，不影响流水线结果

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 进度状态（顺序即前进方向）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressState {
    /// 未处理
    Pending,
    /// 文本已解析
    Parsed,
    /// 音频已合成
    Synthesized,
    /// 已合并进章节
    ChapterMerged,
    /// 已合并进整本书（终态）
    BookMerged,
}

impl ProgressState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressState::Pending => "pending",
            ProgressState::Parsed => "parsed",
            ProgressState::Synthesized => "synthesized",
            ProgressState::ChapterMerged => "chapter_merged",
            ProgressState::BookMerged => "book_merged",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressState::BookMerged)
    }
}

/// 进度统计（累计口径：达到或超过该状态的行数）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub total: usize,
    pub parsed: usize,
    pub synthesized: usize,
    pub chapter_merged: usize,
    pub complete: usize,
    pub chapters: usize,
}

/// 进度跟踪器
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    /// (chapter_number, line_index) -> state
    units: BTreeMap<(u32, usize), ProgressState>,
    /// 已完成章节合并的章节
    merged_chapters: BTreeSet<u32>,
    book_merged: bool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个单元，初始为 Pending；重复登记不改变状态
    pub fn register(&mut self, chapter: u32, line: usize) {
        let state = if self.book_merged {
            ProgressState::BookMerged
        } else {
            ProgressState::Pending
        };
        self.units.entry((chapter, line)).or_insert(state);
    }

    /// 推进单元状态；目标状态不高于当前状态时忽略，返回是否前进
    pub fn advance(&mut self, chapter: u32, line: usize, state: ProgressState) -> bool {
        let current = self
            .units
            .entry((chapter, line))
            .or_insert(ProgressState::Pending);
        if state > *current {
            *current = state;
            true
        } else {
            false
        }
    }

    /// 章节合并完成：章节内所有单元至少推进到 ChapterMerged
    pub fn mark_chapter_merged(&mut self, chapter: u32) {
        self.merged_chapters.insert(chapter);
        for (_, state) in self
            .units
            .range_mut((chapter, 0)..=(chapter, usize::MAX))
        {
            if *state < ProgressState::ChapterMerged {
                *state = ProgressState::ChapterMerged;
            }
        }
    }

    /// 整本书合并完成：广播终态
    pub fn mark_book_merged(&mut self) {
        self.book_merged = true;
        for state in self.units.values_mut() {
            *state = ProgressState::BookMerged;
        }
        let chapters: BTreeSet<u32> = self.units.keys().map(|(c, _)| *c).collect();
        self.merged_chapters.extend(chapters);
    }

    pub fn unit_state(&self, chapter: u32, line: usize) -> Option<ProgressState> {
        self.units.get(&(chapter, line)).copied()
    }

    /// 章节状态：章节内所有单元都达到的最低状态
    pub fn chapter_state(&self, chapter: u32) -> Option<ProgressState> {
        let lowest = self
            .units
            .range((chapter, 0)..=(chapter, usize::MAX))
            .map(|(_, state)| *state)
            .min();

        match lowest {
            Some(state) => Some(state),
            None if self.book_merged => Some(ProgressState::BookMerged),
            None if self.merged_chapters.contains(&chapter) => Some(ProgressState::ChapterMerged),
            None => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.book_merged
    }

    pub fn stats(&self) -> ProgressStats {
        let count_at_least =
            |floor: ProgressState| self.units.values().filter(|s| **s >= floor).count();

        let chapters: BTreeSet<u32> = self
            .units
            .keys()
            .map(|(c, _)| *c)
            .chain(self.merged_chapters.iter().copied())
            .collect();

        ProgressStats {
            total: self.units.len(),
            parsed: count_at_least(ProgressState::Parsed),
            synthesized: count_at_least(ProgressState::Synthesized),
            chapter_merged: count_at_least(ProgressState::ChapterMerged),
            complete: count_at_least(ProgressState::BookMerged),
            chapters: chapters.len(),
        }
    }
}
