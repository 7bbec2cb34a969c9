//! Narration - 音频资产与朗读结果

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::book::{Book, Chapter};

/// 音频资产类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// 单行合成结果
    Synthesized,
    /// 静音填充（整本书共享）
    Silence,
    /// 章节合并结果
    Merged,
}

/// 音频资产: 文件路径 + 时长（秒）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub kind: AssetKind,
}

impl AudioAsset {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64, kind: AssetKind) -> Self {
        Self {
            path: path.into(),
            duration_secs,
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// 章节朗读结果，每章恰好一个
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterNarration {
    pub chapter: Chapter,
    /// 实测时长（秒）
    pub duration_secs: f64,
    pub audio_file: PathBuf,
}

impl ChapterNarration {
    pub fn number(&self) -> u32 {
        self.chapter.number()
    }
}

/// 整本书朗读结果，按章节编号排序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookNarration {
    pub book: Book,
    pub chapter_narrations: Vec<ChapterNarration>,
}

impl BookNarration {
    pub fn new(book: Book, mut chapter_narrations: Vec<ChapterNarration>) -> Self {
        chapter_narrations.sort_by_key(|c| c.number());
        Self {
            book,
            chapter_narrations,
        }
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.chapter_narrations.iter().map(|c| c.duration_secs).sum()
    }
}
