//! Narrate Commands

use std::path::PathBuf;

use crate::domain::Book;

/// 朗读整本书命令
#[derive(Debug, Clone)]
pub struct NarrateBook {
    pub book: Book,
    /// 成品 m4a 路径
    pub output_path: PathBuf,
}
