//! Book Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookError {
    #[error("book has no chapters")]
    NoChapters,

    #[error("chapter {0} has no lines")]
    EmptyChapter(u32),

    #[error("chapter numbers must be contiguous from 1: expected {expected}, found {found}")]
    NonContiguousChapters { expected: u32, found: u32 },

    #[error("invalid book json: {0}")]
    InvalidJson(String),
}
