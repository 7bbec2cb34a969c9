//! Book Context - 书籍限界上下文
//!
//! 职责:
//! - 书籍 / 章节 / 文本单元
//! - 输入结构校验

mod entities;
mod errors;

pub use entities::{Book, Chapter, TextUnit};
pub use errors::BookError;
