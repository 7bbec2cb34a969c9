//! 应用层 - 命令
//!
//! 朗读流程的入口命令及处理器

mod narrate_commands;

pub mod handlers;

pub use narrate_commands::*;
