//! Narration Services - 朗读流水线的应用服务
//!
//! - scheduler: 有界并发逐行合成
//! - silence: 一次性生成的静音资产
//! - assembler: 章节 / 整书合并与成品输出

mod assembler;
mod scheduler;
mod silence;

pub use assembler::{FinalOutput, TimelineAssembler, GENERATOR_COMMENT};
pub use scheduler::SynthesisScheduler;
pub use silence::{SilenceAssets, SilenceDurations, SilenceProvider};
