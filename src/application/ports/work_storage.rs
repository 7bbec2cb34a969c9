//! Work Storage Port - 工作目录抽象
//!
//! 工作目录本身就是断点：确定性路径上存在且非空的文件即视为已完成

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 工作目录错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 静音类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SilenceKind {
    Short,
    Long,
}

impl SilenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SilenceKind::Short => "short",
            SilenceKind::Long => "long",
        }
    }
}

/// Work Storage Port
///
/// 管理一次运行的全部中间文件；每个单元 / 章节写入唯一文件，无需加锁
#[async_trait]
pub trait WorkStoragePort: Send + Sync {
    /// 工作目录根
    fn root(&self) -> &Path;

    /// 单行合成结果路径
    fn line_path(&self, chapter: u32, line: usize) -> PathBuf;

    /// 章节合并结果路径
    fn chapter_path(&self, chapter: u32) -> PathBuf;

    /// 静音文件路径
    fn silence_path(&self, kind: SilenceKind) -> PathBuf;

    /// 整本书 PCM 合并结果路径
    fn book_audio_path(&self) -> PathBuf;

    /// FFMETADATA 章节文件路径
    fn chapters_file_path(&self) -> PathBuf;

    /// 拼接列表路径
    fn concat_list_path(&self, name: &str) -> PathBuf;

    /// 写入中的临时路径，成功后通过 publish 原子替换到最终路径
    fn partial_path(&self, final_path: &Path) -> PathBuf;

    /// 确保工作目录存在
    async fn prepare(&self) -> Result<(), StorageError>;

    /// 文件存在且非空
    async fn is_complete(&self, path: &Path) -> bool;

    /// 把临时文件发布到最终路径
    async fn publish(&self, partial: &Path, final_path: &Path) -> Result<(), StorageError>;

    /// 写入文本文件
    async fn write_text(&self, path: &Path, content: &str) -> Result<(), StorageError>;

    /// 删除本流水线产生的中间文件（尽力而为）
    ///
    /// 只删除确定性命名的文件及其 `.partial` 残留；`preserve` 指向的文件保留；
    /// 目录清空后才删除目录本身
    async fn cleanup(&self, preserve: &Path) -> Result<(), StorageError>;
}
