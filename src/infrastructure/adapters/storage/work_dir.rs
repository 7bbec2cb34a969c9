//! Work Dir Storage - 文件系统工作目录实现
//!
//! 实现 WorkStoragePort trait，所有中间文件平铺在一个目录下

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{SilenceKind, StorageError, WorkStoragePort};

/// 根据书名 + 作者生成工作目录名
///
/// 同一本书重复运行得到同一目录，从而可以断点续跑
pub fn work_dir_key(title: &str, author: &str) -> String {
    let digest = md5::compute(format!("{}\u{1f}{}", title, author).as_bytes());
    format!("narrate-{:x}", digest)
}

/// 流水线产生的中间文件名（含 `.partial` 残留）
static OWNED_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:chapter_\d+(?:_line_\d+)?|silence_(?:short|long)|audiobook)(?:\.partial)?\.wav|(?:chapters|concat_chapter_\d+|concat_book)(?:\.partial)?\.txt)$",
    )
    .unwrap()
});

/// 文件名是否属于流水线的中间文件
pub fn is_intermediate_file(name: &str) -> bool {
    OWNED_FILE.is_match(name)
}

fn io_error(e: std::io::Error) -> StorageError {
    StorageError::IoError(e.to_string())
}

/// 文件系统工作目录
pub struct FileWorkStorage {
    /// 工作目录根
    root: PathBuf,
}

impl FileWorkStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// 在 base 下按书籍生成确定性的工作目录
    pub fn for_book(base: impl AsRef<Path>, title: &str, author: &str) -> Self {
        Self::new(base.as_ref().join(work_dir_key(title, author)))
    }
}

#[async_trait]
impl WorkStoragePort for FileWorkStorage {
    fn root(&self) -> &Path {
        &self.root
    }

    fn line_path(&self, chapter: u32, line: usize) -> PathBuf {
        self.root
            .join(format!("chapter_{}_line_{}.wav", chapter, line))
    }

    fn chapter_path(&self, chapter: u32) -> PathBuf {
        self.root.join(format!("chapter_{}.wav", chapter))
    }

    fn silence_path(&self, kind: SilenceKind) -> PathBuf {
        self.root.join(format!("silence_{}.wav", kind.as_str()))
    }

    fn book_audio_path(&self) -> PathBuf {
        self.root.join("audiobook.wav")
    }

    fn chapters_file_path(&self) -> PathBuf {
        self.root.join("chapters.txt")
    }

    fn concat_list_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn partial_path(&self, final_path: &Path) -> PathBuf {
        let stem = final_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match final_path.extension() {
            Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
            None => format!("{}.partial", stem),
        };
        final_path.with_file_name(name)
    }

    async fn prepare(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(root = %self.root.display(), "Work directory ready");
        Ok(())
    }

    async fn is_complete(&self, path: &Path) -> bool {
        match fs::metadata(path).await {
            Ok(metadata) => metadata.is_file() && metadata.len() > 0,
            Err(_) => false,
        }
    }

    async fn publish(&self, partial: &Path, final_path: &Path) -> Result<(), StorageError> {
        if fs::metadata(partial).await.is_err() {
            return Err(StorageError::FileNotFound(
                partial.to_string_lossy().to_string(),
            ));
        }

        fs::rename(partial, final_path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    async fn write_text(&self, path: &Path, content: &str) -> Result<(), StorageError> {
        fs::write(path, content)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    async fn cleanup(&self, preserve: &Path) -> Result<(), StorageError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_error(e)),
        };
        let preserve = fs::canonicalize(preserve).await.ok();

        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file || !is_intermediate_file(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let path = entry.path();
            if preserve.is_some() && fs::canonicalize(&path).await.ok() == preserve {
                tracing::warn!(path = %path.display(), "Output shares an intermediate name, keeping it");
                continue;
            }

            fs::remove_file(&path).await.map_err(io_error)?;
            removed += 1;
        }

        // 目录里还有其他文件时保留目录
        match fs::remove_dir(&self.root).await {
            Ok(()) => {
                tracing::info!(root = %self.root.display(), removed, "Work directory removed");
            }
            Err(e) => {
                tracing::info!(
                    root = %self.root.display(),
                    removed,
                    reason = %e,
                    "Intermediate files removed, work directory kept"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_deterministic_paths() {
        let storage = FileWorkStorage::new("/w");
        assert_eq!(storage.line_path(2, 5), PathBuf::from("/w/chapter_2_line_5.wav"));
        assert_eq!(storage.chapter_path(3), PathBuf::from("/w/chapter_3.wav"));
        assert_eq!(
            storage.silence_path(SilenceKind::Short),
            PathBuf::from("/w/silence_short.wav")
        );
        assert_eq!(
            storage.silence_path(SilenceKind::Long),
            PathBuf::from("/w/silence_long.wav")
        );
        assert_eq!(storage.book_audio_path(), PathBuf::from("/w/audiobook.wav"));
        assert_eq!(storage.chapters_file_path(), PathBuf::from("/w/chapters.txt"));
        assert_eq!(
            storage.partial_path(Path::new("/w/chapter_1.wav")),
            PathBuf::from("/w/chapter_1.partial.wav")
        );
    }

    #[test]
    fn test_work_dir_key_is_stable() {
        let a = work_dir_key("Dune", "Frank Herbert");
        assert_eq!(a, work_dir_key("Dune", "Frank Herbert"));
        assert_ne!(a, work_dir_key("Dune", "Brian Herbert"));
        assert!(a.starts_with("narrate-"));
    }

    #[tokio::test]
    async fn test_publish_and_resume_check() {
        let temp_dir = tempdir().unwrap();
        let storage = FileWorkStorage::new(temp_dir.path().join("work"));
        storage.prepare().await.unwrap();

        let final_path = storage.line_path(1, 0);
        let partial = storage.partial_path(&final_path);
        assert!(!storage.is_complete(&final_path).await);

        // 空文件不算完成
        storage.write_text(&partial, "").await.unwrap();
        assert!(!storage.is_complete(&partial).await);

        storage.write_text(&partial, "RIFF").await.unwrap();
        storage.publish(&partial, &final_path).await.unwrap();
        assert!(storage.is_complete(&final_path).await);
        assert!(!partial.exists());
    }

    #[tokio::test]
    async fn test_publish_missing_partial() {
        let temp_dir = tempdir().unwrap();
        let storage = FileWorkStorage::new(temp_dir.path());
        let final_path = storage.chapter_path(1);
        let err = storage
            .publish(&storage.partial_path(&final_path), &final_path)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileNotFound(_)));
    }

    #[test]
    fn test_intermediate_file_names() {
        for name in [
            "chapter_1_line_0.wav",
            "chapter_12.wav",
            "chapter_3_line_4.partial.wav",
            "silence_short.wav",
            "silence_long.partial.wav",
            "audiobook.wav",
            "chapters.txt",
            "concat_chapter_2.txt",
            "concat_book.txt",
        ] {
            assert!(is_intermediate_file(name), "{name}");
        }
        for name in [
            "book.m4a",
            "notes.txt",
            "chapter_one.wav",
            "audiobook.m4a",
            "my_chapter_1.wav",
            "concat_other.txt",
        ] {
            assert!(!is_intermediate_file(name), "{name}");
        }
    }

    #[tokio::test]
    async fn test_cleanup() {
        let temp_dir = tempdir().unwrap();
        let storage = FileWorkStorage::new(temp_dir.path().join("work"));
        storage.prepare().await.unwrap();
        storage
            .write_text(&storage.chapters_file_path(), ";FFMETADATA1\n")
            .await
            .unwrap();
        storage
            .write_text(&storage.partial_path(&storage.line_path(1, 0)), "RIFF")
            .await
            .unwrap();

        let output = temp_dir.path().join("book.m4a");
        storage.cleanup(&output).await.unwrap();
        assert!(!storage.root().exists());
        // 再次清理不报错
        storage.cleanup(&output).await.unwrap();
    }

    #[tokio::test]
    async fn test_cleanup_keeps_foreign_files() {
        let temp_dir = tempdir().unwrap();
        let storage = FileWorkStorage::new(temp_dir.path());
        storage.prepare().await.unwrap();

        let notes = temp_dir.path().join("notes.txt");
        let output = temp_dir.path().join("book.m4a");
        std::fs::write(&notes, "keep me").unwrap();
        std::fs::write(&output, "M4A").unwrap();
        storage
            .write_text(&storage.chapter_path(1), "RIFF")
            .await
            .unwrap();
        std::fs::create_dir(temp_dir.path().join("chapter_2.wav")).unwrap();

        storage.cleanup(&output).await.unwrap();

        assert!(notes.exists());
        assert!(output.exists());
        assert!(!storage.chapter_path(1).exists());
        // 同名目录不是中间文件
        assert!(temp_dir.path().join("chapter_2.wav").is_dir());
        assert!(storage.root().exists());
    }

    #[tokio::test]
    async fn test_cleanup_preserves_output_with_intermediate_name() {
        let temp_dir = tempdir().unwrap();
        let storage = FileWorkStorage::new(temp_dir.path().join("work"));
        storage.prepare().await.unwrap();

        let output = storage.book_audio_path();
        std::fs::write(&output, "final").unwrap();
        storage
            .write_text(&storage.chapters_file_path(), ";FFMETADATA1\n")
            .await
            .unwrap();

        storage.cleanup(&output).await.unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "final");
        assert!(!storage.chapters_file_path().exists());
    }
}
