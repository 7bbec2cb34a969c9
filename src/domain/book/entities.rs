//! Book Context - Entities

use serde::{Deserialize, Serialize};

use super::BookError;

/// 书籍 - 外部解析器产出的不可变输入
///
/// 不变量:
/// - 至少一个章节
/// - 章节编号从 1 开始连续
/// - 每个章节至少一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    title: String,
    author: String,
    chapters: Vec<Chapter>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> Result<Self, BookError> {
        let book = Self {
            title: title.into(),
            author: author.into(),
            chapters,
        };
        book.validate()?;
        Ok(book)
    }

    /// 从 JSON 读取并校验
    pub fn from_json(json: &str) -> Result<Self, BookError> {
        let book: Book =
            serde_json::from_str(json).map_err(|e| BookError::InvalidJson(e.to_string()))?;
        book.validate()?;
        Ok(book)
    }

    pub fn validate(&self) -> Result<(), BookError> {
        if self.chapters.is_empty() {
            return Err(BookError::NoChapters);
        }

        for (position, chapter) in self.chapters.iter().enumerate() {
            let expected = position as u32 + 1;
            if chapter.number != expected {
                return Err(BookError::NonContiguousChapters {
                    expected,
                    found: chapter.number,
                });
            }
            if chapter.lines.is_empty() {
                return Err(BookError::EmptyChapter(chapter.number));
            }
        }

        Ok(())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn total_lines(&self) -> usize {
        self.chapters.iter().map(|c| c.lines.len()).sum()
    }
}

/// 章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// 章节编号（从 1 开始）
    number: u32,
    /// 章节标题，可缺省
    #[serde(default)]
    title: Option<String>,
    /// 原始文本行
    lines: Vec<String>,
}

impl Chapter {
    pub fn new(number: u32, title: Option<String>, lines: Vec<String>) -> Self {
        Self {
            number,
            title,
            lines,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// 标题，缺省时为 "Chapter N"
    pub fn display_title(&self) -> String {
        self.title()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Chapter {}", self.number))
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// 文本单元 - 最小合成单位
///
/// 不变量:
/// - (chapter_number, line_index) 在整本书内唯一
/// - line_index 为原始行位置，生成后不再重排
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    pub chapter_number: u32,
    pub line_index: usize,
    pub text: String,
}

impl TextUnit {
    pub fn new(chapter_number: u32, line_index: usize, text: impl Into<String>) -> Self {
        Self {
            chapter_number,
            line_index,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chapter(number: u32, lines: &[&str]) -> Chapter {
        Chapter::new(number, None, lines.iter().map(|l| l.to_string()).collect())
    }

    #[test]
    fn test_valid_book() {
        let book = Book::new("T", "A", vec![chapter(1, &["a"]), chapter(2, &["b", "c"])]).unwrap();
        assert_eq!(book.total_lines(), 3);
    }

    #[test]
    fn test_rejects_empty_book() {
        assert_eq!(Book::new("T", "A", vec![]), Err(BookError::NoChapters));
    }

    #[test]
    fn test_rejects_empty_chapter() {
        let result = Book::new("T", "A", vec![chapter(1, &["a"]), chapter(2, &[])]);
        assert_eq!(result, Err(BookError::EmptyChapter(2)));
    }

    #[test]
    fn test_rejects_gap_in_numbering() {
        let result = Book::new("T", "A", vec![chapter(1, &["a"]), chapter(3, &["b"])]);
        assert_eq!(
            result,
            Err(BookError::NonContiguousChapters {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_display_title_fallback() {
        let untitled = chapter(4, &["x"]);
        assert_eq!(untitled.display_title(), "Chapter 4");

        let blank = Chapter::new(2, Some("  ".to_string()), vec!["x".to_string()]);
        assert_eq!(blank.display_title(), "Chapter 2");

        let titled = Chapter::new(1, Some("Prologue".to_string()), vec!["x".to_string()]);
        assert_eq!(titled.display_title(), "Prologue");
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "title": "Book",
            "author": "Someone",
            "chapters": [
                {"number": 1, "title": "One", "lines": ["Hello.", "World."]},
                {"number": 2, "lines": ["Goodbye."]}
            ]
        }"#;
        let book = Book::from_json(json).unwrap();
        assert_eq!(book.chapters().len(), 2);
        assert_eq!(book.chapters()[1].title(), None);
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"{"title": "B", "author": "A", "chapters": []}"#;
        assert_eq!(Book::from_json(json), Err(BookError::NoChapters));
        assert!(matches!(
            Book::from_json("not json"),
            Err(BookError::InvalidJson(_))
        ));
    }
}
