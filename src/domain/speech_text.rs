//! 朗读文本规范化
//!
//! 合成前对原始文本做清洗，避免 TTS 引擎读错或卡住

use once_cell::sync::Lazy;
use regex::Regex;

static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static SPLIT_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.!?])\s*\n\s*").unwrap());
static MISSING_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^\w\s.,!?;:()'"-]"#).unwrap());
static UNTERMINATED: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-zA-Z0-9])\s*$").unwrap());

/// 规范化待合成文本
///
/// 顺序:
/// 1. 换行统一为 `\n`，压缩连续空行与空白
/// 2. 合并被排版换行拆开的句子；小写紧接大写处补句号
/// 3. 弯引号转直引号，删除安全字符集以外的字符
/// 4. 末尾缺少句末标点时补句号
pub fn normalize_for_speech(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = SPLIT_SENTENCE.replace_all(&text, "${1} ");
    let text = MISSING_BREAK.replace_all(&text, "${1}. ${2}");
    let text = text
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"");
    let text = UNSAFE_CHARS.replace_all(&text, "");
    let text = UNTERMINATED.replace(&text, "${1}.");
    text.trim().to_string()
}

/// 规范化后是否还有可朗读的内容
pub fn is_speakable(text: &str) -> bool {
    normalize_for_speech(text).chars().any(char::is_alphanumeric)
}
