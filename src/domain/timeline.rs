//! Timeline - 静音穿插规则
//!
//! 规则:
//! - 章内相邻两行之间插入短静音
//! - 每章最后一行之后插入长静音（全书最后一章可按策略关闭）
//! - 可选：章节第一行（通常是标题）之后改用长静音

use serde::{Deserialize, Serialize};

use super::narration::AudioAsset;

/// 静音策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilencePolicy {
    /// 章节第一行之后使用长静音
    #[serde(default)]
    pub long_after_first_line: bool,

    /// 全书最后一章之后是否也补长静音
    #[serde(default = "default_trailing")]
    pub trailing_after_last_chapter: bool,
}

fn default_trailing() -> bool {
    true
}

impl Default for SilencePolicy {
    fn default() -> Self {
        Self {
            long_after_first_line: false,
            trailing_after_last_chapter: default_trailing(),
        }
    }
}

/// 时间线条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEntry {
    /// 第 n 个（按 line_index 排序后）合成行
    Line(usize),
    ShortSilence,
    LongSilence,
}

/// 规划章节时间线
///
/// `line_count` 为已按 line_index 排序的行数，`is_last_chapter` 指全书最后一章
pub fn plan_chapter_timeline(
    line_count: usize,
    is_last_chapter: bool,
    policy: &SilencePolicy,
) -> Vec<TimelineEntry> {
    let mut entries = Vec::with_capacity(line_count * 2);

    for position in 0..line_count {
        entries.push(TimelineEntry::Line(position));

        let is_last_line = position + 1 == line_count;
        if is_last_line {
            if !is_last_chapter || policy.trailing_after_last_chapter {
                entries.push(TimelineEntry::LongSilence);
            }
        } else if position == 0 && policy.long_after_first_line {
            entries.push(TimelineEntry::LongSilence);
        } else {
            entries.push(TimelineEntry::ShortSilence);
        }
    }

    entries
}

/// 把时间线条目解析为具体资产
pub fn resolve_timeline<'a>(
    entries: &[TimelineEntry],
    lines: &'a [AudioAsset],
    short_silence: &'a AudioAsset,
    long_silence: &'a AudioAsset,
) -> Vec<&'a AudioAsset> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            TimelineEntry::Line(position) => lines.get(*position),
            TimelineEntry::ShortSilence => Some(short_silence),
            TimelineEntry::LongSilence => Some(long_silence),
        })
        .collect()
}

/// 渲染拼接列表：每行 `file '<name>'`
///
/// 单引号按 ffmpeg concat 规则写作 `'\''`
pub fn render_concat_list<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for name in names {
        out.push_str("file '");
        out.push_str(&name.as_ref().replace('\'', "'\\''"));
        out.push_str("'\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::narration::AssetKind;
    use TimelineEntry::*;

    #[test]
    fn test_two_lines() {
        let plan = plan_chapter_timeline(2, false, &SilencePolicy::default());
        assert_eq!(plan, vec![Line(0), ShortSilence, Line(1), LongSilence]);
    }

    #[test]
    fn test_single_line_gets_only_long_silence() {
        let plan = plan_chapter_timeline(1, false, &SilencePolicy::default());
        assert_eq!(plan, vec![Line(0), LongSilence]);
    }

    #[test]
    fn test_last_chapter_trailing_silence_by_default() {
        let plan = plan_chapter_timeline(1, true, &SilencePolicy::default());
        assert_eq!(plan, vec![Line(0), LongSilence]);
    }

    #[test]
    fn test_last_chapter_trailing_silence_disabled() {
        let policy = SilencePolicy {
            trailing_after_last_chapter: false,
            ..Default::default()
        };
        assert_eq!(plan_chapter_timeline(2, true, &policy), vec![Line(0), ShortSilence, Line(1)]);
        // 非最后一章不受影响
        assert_eq!(
            plan_chapter_timeline(1, false, &policy),
            vec![Line(0), LongSilence]
        );
    }

    #[test]
    fn test_long_after_first_line() {
        let policy = SilencePolicy {
            long_after_first_line: true,
            ..Default::default()
        };
        let plan = plan_chapter_timeline(3, false, &policy);
        assert_eq!(
            plan,
            vec![Line(0), LongSilence, Line(1), ShortSilence, Line(2), LongSilence]
        );
    }

    #[test]
    fn test_empty_chapter_has_empty_plan() {
        assert!(plan_chapter_timeline(0, false, &SilencePolicy::default()).is_empty());
    }

    #[test]
    fn test_render_concat_list() {
        let list = render_concat_list(["chapter_1_line_0.wav", "silence_long.wav"]);
        assert_eq!(
            list,
            "file 'chapter_1_line_0.wav'\nfile 'silence_long.wav'\n"
        );
    }

    #[test]
    fn test_render_concat_list_escapes_quotes() {
        assert_eq!(render_concat_list(["it's.wav"]), "file 'it'\\''s.wav'\n");
    }

    #[test]
    fn test_resolve_timeline() {
        let lines = vec![
            AudioAsset::new("l0.wav", 1.0, AssetKind::Synthesized),
            AudioAsset::new("l1.wav", 2.0, AssetKind::Synthesized),
        ];
        let short = AudioAsset::new("short.wav", 0.8, AssetKind::Silence);
        let long = AudioAsset::new("long.wav", 1.5, AssetKind::Silence);
        let plan = plan_chapter_timeline(2, false, &SilencePolicy::default());

        let paths: Vec<String> = resolve_timeline(&plan, &lines, &short, &long)
            .iter()
            .map(|a| a.path().display().to_string())
            .collect();
        assert_eq!(paths, vec!["l0.wav", "short.wav", "l1.wav", "long.wav"]);
    }
}
