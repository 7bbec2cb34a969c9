//! Chapter Markers - 章节标记计算与 FFMETADATA 渲染

use serde::{Deserialize, Serialize};

use super::narration::ChapterNarration;

/// FFMETADATA 文件头
pub const FFMETADATA_HEADER: &str = ";FFMETADATA1";

/// 章节标记，时间线连续
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterMarker {
    pub title: String,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// 根据实测章节时长计算连续的章节标记
///
/// marker[0].start = 0，marker[i].end = marker[i].start + duration[i]，
/// marker[i+1].start = marker[i].end
pub fn calculate_chapter_markers(narrations: &[ChapterNarration]) -> Vec<ChapterMarker> {
    let mut start = 0.0;

    narrations
        .iter()
        .map(|narration| {
            let end = start + narration.duration_secs;
            let marker = ChapterMarker {
                title: narration.chapter.display_title(),
                start_secs: start,
                end_secs: end,
            };
            start = end;
            marker
        })
        .collect()
}

/// 秒 -> 毫秒（向下取整）
fn to_millis(secs: f64) -> u64 {
    (secs * 1000.0).floor().max(0.0) as u64
}

/// 渲染 FFMETADATA 章节文件
///
/// `final_end_sentinel` 为 Some 时，最后一章的 END 使用该值替代实测结束时间
pub fn render_ffmetadata(markers: &[ChapterMarker], final_end_sentinel: Option<u64>) -> String {
    let mut out = String::from(FFMETADATA_HEADER);
    out.push('\n');

    for (i, marker) in markers.iter().enumerate() {
        let is_last = i + 1 == markers.len();
        let end_ms = match final_end_sentinel {
            Some(sentinel) if is_last => sentinel,
            _ => to_millis(marker.end_secs),
        };

        out.push('\n');
        out.push_str("[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\n", to_millis(marker.start_secs)));
        out.push_str(&format!("END={}\n", end_ms));
        out.push_str(&format!("title={}\n", escape_metadata(&marker.title)));
    }

    out
}

/// FFMETADATA 中 `=`、`;`、`#`、`\` 与换行需要转义
fn escape_metadata(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '=' | ';' | '#' | '\\' | '\n' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
