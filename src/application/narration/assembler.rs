//! Timeline Assembler - 章节合并与整书合并
//!
//! 章节按时间线（行 + 静音）拼接为 PCM；整书按章节顺序拼接，不再插入静音；
//! 最后写入章节标记与元数据产出成品

use std::path::Path;
use std::sync::Arc;

use super::silence::SilenceAssets;
use crate::application::error::NarrateError;
use crate::application::ports::{
    AudioEnginePort, AudioFormat, BookMetadata, ConcatRequest, EventSinkPort, OutputCodec,
    PipelineEvent, TagRequest, WorkStoragePort,
};
use crate::domain::{
    calculate_chapter_markers, plan_chapter_timeline, render_concat_list, render_ffmetadata,
    resolve_timeline, AssetKind, AudioAsset, Book, Chapter, ChapterMarker, ChapterNarration,
    SilencePolicy,
};

/// 成品元数据中的 comment
pub const GENERATOR_COMMENT: &str = "Generated with narrate";

/// 成品输出设置
#[derive(Debug, Clone)]
pub struct FinalOutput {
    pub bitrate: String,
    /// 最后一章 END 的替代值（毫秒）
    pub final_end_sentinel: Option<u64>,
}

impl Default for FinalOutput {
    fn default() -> Self {
        Self {
            bitrate: "128k".to_string(),
            final_end_sentinel: None,
        }
    }
}

/// 时间线合并器
pub struct TimelineAssembler {
    audio_engine: Arc<dyn AudioEnginePort>,
    storage: Arc<dyn WorkStoragePort>,
    events: Arc<dyn EventSinkPort>,
    policy: SilencePolicy,
}

impl TimelineAssembler {
    pub fn new(
        audio_engine: Arc<dyn AudioEnginePort>,
        storage: Arc<dyn WorkStoragePort>,
        events: Arc<dyn EventSinkPort>,
        policy: SilencePolicy,
    ) -> Self {
        Self {
            audio_engine,
            storage,
            events,
            policy,
        }
    }

    /// 合并一个章节
    ///
    /// `lines` 必须已按 line_index 排序；返回的时长为合并文件的实测时长
    pub async fn merge_chapter(
        &self,
        chapter: &Chapter,
        lines: &[AudioAsset],
        silence: &SilenceAssets,
        is_last_chapter: bool,
    ) -> Result<ChapterNarration, NarrateError> {
        let number = chapter.number();
        if lines.is_empty() {
            return Err(NarrateError::EmptyChapter { chapter: number });
        }

        let final_path = self.storage.chapter_path(number);
        let merge_failed = |e: NarrateError| match e {
            NarrateError::AudioEngine(source) => NarrateError::ChapterMergeFailed {
                chapter: number,
                source,
            },
            other => other,
        };

        // 断点：章节文件已存在则只重新测量时长
        let merged = if self.storage.is_complete(&final_path).await {
            let duration_secs = self
                .audio_engine
                .probe_duration(&final_path)
                .await
                .map_err(|e| merge_failed(e.into()))?;
            tracing::info!(chapter = number, duration_secs, "Reusing merged chapter");
            AudioAsset::new(final_path, duration_secs, AssetKind::Merged)
        } else {
            let plan = plan_chapter_timeline(lines.len(), is_last_chapter, &self.policy);
            let timeline = resolve_timeline(&plan, lines, &silence.short, &silence.long);

            self.events.publish(PipelineEvent::ChapterMergeStarted {
                chapter: number,
                total_files: timeline.len(),
            });

            let list_name = format!("concat_chapter_{}.txt", number);
            let merged = self
                .concat_assets(&list_name, &timeline, &final_path, silence.format)
                .await
                .map_err(merge_failed)?;

            tracing::info!(
                chapter = number,
                entries = timeline.len(),
                duration_secs = merged.duration_secs,
                "Chapter merged"
            );
            merged
        };

        self.events.publish(PipelineEvent::ChapterMerged {
            chapter: number,
            duration_secs: merged.duration_secs,
            audio_file: merged.path.clone(),
        });

        Ok(ChapterNarration {
            chapter: chapter.clone(),
            duration_secs: merged.duration_secs,
            audio_file: merged.path,
        })
    }

    /// 按章节编号顺序合并整本书（PCM，不插入静音）
    pub async fn merge_book(
        &self,
        narrations: &[ChapterNarration],
        format: AudioFormat,
    ) -> Result<AudioAsset, NarrateError> {
        self.events.publish(PipelineEvent::BookAssemblyStarted {
            total_chapters: narrations.len(),
        });

        let mut ordered: Vec<&ChapterNarration> = narrations.iter().collect();
        ordered.sort_by_key(|n| n.number());

        let chapter_assets: Vec<AudioAsset> = ordered
            .iter()
            .map(|n| AudioAsset::new(n.audio_file.clone(), n.duration_secs, AssetKind::Merged))
            .collect();
        let refs: Vec<&AudioAsset> = chapter_assets.iter().collect();

        let final_path = self.storage.book_audio_path();
        let book = self
            .concat_assets("concat_book.txt", &refs, &final_path, format)
            .await?;

        tracing::info!(
            chapters = narrations.len(),
            duration_secs = book.duration_secs,
            "Book merged"
        );

        Ok(book)
    }

    /// 写入章节文件并产出带元数据的成品
    pub async fn finalize(
        &self,
        book: &Book,
        narrations: &[ChapterNarration],
        merged: &AudioAsset,
        output_path: &Path,
        output: &FinalOutput,
    ) -> Result<Vec<ChapterMarker>, NarrateError> {
        let markers = calculate_chapter_markers(narrations);
        let chapters_path = self.storage.chapters_file_path();
        self.storage
            .write_text(
                &chapters_path,
                &render_ffmetadata(&markers, output.final_end_sentinel),
            )
            .await?;

        let request = TagRequest {
            input_path: merged.path.clone(),
            chapters_path,
            output_path: output_path.to_path_buf(),
            metadata: BookMetadata {
                title: book.title().to_string(),
                artist: book.author().to_string(),
                album: book.title().to_string(),
                comment: GENERATOR_COMMENT.to_string(),
            },
            codec: OutputCodec::Aac {
                bitrate: output.bitrate.clone(),
            },
        };
        self.audio_engine.tag(&request).await?;

        let total_duration_secs = markers.last().map(|m| m.end_secs).unwrap_or(0.0);
        tracing::info!(
            output = %output_path.display(),
            chapters = markers.len(),
            total_duration_secs,
            "Audiobook written"
        );

        self.events.publish(PipelineEvent::BookAssembled {
            output_path: output_path.to_path_buf(),
            total_duration_secs,
        });

        Ok(markers)
    }

    /// 写拼接列表 -> 拼接到临时文件 -> 发布 -> 实测时长
    async fn concat_assets(
        &self,
        list_name: &str,
        assets: &[&AudioAsset],
        final_path: &Path,
        format: AudioFormat,
    ) -> Result<AudioAsset, NarrateError> {
        let list_path = self.storage.concat_list_path(list_name);
        let list = render_concat_list(assets.iter().map(|a| list_entry(a.path())));
        self.storage.write_text(&list_path, &list).await?;

        let partial_path = self.storage.partial_path(final_path);
        let request = ConcatRequest {
            list_path,
            output_path: partial_path.clone(),
            format,
            codec: OutputCodec::Pcm16,
        };
        self.audio_engine.concat(&request).await?;
        self.storage.publish(&partial_path, final_path).await?;

        let duration_secs = self.audio_engine.probe_duration(final_path).await?;
        Ok(AudioAsset::new(final_path, duration_secs, AssetKind::Merged))
    }
}

/// 列表文件与音频位于同一目录，只写文件名
fn list_entry(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
