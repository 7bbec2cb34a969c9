//! Narrate Command Handler - 整本书朗读流程编排
//!
//! 单一控制流顺序驱动章节：
//! 分段 -> 逐章合成（全局并发上限 C）-> 章节合并 -> 整书合并 -> 章节标记 -> 成品

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::commands::NarrateBook;
use crate::application::error::NarrateError;
use crate::application::narration::{
    FinalOutput, SilenceAssets, SilenceDurations, SilenceProvider, SynthesisScheduler,
    TimelineAssembler,
};
use crate::application::ports::{
    AudioEnginePort, AudioFormat, EventSinkPort, PipelineEvent, SpeechEnginePort, WorkStoragePort,
};
use crate::domain::{
    estimate_reading_minutes, segment_book, BookNarration, ChapterMarker, SilencePolicy,
};

/// 流程参数
#[derive(Debug, Clone)]
pub struct NarrateOptions {
    /// 合成并发上限
    pub concurrency: usize,
    pub silence: SilenceDurations,
    /// 首行探测失败时使用的格式
    pub default_format: AudioFormat,
    pub policy: SilencePolicy,
    pub final_output: FinalOutput,
    /// 成功后保留工作目录
    pub keep_work_dir: bool,
}

impl Default for NarrateOptions {
    fn default() -> Self {
        Self {
            concurrency: 6,
            silence: SilenceDurations::default(),
            default_format: AudioFormat::default(),
            policy: SilencePolicy::default(),
            final_output: FinalOutput::default(),
            keep_work_dir: false,
        }
    }
}

/// 朗读结果
#[derive(Debug, Clone)]
pub struct NarrateResponse {
    pub output_path: PathBuf,
    pub narration: BookNarration,
    pub markers: Vec<ChapterMarker>,
    pub total_lines: usize,
    pub total_duration_secs: f64,
}

/// NarrateBook Handler
pub struct NarrateBookHandler {
    scheduler: SynthesisScheduler,
    silence_provider: SilenceProvider,
    assembler: TimelineAssembler,
    storage: Arc<dyn WorkStoragePort>,
    events: Arc<dyn EventSinkPort>,
    options: NarrateOptions,
}

impl NarrateBookHandler {
    pub fn new(
        speech_engine: Arc<dyn SpeechEnginePort>,
        audio_engine: Arc<dyn AudioEnginePort>,
        storage: Arc<dyn WorkStoragePort>,
        events: Arc<dyn EventSinkPort>,
        options: NarrateOptions,
    ) -> Self {
        let scheduler = SynthesisScheduler::new(
            options.concurrency,
            speech_engine,
            audio_engine.clone(),
            storage.clone(),
            events.clone(),
        );
        let silence_provider = SilenceProvider::new(audio_engine.clone(), storage.clone());
        let assembler =
            TimelineAssembler::new(audio_engine, storage.clone(), events.clone(), options.policy);

        Self {
            scheduler,
            silence_provider,
            assembler,
            storage,
            events,
            options,
        }
    }

    pub async fn handle(&self, command: NarrateBook) -> Result<NarrateResponse, NarrateError> {
        let NarrateBook { book, output_path } = command;
        book.validate()?;

        self.storage.prepare().await?;

        let total_lines = book.total_lines();
        let all_text: String = book
            .chapters()
            .iter()
            .flat_map(|c| c.lines().iter())
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        tracing::info!(
            title = %book.title(),
            author = %book.author(),
            chapters = book.chapters().len(),
            total_lines,
            estimated_minutes = estimate_reading_minutes(&all_text),
            work_dir = %self.storage.root().display(),
            "Book loaded"
        );
        self.events.publish(PipelineEvent::BookLoaded {
            title: book.title().to_string(),
            author: book.author().to_string(),
            chapters: book.chapters().len(),
            total_lines,
        });

        // 所有章节先分段；没有可朗读行的章节直接拒绝，避免合成到一半才失败
        let segments = segment_book(&book);
        for (chapter, units) in &segments {
            if units.is_empty() {
                return Err(NarrateError::EmptyChapter { chapter: *chapter });
            }
            self.events.publish(PipelineEvent::ChapterParsed {
                chapter: *chapter,
                lines: units.iter().map(|u| u.line_index).collect(),
            });
        }

        let total_units: usize = segments.iter().map(|(_, units)| units.len()).sum();
        self.events.publish(PipelineEvent::SpeechStarted {
            concurrency: self.scheduler.concurrency(),
            total_units,
        });

        let mut silence: Option<SilenceAssets> = None;
        let mut narrations = Vec::with_capacity(segments.len());
        let chapter_count = segments.len();

        for (position, (chapter, (number, units))) in
            book.chapters().iter().zip(segments.iter()).enumerate()
        {
            let lines = self.scheduler.synthesize_chapter(*number, units).await?;

            // 格式由全书第一个合成行决定，静音只生成一次
            if silence.is_none() {
                let format = self
                    .silence_provider
                    .negotiate_format(lines.first(), self.options.default_format)
                    .await;
                let assets = self
                    .silence_provider
                    .provision_pair(self.options.silence, format)
                    .await?;
                silence = Some(assets);
            }
            let silence_assets = silence
                .as_ref()
                .ok_or_else(|| NarrateError::internal("silence assets missing"))?;

            let is_last_chapter = position + 1 == chapter_count;
            let narration = self
                .assembler
                .merge_chapter(chapter, &lines, silence_assets, is_last_chapter)
                .await?;
            narrations.push(narration);
        }

        let format = silence
            .as_ref()
            .map(|s| s.format)
            .unwrap_or(self.options.default_format);

        let narration = BookNarration::new(book.clone(), narrations);
        let merged = self
            .assembler
            .merge_book(&narration.chapter_narrations, format)
            .await?;
        let markers = self
            .assembler
            .finalize(
                &book,
                &narration.chapter_narrations,
                &merged,
                &output_path,
                &self.options.final_output,
            )
            .await?;

        let total_duration_secs = narration.total_duration_secs();
        self.events.publish(PipelineEvent::ProcessingComplete {
            output_path: output_path.clone(),
            total_lines: total_units,
            total_chapters: chapter_count,
            total_duration_secs,
        });

        if self.options.keep_work_dir {
            tracing::info!(work_dir = %self.storage.root().display(), "Keeping work directory");
        } else if let Err(e) = self.storage.cleanup(&output_path).await {
            tracing::warn!(error = %e, "Failed to remove work directory");
        }

        Ok(NarrateResponse {
            output_path,
            narration,
            markers,
            total_lines: total_units,
            total_duration_secs,
        })
    }
}
