//! Synthesis Scheduler - 有界并发的逐行合成
//!
//! - 整次运行共享一个 semaphore，全局并发上限为 C
//! - 按 line_index 顺序提交，完成顺序不限
//! - 结果写入按位置索引的槽位，读取时按 line_index 排序
//! - 目标文件已存在且非空时跳过合成（断点续跑）

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::application::error::{NarrateError, UnitFailure};
use crate::application::ports::{
    AudioEnginePort, EventSinkPort, PipelineEvent, SpeechEnginePort, SpeechError,
    SynthesisRequest, WorkStoragePort,
};
use crate::domain::{normalize_for_speech, AssetKind, AudioAsset, TextUnit};

/// 单元处理所需的依赖（可跨任务克隆）
#[derive(Clone)]
struct UnitWorker {
    speech_engine: Arc<dyn SpeechEnginePort>,
    audio_engine: Arc<dyn AudioEnginePort>,
    storage: Arc<dyn WorkStoragePort>,
    events: Arc<dyn EventSinkPort>,
}

impl UnitWorker {
    /// 处理单个文本单元
    async fn process(&self, unit: &TextUnit) -> Result<AudioAsset, UnitFailure> {
        let chapter = unit.chapter_number;
        let line = unit.line_index;
        let final_path = self.storage.line_path(chapter, line);

        // 断点：已有完整文件则直接复用，只重新测量时长
        if self.storage.is_complete(&final_path).await {
            let duration_secs = self.audio_engine.probe_duration(&final_path).await?;
            tracing::debug!(chapter, line, "Reusing existing line audio");
            self.events.publish(PipelineEvent::LineSynthesized {
                chapter,
                line,
                audio_file: final_path.clone(),
                duration_secs,
                resumed: true,
            });
            return Ok(AudioAsset::new(final_path, duration_secs, AssetKind::Synthesized));
        }

        self.events
            .publish(PipelineEvent::LineSynthesisStarted { chapter, line });

        let partial_path = self.storage.partial_path(&final_path);
        let request = SynthesisRequest {
            text: normalize_for_speech(&unit.text),
            output_path: partial_path.clone(),
        };

        tracing::debug!(
            chapter,
            line,
            engine = self.speech_engine.name(),
            text_len = request.text.len(),
            "Synthesizing line"
        );

        self.speech_engine.synthesize(request).await?;

        if !self.storage.is_complete(&partial_path).await {
            return Err(SpeechError::EmptyOutput(partial_path).into());
        }
        self.storage.publish(&partial_path, &final_path).await?;

        let duration_secs = self.audio_engine.probe_duration(&final_path).await?;

        self.events.publish(PipelineEvent::LineSynthesized {
            chapter,
            line,
            audio_file: final_path.clone(),
            duration_secs,
            resumed: false,
        });

        Ok(AudioAsset::new(final_path, duration_secs, AssetKind::Synthesized))
    }
}

/// 合成调度器
pub struct SynthesisScheduler {
    worker: UnitWorker,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
}

impl SynthesisScheduler {
    pub fn new(
        concurrency: usize,
        speech_engine: Arc<dyn SpeechEnginePort>,
        audio_engine: Arc<dyn AudioEnginePort>,
        storage: Arc<dyn WorkStoragePort>,
        events: Arc<dyn EventSinkPort>,
    ) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            worker: UnitWorker {
                speech_engine,
                audio_engine,
                storage,
                events,
            },
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 合成一个章节的全部单元，返回按 line_index 排序的音频资产
    ///
    /// 任一单元失败后不再提交新单元；已提交的单元会跑完，随后返回
    /// line_index 最小的失败
    pub async fn synthesize_chapter(
        &self,
        chapter: u32,
        units: &[TextUnit],
    ) -> Result<Vec<AudioAsset>, NarrateError> {
        let mut ordered: Vec<TextUnit> = units.to_vec();
        ordered.sort_by_key(|u| u.line_index);

        let mut slots: Vec<Option<AudioAsset>> = vec![None; ordered.len()];
        let mut failures: Vec<(usize, UnitFailure)> = Vec::new();
        let failed = Arc::new(AtomicBool::new(false));
        let mut join_set = JoinSet::new();

        tracing::info!(
            chapter,
            units = ordered.len(),
            concurrency = self.concurrency,
            "Scheduling chapter synthesis"
        );

        for (slot, unit) in ordered.iter().enumerate() {
            if failed.load(Ordering::SeqCst) {
                break;
            }

            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| NarrateError::internal("synthesis pool closed"))?;

            // 等待 permit 期间可能已有单元失败
            if failed.load(Ordering::SeqCst) {
                break;
            }

            let worker = self.worker.clone();
            let unit = unit.clone();
            let failed = failed.clone();

            join_set.spawn(async move {
                let _permit = permit; // 持有 permit 直到单元完成
                let result = worker.process(&unit).await;
                if result.is_err() {
                    failed.store(true, Ordering::SeqCst);
                }
                (slot, result)
            });
        }

        // 等待所有已提交的单元结束，不强杀在途子进程
        let mut aborted: Option<String> = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((slot, Ok(asset))) => slots[slot] = Some(asset),
                Ok((slot, Err(e))) => failures.push((slot, e)),
                Err(e) => {
                    tracing::error!(chapter, error = %e, "Synthesis task aborted");
                    aborted = Some(e.to_string());
                }
            }
        }

        if let Some((slot, source)) = failures.into_iter().min_by_key(|(slot, _)| *slot) {
            let line = ordered[slot].line_index;
            tracing::error!(chapter, line, error = %source, "Line synthesis failed");
            return Err(NarrateError::SynthesisFailed {
                chapter,
                line,
                source,
            });
        }

        let mut assets = Vec::with_capacity(slots.len());
        for (asset, unit) in slots.into_iter().zip(ordered.iter()) {
            match asset {
                Some(asset) => assets.push(asset),
                None => {
                    return Err(NarrateError::SynthesisFailed {
                        chapter,
                        line: unit.line_index,
                        source: UnitFailure::Aborted(
                            aborted.clone().unwrap_or_else(|| "no result".to_string()),
                        ),
                    });
                }
            }
        }

        Ok(assets)
    }
}
