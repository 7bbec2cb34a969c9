//! Progress Listener - 把流水线事件应用到进度状态机
//!
//! 独立任务运行；落后（Lagged）时跳过，通道关闭时返回最终的 tracker

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::application::ports::PipelineEvent;
use crate::domain::{ProgressState, ProgressTracker};

/// 每合成多少行输出一次进度日志
const LOG_EVERY_LINES: usize = 10;

/// 进度监听器
#[derive(Debug, Default)]
pub struct ProgressListener {
    tracker: ProgressTracker,
    synthesized: usize,
    total_units: usize,
}

impl ProgressListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// 启动监听任务
    pub fn spawn(receiver: broadcast::Receiver<PipelineEvent>) -> JoinHandle<ProgressTracker> {
        tokio::spawn(Self::new().run(receiver))
    }

    async fn run(mut self, mut receiver: broadcast::Receiver<PipelineEvent>) -> ProgressTracker {
        loop {
            match receiver.recv().await {
                Ok(event) => self.apply(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Progress listener lagged, events skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
        self.tracker
    }

    /// 应用单个事件
    pub fn apply(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::ChapterParsed { chapter, lines } => {
                for line in lines {
                    self.tracker.register(*chapter, *line);
                    self.tracker.advance(*chapter, *line, ProgressState::Parsed);
                }
            }
            PipelineEvent::SpeechStarted {
                concurrency,
                total_units,
            } => {
                self.total_units = *total_units;
                tracing::info!(concurrency, total_units, "Speech synthesis started");
            }
            PipelineEvent::LineSynthesized { chapter, line, .. } => {
                if self
                    .tracker
                    .advance(*chapter, *line, ProgressState::Synthesized)
                {
                    self.synthesized += 1;
                    if self.synthesized % LOG_EVERY_LINES == 0 || self.synthesized == self.total_units
                    {
                        tracing::info!(
                            synthesized = self.synthesized,
                            total = self.total_units,
                            "Synthesis progress"
                        );
                    }
                }
            }
            PipelineEvent::ChapterMerged {
                chapter,
                duration_secs,
                ..
            } => {
                self.tracker.mark_chapter_merged(*chapter);
                tracing::info!(chapter, duration_secs, "Chapter complete");
            }
            PipelineEvent::BookAssembled {
                total_duration_secs,
                ..
            } => {
                self.tracker.mark_book_merged();
                tracing::info!(total_duration_secs, "Book assembled");
            }
            _ => {}
        }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }
}
