//! Narrate - 有声书生成
//!
//! 读取书籍 JSON，逐行合成语音，合并为带章节标记的 m4a

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use narrate::application::{NarrateBook, NarrateBookHandler};
use narrate::config::{load_config_with_overrides, print_config, AppConfig};
use narrate::domain::Book;
use narrate::infrastructure::{
    build_speech_engine, EventPublisher, FfmpegEngine, FileWorkStorage, ProgressListener,
};

/// Turn a structured book into a chaptered audiobook
#[derive(Parser, Debug)]
#[command(name = "narrate", version, about = "Turn a structured book into a chaptered audiobook")]
struct Cli {
    /// Book JSON file ({title, author, chapters: [{number, title, lines}]})
    #[arg(value_name = "BOOK")]
    input: PathBuf,

    /// Output audiobook path (default: <BOOK>.m4a)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum concurrent synthesis processes
    #[arg(short = 'c', long, value_name = "N")]
    concurrency: Option<usize>,

    /// Piper voice model (.onnx)
    #[arg(long, value_name = "MODEL")]
    voice: Option<String>,

    /// Use the fake speech engine (writes silence, no piper needed)
    #[arg(long)]
    fake: bool,

    /// Working directory for intermediate files (reused on rerun)
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Keep the working directory after a successful run
    #[arg(long)]
    keep_work_dir: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// 命令行参数转为配置覆盖项
    fn overrides(&self) -> Vec<(String, String)> {
        let mut overrides = Vec::new();
        if let Some(concurrency) = self.concurrency {
            overrides.push(("pipeline.concurrency".to_string(), concurrency.to_string()));
        }
        if self.fake {
            overrides.push(("tts.engine.kind".to_string(), "fake".to_string()));
        } else if let Some(voice) = &self.voice {
            overrides.push(("tts.engine.kind".to_string(), "piper".to_string()));
            overrides.push(("tts.engine.voice".to_string(), voice.clone()));
        }
        if let Some(work_dir) = &self.work_dir {
            overrides.push((
                "pipeline.work_dir".to_string(),
                work_dir.display().to_string(),
            ));
        }
        if self.keep_work_dir {
            overrides.push(("pipeline.keep_work_dir".to_string(), "true".to_string()));
        }
        match self.verbose {
            0 => {}
            1 => overrides.push(("log.level".to_string(), "debug".to_string())),
            _ => overrides.push(("log.level".to_string(), "trace".to_string())),
        }
        overrides
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("m4a"))
    }
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},narrate={}", config.log.level, config.log.level);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 加载配置（优先级：命令行 > 环境变量 > 配置文件 > 默认值）
    let config = load_config_with_overrides(cli.config.as_deref(), &cli.overrides())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    print_config(&config);

    let json = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("Failed to read book file {}", cli.input.display()))?;
    let book = Book::from_json(&json)?;

    let output_path = cli.output_path();
    let storage = match &config.pipeline.work_dir {
        Some(dir) => FileWorkStorage::new(dir),
        None => FileWorkStorage::for_book(std::env::temp_dir(), book.title(), book.author()),
    };

    let speech_engine = build_speech_engine(&config.tts.engine, config.tts.timeout_secs);
    if !speech_engine.health_check().await {
        tracing::warn!(engine = speech_engine.name(), "Speech engine health check failed");
    }

    let publisher = EventPublisher::new().arc();
    let listener = ProgressListener::spawn(publisher.subscribe());

    let handler = NarrateBookHandler::new(
        speech_engine,
        Arc::new(FfmpegEngine::new(config.ffmpeg_config())),
        Arc::new(storage),
        publisher.clone(),
        config.narrate_options(),
    );

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = tracing::info_span!("run", run_id = %run_id);

    let result = handler
        .handle(NarrateBook {
            book,
            output_path,
        })
        .instrument(span)
        .await;

    // 关闭事件通道，等待监听器收尾
    drop(handler);
    drop(publisher);
    let tracker = listener.await.ok();

    let elapsed = Utc::now() - started_at;
    match result {
        Ok(response) => {
            if let Some(stats) = tracker.map(|t| t.stats()) {
                tracing::info!(
                    total = stats.total,
                    synthesized = stats.synthesized,
                    complete = stats.complete,
                    chapters = stats.chapters,
                    "Progress summary"
                );
            }
            for marker in &response.markers {
                tracing::info!(
                    title = %marker.title,
                    start_secs = marker.start_secs,
                    end_secs = marker.end_secs,
                    "Chapter"
                );
            }
            tracing::info!(
                run_id = %run_id,
                output = %response.output_path.display(),
                lines = response.total_lines,
                duration_secs = response.total_duration_secs,
                elapsed_secs = elapsed.num_seconds(),
                "Audiobook complete"
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                run_id = %run_id,
                chapter = ?e.chapter(),
                error = %e,
                elapsed_secs = elapsed.num_seconds(),
                "Narration failed; work directory kept for resume"
            );
            Err(e.into())
        }
    }
}
