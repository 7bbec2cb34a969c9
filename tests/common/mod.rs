//! 流水线测试用的记录型 fake 引擎

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use narrate::application::ports::{
    AudioEngineError, AudioEnginePort, AudioFormat, ConcatRequest, EventSinkPort, PipelineEvent,
    SpeechEnginePort, SpeechError, SynthesisRequest, TagRequest,
};
use narrate::application::{NarrateBook, NarrateBookHandler, NarrateError, NarrateOptions, NarrateResponse};
use narrate::domain::{Book, Chapter};
use narrate::infrastructure::FileWorkStorage;

/// 去掉 `.partial` 得到最终文件名
pub fn final_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().replace(".partial", ""))
        .unwrap_or_default()
}

/// `chapter_{c}_line_{i}.wav` 的固定时长：1.0 + 0.25 * i
pub fn line_duration(name: &str) -> Option<f64> {
    let rest = name.strip_prefix("chapter_")?.strip_suffix(".wav")?;
    let (_, line) = rest.split_once("_line_")?;
    let line: usize = line.parse().ok()?;
    Some(1.0 + 0.25 * line as f64)
}

// ============================================================================
// Speech engine
// ============================================================================

#[derive(Default)]
pub struct RecordingSpeechEngine {
    pub fail_on: Option<String>,
    pub delays_ms: HashMap<String, u64>,
    calls: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    texts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingSpeechEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, name: &str, ms: u64) -> Self {
        self.delays_ms.insert(name.to_string(), ms);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEnginePort for RecordingSpeechEngine {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<(), SpeechError> {
        let name = final_name(&request.output_path);
        self.calls.lock().unwrap().push(name.clone());
        self.texts.lock().unwrap().push(request.text.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(ms) = self.delays_ms.get(&name) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        } else {
            tokio::task::yield_now().await;
        }

        let result = if self.fail_on.as_deref() == Some(name.as_str()) {
            Err(SpeechError::Failed {
                exit_code: Some(1),
                stderr: "scripted failure".to_string(),
            })
        } else {
            std::fs::write(&request.output_path, format!("RIFF:{}", request.text))
                .map_err(|e| SpeechError::Io(e.to_string()))
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if result.is_ok() {
            self.completed.lock().unwrap().push(name);
        }
        result
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ============================================================================
// Audio engine
// ============================================================================

pub struct RecordingAudioEngine {
    /// None 表示流信息探测失败
    pub stream_format: Option<AudioFormat>,
    /// 合并结果的实测时长相对于各段之和的偏差
    pub merge_drift: f64,
    pub durations: Mutex<HashMap<String, f64>>,
    pub silences: Mutex<Vec<(String, f64, AudioFormat)>>,
    pub concats: Mutex<Vec<(String, Vec<String>, AudioFormat)>>,
    pub tags: Mutex<Vec<TagRequest>>,
}

impl Default for RecordingAudioEngine {
    fn default() -> Self {
        Self {
            stream_format: Some(AudioFormat::new(22050, 1)),
            merge_drift: 0.0,
            durations: Mutex::new(HashMap::new()),
            silences: Mutex::new(Vec::new()),
            concats: Mutex::new(Vec::new()),
            tags: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingAudioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn silences(&self) -> Vec<(String, f64, AudioFormat)> {
        self.silences.lock().unwrap().clone()
    }

    /// 某个拼接列表最近一次的条目
    pub fn entries(&self, list_name: &str) -> Vec<String> {
        self.concats
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _, _)| name == list_name)
            .map(|(_, entries, _)| entries.clone())
            .unwrap_or_default()
    }

    pub fn concat_count(&self) -> usize {
        self.concats.lock().unwrap().len()
    }

    pub fn concat_formats(&self) -> Vec<AudioFormat> {
        self.concats.lock().unwrap().iter().map(|(_, _, f)| *f).collect()
    }

    pub fn tags(&self) -> Vec<TagRequest> {
        self.tags.lock().unwrap().clone()
    }

    fn duration_of(&self, name: &str) -> Option<f64> {
        if let Some(d) = self.durations.lock().unwrap().get(name) {
            return Some(*d);
        }
        line_duration(name)
    }
}

#[async_trait]
impl AudioEnginePort for RecordingAudioEngine {
    async fn generate_silence(
        &self,
        duration_secs: f64,
        format: AudioFormat,
        output_path: &Path,
    ) -> Result<(), AudioEngineError> {
        let name = final_name(output_path);
        std::fs::write(output_path, format!("SILENCE:{}", duration_secs))
            .map_err(|e| AudioEngineError::Io(e.to_string()))?;
        self.durations
            .lock()
            .unwrap()
            .insert(name.clone(), duration_secs);
        self.silences
            .lock()
            .unwrap()
            .push((name, duration_secs, format));
        Ok(())
    }

    async fn concat(&self, request: &ConcatRequest) -> Result<(), AudioEngineError> {
        let list = std::fs::read_to_string(&request.list_path)
            .map_err(|e| AudioEngineError::Io(e.to_string()))?;
        let dir = request
            .list_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let entries: Vec<String> = list
            .lines()
            .filter_map(|line| line.strip_prefix("file '")?.strip_suffix('\'').map(str::to_string))
            .collect();

        let mut bytes = Vec::new();
        let mut total = 0.0;
        for entry in &entries {
            let content =
                std::fs::read(dir.join(entry)).map_err(|e| AudioEngineError::Io(e.to_string()))?;
            bytes.extend_from_slice(&content);
            total += self.duration_of(entry).unwrap_or(0.0);
        }
        std::fs::write(&request.output_path, bytes)
            .map_err(|e| AudioEngineError::Io(e.to_string()))?;

        self.durations
            .lock()
            .unwrap()
            .insert(final_name(&request.output_path), total + self.merge_drift);
        self.concats.lock().unwrap().push((
            final_name(&request.list_path),
            entries,
            request.format,
        ));
        Ok(())
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, AudioEngineError> {
        let name = final_name(path);
        self.duration_of(&name)
            .ok_or_else(|| AudioEngineError::MalformedOutput {
                path: path.to_path_buf(),
                output: "N/A".to_string(),
            })
    }

    async fn probe_stream_info(&self, path: &Path) -> Result<AudioFormat, AudioEngineError> {
        self.stream_format
            .ok_or_else(|| AudioEngineError::Failed {
                program: "ffprobe".to_string(),
                exit_code: Some(1),
                stderr: format!("cannot read {}", path.display()),
            })
    }

    async fn tag(&self, request: &TagRequest) -> Result<(), AudioEngineError> {
        std::fs::write(&request.output_path, b"M4A")
            .map_err(|e| AudioEngineError::Io(e.to_string()))?;
        self.tags.lock().unwrap().push(request.clone());
        Ok(())
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingEvents {
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSinkPort for RecordingEvents {
    fn publish(&self, event: PipelineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

// ============================================================================
// Harness
// ============================================================================

pub fn chapter(number: u32, title: Option<&str>, lines: &[&str]) -> Chapter {
    Chapter::new(
        number,
        title.map(str::to_string),
        lines.iter().map(|l| l.to_string()).collect(),
    )
}

pub fn book(chapters: Vec<Chapter>) -> Book {
    Book::new("Test Book", "Test Author", chapters).unwrap()
}

pub fn options(concurrency: usize) -> NarrateOptions {
    NarrateOptions {
        concurrency,
        keep_work_dir: true,
        ..NarrateOptions::default()
    }
}

pub struct Run {
    pub result: Result<NarrateResponse, NarrateError>,
    pub events: Vec<PipelineEvent>,
}

/// 工作目录为 `base/work`，成品为 `base/book.m4a`
pub async fn run(
    book: Book,
    base: &Path,
    speech: Arc<RecordingSpeechEngine>,
    audio: Arc<RecordingAudioEngine>,
    options: NarrateOptions,
) -> Run {
    run_with_paths(
        book,
        &base.join("work"),
        &base.join("book.m4a"),
        speech,
        audio,
        options,
    )
    .await
}

pub async fn run_with_paths(
    book: Book,
    work_dir: &Path,
    output_path: &Path,
    speech: Arc<RecordingSpeechEngine>,
    audio: Arc<RecordingAudioEngine>,
    options: NarrateOptions,
) -> Run {
    let events = Arc::new(RecordingEvents::default());
    let handler = NarrateBookHandler::new(
        speech,
        audio,
        Arc::new(FileWorkStorage::new(work_dir)),
        events.clone(),
        options,
    );

    let result = handler
        .handle(NarrateBook {
            book,
            output_path: output_path.to_path_buf(),
        })
        .await;

    Run {
        result,
        events: events.events(),
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
