//! FFmpeg Audio Engine - ffmpeg / ffprobe 适配器
//!
//! 实现 AudioEnginePort：静音生成、concat 拼接、时长与流信息探测、元数据与章节写入。
//! 参数构建与输出解析是纯函数，单独测试

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{
    AudioEngineError, AudioEnginePort, AudioFormat, ConcatRequest, OutputCodec, TagRequest,
};
use crate::infrastructure::adapters::command::{
    run_command, timeout_from_secs, CommandError, CommandOutput,
};

/// ffmpeg 适配器配置
#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    /// 单次调用超时（秒），0 表示不限时
    pub timeout_secs: u64,
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            timeout_secs: 600,
        }
    }
}

/// ffmpeg / ffprobe 音频引擎
pub struct FfmpegEngine {
    config: FfmpegConfig,
    timeout: Option<Duration>,
}

impl FfmpegEngine {
    pub fn new(config: FfmpegConfig) -> Self {
        let timeout = timeout_from_secs(config.timeout_secs);
        Self { config, timeout }
    }

    async fn run(&self, program: &str, args: Vec<String>) -> Result<CommandOutput, AudioEngineError> {
        let output = run_command(program, &args, None, self.timeout)
            .await
            .map_err(|e| match e {
                CommandError::Spawn { program, message } => {
                    AudioEngineError::Spawn { program, message }
                }
                CommandError::Timeout {
                    program,
                    after_secs,
                } => AudioEngineError::Timeout {
                    program,
                    after_secs,
                },
                CommandError::Io { message, .. } => AudioEngineError::Io(message),
            })?;

        if !output.success {
            return Err(AudioEngineError::Failed {
                program: program.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    async fn ffmpeg(&self, args: Vec<String>) -> Result<CommandOutput, AudioEngineError> {
        self.run(&self.config.ffmpeg_bin, args).await
    }

    async fn ffprobe(&self, args: Vec<String>) -> Result<CommandOutput, AudioEngineError> {
        self.run(&self.config.ffprobe_bin, args).await
    }
}

#[async_trait]
impl AudioEnginePort for FfmpegEngine {
    async fn generate_silence(
        &self,
        duration_secs: f64,
        format: AudioFormat,
        output_path: &Path,
    ) -> Result<(), AudioEngineError> {
        self.ffmpeg(silence_args(duration_secs, format, output_path))
            .await?;
        Ok(())
    }

    async fn concat(&self, request: &ConcatRequest) -> Result<(), AudioEngineError> {
        tracing::debug!(
            list = %request.list_path.display(),
            output = %request.output_path.display(),
            codec = request.codec.ffmpeg_name(),
            "Concatenating audio"
        );
        self.ffmpeg(concat_args(request)).await?;
        Ok(())
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, AudioEngineError> {
        let output = self.ffprobe(duration_args(path)).await?;
        parse_duration(&output.stdout, path)
    }

    async fn probe_stream_info(&self, path: &Path) -> Result<AudioFormat, AudioEngineError> {
        let output = self.ffprobe(stream_info_args(path)).await?;
        parse_stream_info(&output.stdout, path)
    }

    async fn tag(&self, request: &TagRequest) -> Result<(), AudioEngineError> {
        self.ffmpeg(tag_args(request)).await?;
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// 公共前缀：只输出错误
fn ffmpeg_prefix() -> Vec<String> {
    strings(&["-hide_banner", "-loglevel", "error"])
}

fn codec_args(codec: &OutputCodec) -> Vec<String> {
    let mut args = vec!["-c:a".to_string(), codec.ffmpeg_name().to_string()];
    if let OutputCodec::Aac { bitrate } = codec {
        args.push("-b:a".to_string());
        args.push(bitrate.clone());
    }
    args
}

/// anullsrc 静音
pub fn silence_args(duration_secs: f64, format: AudioFormat, output_path: &Path) -> Vec<String> {
    let mut args = ffmpeg_prefix();
    args.extend([
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        format!(
            "anullsrc=r={}:cl={}",
            format.sample_rate,
            format.channel_layout()
        ),
        "-t".to_string(),
        duration_secs.to_string(),
        "-ar".to_string(),
        format.sample_rate.to_string(),
        "-ac".to_string(),
        format.channels.to_string(),
    ]);
    args.extend(codec_args(&OutputCodec::Pcm16));
    args.push("-y".to_string());
    args.push(path_arg(output_path));
    args
}

/// concat demuxer，统一重采样到运行格式
pub fn concat_args(request: &ConcatRequest) -> Vec<String> {
    let mut args = ffmpeg_prefix();
    args.extend([
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        path_arg(&request.list_path),
        "-ar".to_string(),
        request.format.sample_rate.to_string(),
        "-ac".to_string(),
        request.format.channels.to_string(),
    ]);
    args.extend(codec_args(&request.codec));
    args.push("-y".to_string());
    args.push(path_arg(&request.output_path));
    args
}

/// 写入元数据与 FFMETADATA 章节
pub fn tag_args(request: &TagRequest) -> Vec<String> {
    let mut args = ffmpeg_prefix();
    args.extend([
        "-i".to_string(),
        path_arg(&request.input_path),
        "-i".to_string(),
        path_arg(&request.chapters_path),
        "-map".to_string(),
        "0".to_string(),
        "-map_chapters".to_string(),
        "1".to_string(),
    ]);
    args.extend(codec_args(&request.codec));

    let metadata = &request.metadata;
    for (key, value) in [
        ("title", &metadata.title),
        ("artist", &metadata.artist),
        ("album", &metadata.album),
        ("comment", &metadata.comment),
    ] {
        args.push("-metadata".to_string());
        args.push(format!("{}={}", key, value));
    }

    args.push("-y".to_string());
    args.push(path_arg(&request.output_path));
    args
}

pub fn duration_args(path: &Path) -> Vec<String> {
    let mut args = strings(&["-v", "quiet", "-show_entries", "format=duration", "-of", "csv=p=0"]);
    args.push(path_arg(path));
    args
}

pub fn stream_info_args(path: &Path) -> Vec<String> {
    let mut args = strings(&[
        "-v",
        "error",
        "-select_streams",
        "a:0",
        "-show_entries",
        "stream=sample_rate,channels",
        "-of",
        "csv=p=0",
    ]);
    args.push(path_arg(path));
    args
}

/// 解析 `format=duration` 输出；非数字即错误
pub fn parse_duration(stdout: &str, path: &Path) -> Result<f64, AudioEngineError> {
    let trimmed = stdout.trim();
    match trimmed.parse::<f64>() {
        Ok(duration) if duration.is_finite() && duration >= 0.0 => Ok(duration),
        _ => Err(AudioEngineError::MalformedOutput {
            path: path.to_path_buf(),
            output: trimmed.to_string(),
        }),
    }
}

/// 解析 `stream=sample_rate,channels` 输出，形如 `22050,1`
pub fn parse_stream_info(stdout: &str, path: &Path) -> Result<AudioFormat, AudioEngineError> {
    let malformed = || AudioEngineError::MalformedOutput {
        path: path.to_path_buf(),
        output: stdout.trim().to_string(),
    };

    let line = stdout.lines().next().ok_or_else(malformed)?;
    let mut parts = line.trim().split(',');
    let sample_rate = parts
        .next()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .ok_or_else(malformed)?;
    let channels = parts
        .next()
        .and_then(|v| v.trim().parse::<u16>().ok())
        .ok_or_else(malformed)?;

    Ok(AudioFormat::new(sample_rate, channels))
}
