//! Command Runner - 外部进程执行
//!
//! piper / ffmpeg / ffprobe 都通过这里启动：
//! - 可选 stdin 文本（写完即关闭）
//! - 捕获 stdout / stderr
//! - 超时后丢弃子进程句柄，由 kill_on_drop 结束进程

use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// 进程启动 / 等待失败（非零退出不算错误，由调用方判断）
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("{program} timed out after {after_secs}s")]
    Timeout { program: String, after_secs: u64 },

    #[error("IO error while running {program}: {message}")]
    Io { program: String, message: String },
}

/// 进程输出
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// 执行外部命令
///
/// `timeout` 为 None 时不限时
pub async fn run_command(
    program: &str,
    args: &[String],
    stdin: Option<&str>,
    timeout: Option<Duration>,
) -> Result<CommandOutput, CommandError> {
    let started = Instant::now();
    tracing::debug!(program, args = ?args, "Command started");

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CommandError::Spawn {
            program: program.to_string(),
            message: e.to_string(),
        })?;

    // 单独的任务写 stdin，避免和 stdout 读取互相阻塞
    if let (Some(input), Some(mut handle)) = (stdin, child.stdin.take()) {
        let input = input.to_owned();
        let name = program.to_string();
        tokio::spawn(async move {
            if let Err(e) = handle.write_all(input.as_bytes()).await {
                tracing::debug!(program = %name, error = %e, "Failed to write stdin");
            }
        });
    }

    let wait = child.wait_with_output();
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(program, after_secs = limit.as_secs(), "Command timed out");
                return Err(CommandError::Timeout {
                    program: program.to_string(),
                    after_secs: limit.as_secs(),
                });
            }
        },
        None => wait.await,
    };

    let output = result.map_err(|e| CommandError::Io {
        program: program.to_string(),
        message: e.to_string(),
    })?;

    let elapsed = started.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    tracing::debug!(
        program,
        success = output.status.success(),
        exit_code = ?output.status.code(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Command finished"
    );

    Ok(CommandOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout,
        stderr,
        elapsed,
    })
}

/// 秒数转为可选超时，0 表示不限时
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_stdin_is_forwarded() {
        let output = run_command("cat", &[], Some("hello piper"), None)
            .await
            .unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, "hello piper");
    }

    #[tokio::test]
    async fn test_non_zero_exit_captures_stderr() {
        let output = run_command("sh", &args(&["-c", "echo oops >&2; exit 3"]), None, None)
            .await
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.stderr, "oops");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = run_command("narrate-no-such-binary", &[], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = run_command(
            "sleep",
            &args(&["5"]),
            None,
            Some(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs(0), None);
        assert_eq!(timeout_from_secs(3), Some(Duration::from_secs(3)));
    }
}
