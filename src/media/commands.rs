use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::debug;

use crate::error::{Result, FfminiError};
use super::progress::{ProgressEvent, ProgressParser};

/// How much of the tool's stderr is surfaced on failure.
const STDERR_TAIL_CHARS: usize = 500;

/// An ffmpeg invocation: binary, argument vector, and a human label used in
/// log lines and error messages.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl FfmpegCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file (always the last argument)
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-vcodec").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-acodec").arg(codec)
    }

    /// Copy all streams without re-encoding
    pub fn copy_streams(self) -> Self {
        self.arg("-c").arg("copy")
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio bitrate (e.g. "192k")
    pub fn audio_bitrate<S: Into<String>>(self, bitrate: S) -> Self {
        self.arg("-ab").arg(bitrate)
    }

    /// Set constant rate factor
    pub fn crf(self, crf: u32) -> Self {
        self.arg("-crf").arg(crf.to_string())
    }

    /// Set encoder preset
    pub fn preset<S: Into<String>>(self, preset: S) -> Self {
        self.arg("-preset").arg(preset)
    }

    /// Seek to start position before decoding
    pub fn seek<S: Into<String>>(self, start: S) -> Self {
        self.arg("-ss").arg(start)
    }

    /// Limit output duration
    pub fn duration<S: Into<String>>(self, duration: S) -> Self {
        self.arg("-t").arg(duration)
    }

    /// Map all input streams into the output
    pub fn map_all(self) -> Self {
        self.arg("-map").arg("0")
    }

    /// Use ffmpeg's built-in segment muxer
    pub fn segment_format(self) -> Self {
        self.arg("-f").arg("segment")
    }

    /// Segment boundary by media time
    pub fn segment_time<S: Into<String>>(self, time: S) -> Self {
        self.arg("-segment_time").arg(time)
    }

    /// Segment boundary by approximate byte size
    pub fn segment_size(self, bytes: u64) -> Self {
        self.arg("-segment_size").arg(bytes.to_string())
    }

    /// Restart timestamps at zero in every segment
    pub fn reset_timestamps(self) -> Self {
        self.arg("-reset_timestamps").arg("1")
    }

    /// Keep going over damaged input (used by the repair operation)
    pub fn tolerate_errors(self) -> Self {
        self.arg("-fflags")
            .arg("+genpts")
            .arg("-err_detect")
            .arg("ignore_err")
    }

    /// Write machine-readable progress to stdout
    pub fn progress_pipe(self) -> Self {
        self.arg("-progress").arg("pipe:1")
    }

    /// Run to completion, capturing output. Non-zero exit surfaces the tail
    /// of stderr.
    pub async fn execute(&self) -> Result<()> {
        debug!("Executing: {} {:?}", self.binary_path, self.args);

        let output = tokio::process::Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| {
                FfminiError::Media(format!("Failed to execute {}: {}", self.binary_path, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FfminiError::Media(format!(
                "{} failed: {}",
                self.description,
                stderr_tail(&stderr, STDERR_TAIL_CHARS)
            )));
        }

        Ok(())
    }

    /// Run with stdout piped, parsing `-progress` lines as they arrive and
    /// handing each event to the callback. Stderr is drained concurrently so
    /// a chatty child cannot block on a full pipe.
    pub async fn execute_streaming<F>(&self, mut on_progress: F) -> Result<()>
    where
        F: FnMut(ProgressEvent),
    {
        debug!("Executing (streaming): {} {:?}", self.binary_path, self.args);

        let mut child = tokio::process::Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                FfminiError::Media(format!("Failed to spawn {}: {}", self.binary_path, e))
            })?;

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let mut reader = BufReader::new(stderr);
                let _ = reader.read_to_string(&mut buf).await;
                buf
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let parser = ProgressParser::new();
            let mut lines = BufReader::new(stdout).lines();
            while let Some(line) = lines.next_line().await? {
                if let Some(event) = parser.parse(&line) {
                    on_progress(event);
                }
            }
        }

        let status = child.wait().await?;

        let stderr = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(FfminiError::Media(format!(
                "{} failed (exit code {}): {}",
                self.description,
                status.code().map_or_else(|| "?".to_string(), |c| c.to_string()),
                stderr_tail(&stderr, STDERR_TAIL_CHARS)
            )));
        }

        Ok(())
    }
}

/// Last `max_chars` characters of the tool's stderr, char-boundary safe.
pub fn stderr_tail(stderr: &str, max_chars: usize) -> String {
    let count = stderr.chars().count();
    if count <= max_chars {
        return stderr.trim().to_string();
    }
    let skipped: String = stderr.chars().skip(count - max_chars).collect();
    format!("...{}", skipped.trim())
}
