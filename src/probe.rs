use async_trait::async_trait;
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::error::{Result, FfminiError};
use crate::media::stderr_tail;

/// Format/stream metadata wrapper around the probing tool (ffprobe).
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaProber: Send + Sync {
    /// Full format and stream report for a file.
    async fn report(&self, input: &Path) -> Result<ProbeReport>;

    /// Container duration in seconds.
    async fn duration_seconds(&self, input: &Path) -> Result<f64>;
}

/// Deserialized `ffprobe -print_format json -show_format -show_streams`
/// output. ffprobe emits numbers as strings; they stay strings here and are
/// parsed where needed.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeReport {
    #[serde(default)]
    pub streams: Vec<ProbeStream>,
    pub format: ProbeFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeFormat {
    pub format_name: Option<String>,
    pub format_long_name: Option<String>,
    pub duration: Option<String>,
    pub size: Option<String>,
    pub bit_rate: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeStream {
    pub index: Option<u32>,
    pub codec_type: Option<String>,
    pub codec_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub sample_rate: Option<String>,
    pub channels: Option<u32>,
}

impl ProbeReport {
    pub fn duration_seconds(&self) -> Option<f64> {
        self.format.duration.as_deref().and_then(|d| d.parse().ok())
    }

    /// Human-readable summary for the Info operation.
    pub fn summary(&self) -> String {
        let mut out = String::new();

        let format = self
            .format
            .format_long_name
            .as_deref()
            .or(self.format.format_name.as_deref())
            .unwrap_or("unknown");
        let _ = writeln!(out, "Format:   {}", format);

        if let Some(duration) = self.duration_seconds() {
            let _ = writeln!(out, "Duration: {}", format_duration(duration));
        }
        if let Some(size) = self.format.size.as_deref().and_then(|s| s.parse::<u64>().ok()) {
            let _ = writeln!(out, "Size:     {:.2} MB", size as f64 / (1024.0 * 1024.0));
        }
        if let Some(bit_rate) = self.format.bit_rate.as_deref().and_then(|b| b.parse::<u64>().ok())
        {
            let _ = writeln!(out, "Bitrate:  {} kb/s", bit_rate / 1000);
        }

        for stream in &self.streams {
            let index = stream.index.unwrap_or_default();
            let codec = stream.codec_name.as_deref().unwrap_or("unknown");
            match stream.codec_type.as_deref() {
                Some("video") => {
                    let _ = writeln!(
                        out,
                        "Stream #{}: video ({}) {}x{}",
                        index,
                        codec,
                        stream.width.unwrap_or_default(),
                        stream.height.unwrap_or_default()
                    );
                }
                Some("audio") => {
                    let _ = writeln!(
                        out,
                        "Stream #{}: audio ({}) {} Hz, {} ch",
                        index,
                        codec,
                        stream.sample_rate.as_deref().unwrap_or("?"),
                        stream.channels.unwrap_or_default()
                    );
                }
                other => {
                    let _ = writeln!(
                        out,
                        "Stream #{}: {} ({})",
                        index,
                        other.unwrap_or("unknown"),
                        codec
                    );
                }
            }
        }

        out
    }
}

fn format_duration(seconds: f64) -> String {
    let total = seconds as u64;
    format!(
        "{:02}:{:02}:{:02}.{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60,
        ((seconds - total as f64) * 100.0) as u64
    )
}

/// ffprobe-backed prober.
pub struct FfprobeClient {
    binary_path: String,
}

impl FfprobeClient {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!("Executing: {} {:?}", self.binary_path, args);

        let output = tokio::process::Command::new(&self.binary_path)
            .args(args)
            .output()
            .await
            .map_err(|e| FfminiError::Probe(format!("Failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FfminiError::Probe(format!(
                "ffprobe failed: {}",
                stderr_tail(&stderr, 500)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl MediaProber for FfprobeClient {
    async fn report(&self, input: &Path) -> Result<ProbeReport> {
        let input = input.to_string_lossy();
        let stdout = self
            .run(&[
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                input.as_ref(),
            ])
            .await?;

        let report: ProbeReport = serde_json::from_str(&stdout)?;
        Ok(report)
    }

    async fn duration_seconds(&self, input: &Path) -> Result<f64> {
        let input = input.to_string_lossy();
        let stdout = self
            .run(&[
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
                input.as_ref(),
            ])
            .await?;

        stdout
            .trim()
            .parse()
            .map_err(|_| FfminiError::Probe(format!("Unparseable duration: '{}'", stdout.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "h264",
                "codec_type": "video",
                "width": 1920,
                "height": 1080
            },
            {
                "index": 1,
                "codec_name": "aac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2
            }
        ],
        "format": {
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "format_long_name": "QuickTime / MOV",
            "duration": "125.480000",
            "size": "10485760",
            "bit_rate": "668521"
        }
    }"#;

    #[test]
    fn test_parse_probe_json() {
        let report: ProbeReport = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(report.streams.len(), 2);
        assert_eq!(report.streams[0].codec_name.as_deref(), Some("h264"));
        assert_eq!(report.streams[1].channels, Some(2));
        assert!((report.duration_seconds().unwrap() - 125.48).abs() < 1e-9);
    }

    #[test]
    fn test_summary_lines() {
        let report: ProbeReport = serde_json::from_str(SAMPLE).unwrap();
        let summary = report.summary();
        assert!(summary.contains("QuickTime / MOV"));
        assert!(summary.contains("00:02:05.48"));
        assert!(summary.contains("video (h264) 1920x1080"));
        assert!(summary.contains("audio (aac) 48000 Hz, 2 ch"));
        assert!(summary.contains("10.00 MB"));
    }

    #[test]
    fn test_parse_tolerates_missing_fields() {
        let report: ProbeReport =
            serde_json::from_str(r#"{"format": {"format_name": "wav"}}"#).unwrap();
        assert!(report.streams.is_empty());
        assert!(report.duration_seconds().is_none());
        assert!(report.summary().contains("wav"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_probe_error() {
        let client = FfprobeClient::new("/nonexistent/ffprobe-bin");
        let err = client
            .duration_seconds(Path::new("in.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, FfminiError::Probe(_)));
    }
}
