// Media processing layer
//
// Everything here is glue around the external ffmpeg binary:
// - commands: argument-vector builder and child process execution
// - processor: one method per canned operation
// - progress: parsing and display of the -progress pipe

pub mod commands;
pub mod processor;
pub mod progress;

use async_trait::async_trait;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

pub use commands::{FfmpegCommand, stderr_tail};
pub use processor::FfmpegProcessor;
pub use progress::{ProgressEvent, ProgressParser, ProgressReporter};

use crate::config::Config;
use crate::error::Result;
use crate::split::SplitPlan;

/// The canned operations the front end exposes. Implementations shell out to
/// the external media tool; nothing here decodes or encodes in-process.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaProcessor: Send + Sync {
    /// Convert to another container format (chosen by output extension).
    async fn convert(&self, input: &Path, output: &Path) -> Result<()>;

    /// Extract the audio track to MP3.
    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()>;

    /// Re-encode the video stream at a smaller size.
    async fn compress(&self, input: &Path, output: &Path) -> Result<()>;

    /// Stream-copy a section starting at `start` lasting `duration`.
    async fn trim(&self, input: &Path, output: &Path, start: &str, duration: &str) -> Result<()>;

    /// Segment the input per `plan`; `pattern` is the ffmpeg output pattern
    /// (e.g. `clip_part%03d.mp4`) inside the split directory.
    async fn split(&self, input: &Path, pattern: &Path, plan: &SplitPlan) -> Result<()>;

    /// Stream-copy repair over damaged input.
    async fn repair_copy(&self, input: &Path, output: &Path) -> Result<()>;

    /// Re-encoding repair fallback for input the copy path cannot salvage.
    async fn repair_reencode(&self, input: &Path, output: &Path) -> Result<()>;

    /// Check that the external tool is on PATH and runs.
    fn check_availability(&self) -> Result<()>;

    /// First line of `ffmpeg -version`.
    async fn version_info(&self) -> Result<String>;
}

/// Factory for the default (ffmpeg-based) processor.
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    pub fn create_processor(config: Config) -> Box<dyn MediaProcessor> {
        Box::new(FfmpegProcessor::new(config))
    }
}
