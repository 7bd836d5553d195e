use async_trait::async_trait;
use std::path::Path;
use std::process::Command;
use tracing::{info, debug};

use crate::config::Config;
use crate::error::{Result, FfminiError};
use crate::split::SplitPlan;
use super::{MediaProcessor, FfmpegCommand, ProgressReporter};

/// FFmpeg-backed implementation of the canned operations.
pub struct FfmpegProcessor {
    config: Config,
}

impl FfmpegProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn command<S: Into<String>>(&self, description: S) -> FfmpegCommand {
        FfmpegCommand::new(&self.config.media.ffmpeg_path, description)
    }

    /// Run a command while feeding its progress stream into a spinner.
    async fn run_with_progress(&self, command: FfmpegCommand) -> Result<()> {
        let mut reporter = ProgressReporter::new(
            command.description.clone(),
            self.config.media.progress_interval_secs,
        );
        let result = command.execute_streaming(|event| reporter.observe(event)).await;
        reporter.finish();
        result
    }
}

#[async_trait]
impl MediaProcessor for FfmpegProcessor {
    async fn convert(&self, input: &Path, output: &Path) -> Result<()> {
        info!("Converting {} -> {}", input.display(), output.display());

        let command = self
            .command("Conversion")
            .input(input)
            .overwrite()
            .progress_pipe()
            .output(output);

        self.run_with_progress(command).await?;

        info!("Conversion completed");
        Ok(())
    }

    async fn extract_audio(&self, input: &Path, output: &Path) -> Result<()> {
        info!("Extracting audio {} -> {}", input.display(), output.display());

        let command = self
            .command("Audio extraction")
            .input(input)
            .no_video()
            .audio_codec(&self.config.extract.audio_codec)
            .audio_bitrate(&self.config.extract.audio_bitrate)
            .overwrite()
            .progress_pipe()
            .output(output);

        self.run_with_progress(command).await?;

        info!("Audio extraction completed");
        Ok(())
    }

    async fn compress(&self, input: &Path, output: &Path) -> Result<()> {
        info!("Compressing {} -> {}", input.display(), output.display());

        let command = self
            .command("Compression")
            .input(input)
            .video_codec(&self.config.compress.video_codec)
            .crf(self.config.compress.crf)
            .overwrite()
            .progress_pipe()
            .output(output);

        self.run_with_progress(command).await?;

        info!("Compression completed");
        Ok(())
    }

    async fn trim(&self, input: &Path, output: &Path, start: &str, duration: &str) -> Result<()> {
        info!(
            "Trimming {} ({} for {}) -> {}",
            input.display(),
            start,
            duration,
            output.display()
        );

        // Stream copy; seeking lands on the nearest keyframe.
        let command = self
            .command("Trim")
            .input(input)
            .seek(start)
            .duration(duration)
            .copy_streams()
            .overwrite()
            .output(output);

        command.execute().await?;

        info!("Trim completed");
        Ok(())
    }

    async fn split(&self, input: &Path, pattern: &Path, plan: &SplitPlan) -> Result<()> {
        info!("Splitting {} -> {}", input.display(), pattern.display());

        let command = self
            .command("Split")
            .input(input)
            .copy_streams()
            .map_all();

        let command = match plan {
            SplitPlan::Duration(spec) => command.segment_time(spec.clone()),
            SplitPlan::Size(bytes) => command.segment_size(*bytes),
        };

        let command = command
            .segment_format()
            .reset_timestamps()
            .progress_pipe()
            .output(pattern);

        self.run_with_progress(command).await?;

        info!("Split completed");
        Ok(())
    }

    async fn repair_copy(&self, input: &Path, output: &Path) -> Result<()> {
        info!("Repairing (stream copy) {} -> {}", input.display(), output.display());

        let command = self
            .command("Repair")
            .tolerate_errors()
            .input(input)
            .copy_streams()
            .map_all()
            .overwrite()
            .progress_pipe()
            .output(output);

        self.run_with_progress(command).await?;

        info!("Repair completed");
        Ok(())
    }

    async fn repair_reencode(&self, input: &Path, output: &Path) -> Result<()> {
        info!(
            "Repairing (re-encode fallback) {} -> {}",
            input.display(),
            output.display()
        );

        let command = self
            .command("Repair (re-encode)")
            .tolerate_errors()
            .input(input)
            .arg("-c:v")
            .arg("libx264")
            .arg("-c:a")
            .arg("aac")
            .crf(self.config.repair.fallback_crf)
            .preset(&self.config.repair.fallback_preset)
            .overwrite()
            .progress_pipe()
            .output(output);

        self.run_with_progress(command).await?;

        info!("Re-encode repair completed");
        Ok(())
    }

    fn check_availability(&self) -> Result<()> {
        let output = Command::new(&self.config.media.ffmpeg_path)
            .arg("-version")
            .output()
            .map_err(|e| FfminiError::Media(format!("FFmpeg not found: {}", e)))?;

        if output.status.success() {
            debug!("FFmpeg is available");
            Ok(())
        } else {
            Err(FfminiError::Media("FFmpeg version check failed".to_string()))
        }
    }

    async fn version_info(&self) -> Result<String> {
        let output = tokio::process::Command::new(&self.config.media.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| FfminiError::Media(format!("Failed to execute ffmpeg: {}", e)))?;

        if output.status.success() {
            let version_info = String::from_utf8_lossy(&output.stdout);
            let first_line = version_info.lines().next().unwrap_or("unknown version");
            Ok(first_line.to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(FfminiError::Media(format!(
                "FFmpeg version check failed: {}",
                stderr
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::SplitPlan;

    fn processor() -> FfmpegProcessor {
        FfmpegProcessor::new(Config::default())
    }

    #[test]
    fn test_convert_command_shape() {
        let p = processor();
        let cmd = p
            .command("Conversion")
            .input("in.mkv")
            .overwrite()
            .progress_pipe()
            .output("in_converted.mp4");
        assert_eq!(cmd.binary_path, "ffmpeg");
        assert_eq!(cmd.args.first().map(String::as_str), Some("-i"));
        assert_eq!(cmd.args.last().map(String::as_str), Some("in_converted.mp4"));
    }

    #[test]
    fn test_split_plan_flag_selection() {
        // Mirrors the arms in split(): duration plans use -segment_time,
        // size plans use -segment_size.
        let p = processor();
        let base = p.command("Split").input("in.mp4").copy_streams().map_all();

        let by_time = match &SplitPlan::Duration("30".to_string()) {
            SplitPlan::Duration(spec) => base.clone().segment_time(spec.clone()),
            SplitPlan::Size(bytes) => base.clone().segment_size(*bytes),
        };
        assert!(by_time.args.contains(&"-segment_time".to_string()));
        assert!(!by_time.args.contains(&"-segment_size".to_string()));

        let by_size = match &SplitPlan::Size(1024) {
            SplitPlan::Duration(spec) => base.clone().segment_time(spec.clone()),
            SplitPlan::Size(bytes) => base.clone().segment_size(*bytes),
        };
        assert!(by_size.args.contains(&"-segment_size".to_string()));
        assert!(by_size.args.contains(&"1024".to_string()));
    }

    #[tokio::test]
    async fn test_version_info_missing_binary() {
        let mut config = Config::default();
        config.media.ffmpeg_path = "/nonexistent/ffmpeg-bin".to_string();
        let p = FfmpegProcessor::new(config);
        assert!(p.version_info().await.is_err());
        assert!(p.check_availability().is_err());
    }
}
