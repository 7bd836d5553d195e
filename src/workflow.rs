use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, FfminiError};
use crate::media::{MediaProcessor, MediaProcessorFactory};
use crate::probe::{MediaProber, FfprobeClient, ProbeReport};
use crate::session::Session;
use crate::split::{self, PartFile, SplitMode};

/// Outcome of a single-output operation.
#[derive(Debug, Clone)]
pub struct OpReport {
    pub output: PathBuf,
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub elapsed: Duration,
}

impl OpReport {
    pub fn output_mb(&self) -> f64 {
        self.output_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Output size as a percentage of the input size.
    pub fn size_ratio_percent(&self) -> Option<f64> {
        if self.input_bytes == 0 {
            return None;
        }
        Some(self.output_bytes as f64 / self.input_bytes as f64 * 100.0)
    }

    /// How much smaller the output is, as a percentage of the input.
    pub fn reduction_percent(&self) -> Option<f64> {
        self.size_ratio_percent().map(|r| 100.0 - r)
    }
}

/// Outcome of the split operation.
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub dir: PathBuf,
    pub parts: Vec<PartFile>,
    pub elapsed: Duration,
}

impl SplitReport {
    pub fn total_bytes(&self) -> u64 {
        self.parts.iter().map(|p| p.size_bytes).sum()
    }

    pub fn total_mb(&self) -> f64 {
        self.total_bytes() as f64 / (1024.0 * 1024.0)
    }
}

/// Outcome of the repair operation; records whether the re-encoding fallback
/// had to run.
#[derive(Debug, Clone)]
pub struct RepairReport {
    pub op: OpReport,
    pub reencoded: bool,
}

/// Ties config, processor, and prober together: computes output paths, runs
/// one operation at a time, and verifies that the promised output exists.
pub struct Workflow {
    processor: Box<dyn MediaProcessor>,
    prober: Box<dyn MediaProber>,
}

impl Workflow {
    pub fn new(config: Config) -> Result<Self> {
        let prober = Box::new(FfprobeClient::new(&config.media.ffprobe_path));
        let processor = MediaProcessorFactory::create_processor(config);

        // Fail early when the external tool is missing from PATH.
        processor.check_availability()?;

        Ok(Self { processor, prober })
    }

    pub fn with_components(
        processor: Box<dyn MediaProcessor>,
        prober: Box<dyn MediaProber>,
    ) -> Self {
        Self { processor, prober }
    }

    pub async fn version_info(&self) -> Result<String> {
        self.processor.version_info().await
    }

    /// Format and stream metadata for the loaded file.
    pub async fn info(&self, session: &Session) -> Result<ProbeReport> {
        self.prober.report(session.path()).await
    }

    pub async fn convert(&self, session: &Session, format: &str) -> Result<OpReport> {
        let format = format.trim().trim_start_matches('.').to_lowercase();
        if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FfminiError::InvalidInput(format!(
                "Invalid target format '{}'",
                format
            )));
        }

        let output = session.convert_output(&format);
        let started = Instant::now();
        self.processor.convert(session.path(), &output).await?;
        self.finish(session, output, started)
    }

    pub async fn extract_audio(&self, session: &Session) -> Result<OpReport> {
        let output = session.extract_output();
        let started = Instant::now();
        self.processor.extract_audio(session.path(), &output).await?;
        self.finish(session, output, started)
    }

    pub async fn compress(&self, session: &Session) -> Result<OpReport> {
        let output = session.compress_output();
        let started = Instant::now();
        self.processor.compress(session.path(), &output).await?;
        self.finish(session, output, started)
    }

    pub async fn trim(&self, session: &Session, start: &str, duration: &str) -> Result<OpReport> {
        split::validate_time_spec(start)?;
        split::validate_time_spec(duration)?;

        let output = session.trim_output();
        let started = Instant::now();
        self.processor
            .trim(session.path(), &output, start.trim(), duration.trim())
            .await?;
        self.finish(session, output, started)
    }

    pub async fn split(&self, session: &Session, mode: SplitMode) -> Result<SplitReport> {
        let total_duration = match mode {
            SplitMode::ByParts(_) => {
                Some(self.prober.duration_seconds(session.path()).await?)
            }
            _ => None,
        };
        let plan = mode.plan(total_duration)?;

        let dir = session.split_dir();
        std::fs::create_dir_all(&dir)?;

        let started = Instant::now();
        self.processor
            .split(session.path(), &session.split_pattern(), &plan)
            .await?;

        let parts = split::list_parts(&dir, &session.split_part_prefix())?;
        if parts.is_empty() {
            return Err(FfminiError::Media(
                "Split reported success but no segments were created".to_string(),
            ));
        }

        info!("Split produced {} parts in {}", parts.len(), dir.display());

        Ok(SplitReport {
            dir,
            parts,
            elapsed: started.elapsed(),
        })
    }

    /// Stream-copy repair first; fall back to re-encoding when the copy path
    /// cannot salvage the input.
    pub async fn repair(&self, session: &Session) -> Result<RepairReport> {
        let output = session.repair_output();
        let started = Instant::now();

        match self.processor.repair_copy(session.path(), &output).await {
            Ok(()) => {
                let op = self.finish(session, output, started)?;
                Ok(RepairReport { op, reencoded: false })
            }
            Err(e) => {
                warn!("Stream-copy repair failed ({}), trying re-encode fallback", e);
                self.processor.repair_reencode(session.path(), &output).await?;
                let op = self.finish(session, output, started)?;
                Ok(RepairReport { op, reencoded: true })
            }
        }
    }

    /// The tool exited zero; make sure the promised output actually exists
    /// before reporting success.
    fn finish(&self, session: &Session, output: PathBuf, started: Instant) -> Result<OpReport> {
        let metadata = std::fs::metadata(&output).map_err(|_| {
            FfminiError::Media(format!(
                "Output file was not created: {}",
                output.display()
            ))
        })?;

        Ok(OpReport {
            output,
            input_bytes: session.size_bytes(),
            output_bytes: metadata.len(),
            elapsed: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MockMediaProcessor;
    use crate::probe::MockMediaProber;
    use crate::split::SplitPlan;
    use assert_fs::prelude::*;

    fn session_in_temp() -> (assert_fs::TempDir, Session) {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("movie.mkv");
        file.write_binary(&[0u8; 1000]).unwrap();
        let session = Session::load(file.path()).unwrap();
        (dir, session)
    }

    #[tokio::test]
    async fn test_convert_reports_output_size() {
        let (dir, session) = session_in_temp();
        let expected_output = dir.path().join("movie_converted.mp4");

        let mut processor = MockMediaProcessor::new();
        let output_for_mock = expected_output.clone();
        processor
            .expect_convert()
            .withf(move |input, output| {
                input.ends_with("movie.mkv") && output == output_for_mock.as_path()
            })
            .times(1)
            .returning(|_, output| {
                std::fs::write(output, [0u8; 400]).unwrap();
                Ok(())
            });

        let workflow =
            Workflow::with_components(Box::new(processor), Box::new(MockMediaProber::new()));
        let report = workflow.convert(&session, "mp4").await.unwrap();

        assert_eq!(report.output, expected_output);
        assert_eq!(report.output_bytes, 400);
        assert_eq!(report.size_ratio_percent(), Some(40.0));
        assert_eq!(report.reduction_percent(), Some(60.0));
    }

    #[tokio::test]
    async fn test_convert_rejects_bad_format() {
        let (_dir, session) = session_in_temp();
        let workflow = Workflow::with_components(
            Box::new(MockMediaProcessor::new()),
            Box::new(MockMediaProber::new()),
        );

        let err = workflow.convert(&session, "../evil").await.unwrap_err();
        assert!(matches!(err, FfminiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_output_is_a_failure() {
        let (_dir, session) = session_in_temp();

        let mut processor = MockMediaProcessor::new();
        processor
            .expect_compress()
            .times(1)
            .returning(|_, _| Ok(()));

        let workflow =
            Workflow::with_components(Box::new(processor), Box::new(MockMediaProber::new()));
        let err = workflow.compress(&session).await.unwrap_err();
        assert!(matches!(err, FfminiError::Media(_)));
    }

    #[tokio::test]
    async fn test_trim_validates_times_before_spawning() {
        let (_dir, session) = session_in_temp();
        let workflow = Workflow::with_components(
            Box::new(MockMediaProcessor::new()),
            Box::new(MockMediaProber::new()),
        );

        let err = workflow.trim(&session, "abc", "60").await.unwrap_err();
        assert!(matches!(err, FfminiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_split_by_parts_probes_duration() {
        let (dir, session) = session_in_temp();

        let mut prober = MockMediaProber::new();
        prober
            .expect_duration_seconds()
            .times(1)
            .returning(|_| Ok(100.0));

        let split_dir = dir.path().join("movie_split");
        let mut processor = MockMediaProcessor::new();
        let dir_for_mock = split_dir.clone();
        processor
            .expect_split()
            .withf(|_, _, plan| *plan == SplitPlan::Duration("25.00".to_string()))
            .times(1)
            .returning(move |_, _, _| {
                std::fs::write(dir_for_mock.join("movie_part000.mp4"), [0u8; 10]).unwrap();
                std::fs::write(dir_for_mock.join("movie_part001.mp4"), [0u8; 20]).unwrap();
                Ok(())
            });

        let workflow = Workflow::with_components(Box::new(processor), Box::new(prober));
        let report = workflow.split(&session, SplitMode::ByParts(4)).await.unwrap();

        assert_eq!(report.dir, split_dir);
        assert_eq!(report.parts.len(), 2);
        assert_eq!(report.total_bytes(), 30);
    }

    #[tokio::test]
    async fn test_split_with_no_segments_is_a_failure() {
        let (_dir, session) = session_in_temp();

        let mut processor = MockMediaProcessor::new();
        processor.expect_split().times(1).returning(|_, _, _| Ok(()));

        let workflow =
            Workflow::with_components(Box::new(processor), Box::new(MockMediaProber::new()));
        let err = workflow
            .split(&session, SplitMode::ByDuration("60".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, FfminiError::Media(_)));
    }

    #[tokio::test]
    async fn test_repair_falls_back_to_reencode() {
        let (_dir, session) = session_in_temp();

        let mut processor = MockMediaProcessor::new();
        processor
            .expect_repair_copy()
            .times(1)
            .returning(|_, _| Err(FfminiError::Media("moov atom not found".to_string())));
        processor
            .expect_repair_reencode()
            .times(1)
            .returning(|_, output| {
                std::fs::write(output, [0u8; 500]).unwrap();
                Ok(())
            });

        let workflow =
            Workflow::with_components(Box::new(processor), Box::new(MockMediaProber::new()));
        let report = workflow.repair(&session).await.unwrap();

        assert!(report.reencoded);
        assert_eq!(report.op.output_bytes, 500);
    }

    #[tokio::test]
    async fn test_repair_copy_success_skips_fallback() {
        let (_dir, session) = session_in_temp();

        let mut processor = MockMediaProcessor::new();
        processor
            .expect_repair_copy()
            .times(1)
            .returning(|_, output| {
                std::fs::write(output, [0u8; 900]).unwrap();
                Ok(())
            });
        processor.expect_repair_reencode().times(0);

        let workflow =
            Workflow::with_components(Box::new(processor), Box::new(MockMediaProber::new()));
        let report = workflow.repair(&session).await.unwrap();

        assert!(!report.reencoded);
    }
}
