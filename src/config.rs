use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{Result, FfminiError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub media: MediaConfig,
    pub extract: ExtractConfig,
    pub compress: CompressConfig,
    pub repair: RepairConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub ffmpeg_path: String,
    /// Path to ffprobe binary
    pub ffprobe_path: String,
    /// Seconds of media time between progress reports
    #[serde(default = "default_progress_interval")]
    pub progress_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Audio codec for extraction
    pub audio_codec: String,
    /// Audio bitrate (e.g. "192k")
    pub audio_bitrate: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressConfig {
    /// Video codec for compression
    pub video_codec: String,
    /// Constant rate factor (0-51, lower = better quality)
    pub crf: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairConfig {
    /// CRF for the re-encoding fallback
    pub fallback_crf: u32,
    /// Encoder preset for the re-encoding fallback
    pub fallback_preset: String,
}

fn default_progress_interval() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media: MediaConfig {
                ffmpeg_path: "ffmpeg".to_string(),
                ffprobe_path: "ffprobe".to_string(),
                progress_interval_secs: default_progress_interval(),
            },
            extract: ExtractConfig {
                audio_codec: "libmp3lame".to_string(),
                audio_bitrate: "192k".to_string(),
            },
            compress: CompressConfig {
                video_codec: "libx264".to_string(),
                crf: 28,
            },
            repair: RepairConfig {
                fallback_crf: 23,
                fallback_preset: "fast".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FfminiError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| FfminiError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FfminiError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| FfminiError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.media.ffmpeg_path, "ffmpeg");
        assert_eq!(config.media.ffprobe_path, "ffprobe");
        assert_eq!(config.extract.audio_codec, "libmp3lame");
        assert_eq!(config.compress.crf, 28);
        assert_eq!(config.repair.fallback_preset, "fast");
    }

    #[test]
    fn test_roundtrip_through_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = toml::to_string_pretty(&Config::default()).unwrap();
        file.write_all(content.as_bytes()).unwrap();

        let loaded = Config::from_file(file.path()).unwrap();
        assert_eq!(loaded.compress.video_codec, "libx264");
        assert_eq!(loaded.extract.audio_bitrate, "192k");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, FfminiError::Config(_)));
    }
}
