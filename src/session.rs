use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, FfminiError};

/// The currently selected input file and the sibling paths derived from it.
///
/// Outputs are always written next to the input, named after its stem:
/// `video.mkv` becomes `video_converted.mp4`, `video_audio.mp3`, and so on.
#[derive(Debug, Clone)]
pub struct Session {
    path: PathBuf,
    size_bytes: u64,
}

impl Session {
    /// Load a file into the session. Fails if the path does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)
            .map_err(|_| FfminiError::FileNotFound(path.display().to_string()))?;

        if !metadata.is_file() {
            return Err(FfminiError::InvalidInput(format!(
                "Not a regular file: {}",
                path.display()
            )));
        }

        debug!("Loaded session file: {} ({} bytes)", path.display(), metadata.len());

        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    }

    fn sibling(&self, name: String) -> PathBuf {
        match self.path.parent() {
            Some(parent) => parent.join(name),
            None => PathBuf::from(name),
        }
    }

    pub fn convert_output(&self, format: &str) -> PathBuf {
        self.sibling(format!("{}_converted.{}", self.stem(), format))
    }

    pub fn extract_output(&self) -> PathBuf {
        self.sibling(format!("{}_audio.mp3", self.stem()))
    }

    pub fn compress_output(&self) -> PathBuf {
        self.sibling(format!("{}_compressed.mp4", self.stem()))
    }

    pub fn trim_output(&self) -> PathBuf {
        self.sibling(format!("{}_cut.mp4", self.stem()))
    }

    pub fn repair_output(&self) -> PathBuf {
        self.sibling(format!("{}_fixed.mp4", self.stem()))
    }

    /// Directory that receives split segments.
    pub fn split_dir(&self) -> PathBuf {
        self.sibling(format!("{}_split", self.stem()))
    }

    /// ffmpeg segment output pattern inside the split directory.
    pub fn split_pattern(&self) -> PathBuf {
        self.split_dir()
            .join(format!("{}_part%03d.mp4", self.stem()))
    }

    /// Glob-free prefix used to enumerate produced segments.
    pub fn split_part_prefix(&self) -> String {
        format!("{}_part", self.stem())
    }
}

/// Clean a path string as entered interactively.
///
/// Terminal drag-and-drop wraps paths in quotes and escapes spaces; both
/// forms must resolve to the on-disk path.
pub fn clean_path_input(input: &str) -> String {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| {
            trimmed
                .strip_prefix('\'')
                .and_then(|s| s.strip_suffix('\''))
        })
        .unwrap_or(trimmed);

    trimmed.replace("\\ ", " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn session_for(name: &str) -> (assert_fs::TempDir, Session) {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child(name);
        file.write_binary(b"not really media").unwrap();
        let session = Session::load(file.path()).unwrap();
        (dir, session)
    }

    #[test]
    fn test_load_missing_file() {
        let err = Session::load("/no/such/file.mp4").unwrap_err();
        assert!(matches!(err, FfminiError::FileNotFound(_)));
    }

    #[test]
    fn test_output_naming() {
        let (dir, session) = session_for("movie.mkv");

        assert_eq!(
            session.convert_output("mp4"),
            dir.path().join("movie_converted.mp4")
        );
        assert_eq!(session.extract_output(), dir.path().join("movie_audio.mp3"));
        assert_eq!(
            session.compress_output(),
            dir.path().join("movie_compressed.mp4")
        );
        assert_eq!(session.trim_output(), dir.path().join("movie_cut.mp4"));
        assert_eq!(session.repair_output(), dir.path().join("movie_fixed.mp4"));
    }

    #[test]
    fn test_split_paths() {
        let (dir, session) = session_for("clip.mp4");

        assert_eq!(session.split_dir(), dir.path().join("clip_split"));
        assert_eq!(
            session.split_pattern(),
            dir.path().join("clip_split").join("clip_part%03d.mp4")
        );
        assert_eq!(session.split_part_prefix(), "clip_part");
    }

    #[test]
    fn test_size_reporting() {
        let (_dir, session) = session_for("a.mp4");
        assert_eq!(session.size_bytes(), 16);
        assert!(session.size_mb() > 0.0);
        assert_eq!(session.file_name(), "a.mp4");
    }

    #[test]
    fn test_clean_path_input() {
        assert_eq!(clean_path_input("  /tmp/a.mp4  "), "/tmp/a.mp4");
        assert_eq!(clean_path_input("\"/tmp/my file.mp4\""), "/tmp/my file.mp4");
        assert_eq!(clean_path_input("'/tmp/a.mp4'"), "/tmp/a.mp4");
        assert_eq!(clean_path_input("/tmp/my\\ file.mp4"), "/tmp/my file.mp4");
    }
}
