use std::path::{Path, PathBuf};

use crate::error::{Result, FfminiError};

/// How the user asked for the video to be split.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitMode {
    /// Equal-duration segments of the given length (HH:MM:SS or seconds).
    ByDuration(String),
    /// Approximate target size per segment, in MiB.
    BySizeMb(u64),
    /// A fixed number of equal-duration parts (requires probing the input).
    ByParts(u32),
}

/// What actually gets passed to the segment muxer. `ByParts` resolves to a
/// `Duration` plan once the input's total duration is known.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitPlan {
    /// `-segment_time <spec>`
    Duration(String),
    /// `-segment_size <bytes>`
    Size(u64),
}

impl SplitMode {
    /// Resolve to a concrete plan. `total_duration` is only consulted for
    /// `ByParts`.
    pub fn plan(&self, total_duration: Option<f64>) -> Result<SplitPlan> {
        match self {
            SplitMode::ByDuration(spec) => {
                validate_time_spec(spec)?;
                Ok(SplitPlan::Duration(spec.clone()))
            }
            SplitMode::BySizeMb(mib) => {
                if *mib == 0 {
                    return Err(FfminiError::InvalidInput(
                        "Segment size must be at least 1 MB".to_string(),
                    ));
                }
                Ok(SplitPlan::Size(mib * 1024 * 1024))
            }
            SplitMode::ByParts(parts) => {
                let total = total_duration.ok_or_else(|| {
                    FfminiError::InvalidInput(
                        "Total duration required to split by parts".to_string(),
                    )
                })?;
                let per_part = segment_duration(total, *parts)?;
                Ok(SplitPlan::Duration(format!("{:.2}", per_part)))
            }
        }
    }
}

/// Duration of each part when dividing a video into `parts` equal pieces.
pub fn segment_duration(total_secs: f64, parts: u32) -> Result<f64> {
    if parts < 2 {
        return Err(FfminiError::InvalidInput(
            "Number of parts must be 2 or more".to_string(),
        ));
    }
    if total_secs <= 0.0 {
        return Err(FfminiError::InvalidInput(
            "Input has no measurable duration".to_string(),
        ));
    }
    Ok(total_secs / parts as f64)
}

/// Superficial check that a user-entered time is something ffmpeg accepts:
/// plain seconds (optionally fractional) or HH:MM:SS with optional fraction.
/// The value itself is passed through to the tool verbatim.
pub fn validate_time_spec(spec: &str) -> Result<()> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(FfminiError::InvalidInput("Time must not be empty".to_string()));
    }

    let ok = if spec.contains(':') {
        let sections: Vec<&str> = spec.split(':').collect();
        sections.len() == 3
            && sections[0].chars().all(|c| c.is_ascii_digit())
            && !sections[0].is_empty()
            && sections[1].len() == 2
            && sections[1].chars().all(|c| c.is_ascii_digit())
            && is_seconds_field(sections[2])
    } else {
        is_seconds_field(spec)
    };

    if ok {
        Ok(())
    } else {
        Err(FfminiError::InvalidInput(format!(
            "Invalid time '{}' (expected HH:MM:SS or seconds)",
            spec
        )))
    }
}

fn is_seconds_field(s: &str) -> bool {
    let mut sections = s.splitn(2, '.');
    let whole = sections.next().unwrap_or("");
    let frac = sections.next();
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && frac.is_none_or(|f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
}

/// One produced segment.
#[derive(Debug, Clone, PartialEq)]
pub struct PartFile {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl PartFile {
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Enumerate the segments the tool wrote, sorted by name. The segment muxer
/// rounds at keyframe boundaries, so the count may differ from the requested
/// part count by one; the listing reports what exists.
pub fn list_parts(dir: &Path, prefix: &str) -> Result<Vec<PartFile>> {
    let mut parts = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(prefix) && name.ends_with(".mp4") {
            let metadata = entry.metadata()?;
            parts.push(PartFile {
                path: entry.path(),
                size_bytes: metadata.len(),
            });
        }
    }

    parts.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(parts)
}
