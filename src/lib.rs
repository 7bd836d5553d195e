//! ffmini - Interactive FFmpeg Front End
//!
//! A thin convenience layer over ffmpeg and ffprobe: pick a media file and
//! run canned transformations (probe info, convert, extract audio, compress,
//! trim, split, repair) without remembering argument lists. All media work is
//! delegated to the external binaries.

pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod menu;
pub mod probe;
pub mod session;
pub mod split;
pub mod workflow;
