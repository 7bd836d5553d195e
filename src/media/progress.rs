use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;

/// One event from ffmpeg's `-progress pipe:1` stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    /// Processed media time in seconds.
    Time(f64),
    /// ffmpeg wrote `progress=end`.
    End,
}

/// Parser for the key=value lines ffmpeg writes to the progress pipe.
///
/// `out_time_ms` carries microseconds despite its name; `out_time` is the
/// HH:MM:SS.ffffff fallback some builds emit instead.
pub struct ProgressParser {
    re_out_time_ms: Regex,
    re_out_time: Regex,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self {
            re_out_time_ms: Regex::new(r"^out_time_ms=(\d+)").unwrap(),
            re_out_time: Regex::new(r"^out_time=(\d+):(\d{2}):(\d{2})(?:\.(\d+))?").unwrap(),
        }
    }

    pub fn parse(&self, line: &str) -> Option<ProgressEvent> {
        let line = line.trim();

        if let Some(cap) = self.re_out_time_ms.captures(line) {
            if let Ok(us) = cap[1].parse::<u64>() {
                return Some(ProgressEvent::Time(us as f64 / 1_000_000.0));
            }
        }

        if let Some(cap) = self.re_out_time.captures(line) {
            let hours: f64 = cap[1].parse().ok()?;
            let minutes: f64 = cap[2].parse().ok()?;
            let seconds: f64 = cap[3].parse().ok()?;
            let frac = cap
                .get(4)
                .and_then(|m| format!("0.{}", m.as_str()).parse::<f64>().ok())
                .unwrap_or(0.0);
            return Some(ProgressEvent::Time(
                hours * 3600.0 + minutes * 60.0 + seconds + frac,
            ));
        }

        if line == "progress=end" {
            return Some(ProgressEvent::End);
        }

        None
    }
}

impl Default for ProgressParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Spinner that reports processed media time while a child process runs.
///
/// Updates are throttled to one report per `interval_secs` of media time so
/// long jobs do not flood the terminal.
pub struct ProgressReporter {
    bar: ProgressBar,
    label: String,
    interval_secs: f64,
    last_reported: f64,
    started: Instant,
}

impl ProgressReporter {
    pub fn new<S: Into<String>>(label: S, interval_secs: u64) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));

        let label = label.into();
        bar.set_message(format!("{} in progress...", label));

        Self {
            bar,
            label,
            interval_secs: interval_secs.max(1) as f64,
            last_reported: 0.0,
            started: Instant::now(),
        }
    }

    pub fn observe(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::Time(seconds) => {
                if seconds - self.last_reported >= self.interval_secs {
                    self.last_reported = seconds;
                    let elapsed = self.started.elapsed().as_secs_f64();
                    self.bar.set_message(format!(
                        "{}: {:.1}s processed (elapsed: {:.1}s)",
                        self.label, seconds, elapsed
                    ));
                }
            }
            ProgressEvent::End => {
                self.bar.set_message(format!("{}: finalizing...", self.label));
            }
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_out_time_ms() {
        let parser = ProgressParser::new();
        assert_eq!(
            parser.parse("out_time_ms=5000000"),
            Some(ProgressEvent::Time(5.0))
        );
    }

    #[test]
    fn test_parse_out_time_fallback() {
        let parser = ProgressParser::new();
        match parser.parse("out_time=00:01:05.500000") {
            Some(ProgressEvent::Time(t)) => assert!((t - 65.5).abs() < 1e-6),
            other => panic!("unexpected parse result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_end_marker() {
        let parser = ProgressParser::new();
        assert_eq!(parser.parse("progress=end"), Some(ProgressEvent::End));
        assert_eq!(parser.parse("progress=continue"), None);
    }

    #[test]
    fn test_parse_ignores_other_keys() {
        let parser = ProgressParser::new();
        assert_eq!(parser.parse("frame=120"), None);
        assert_eq!(parser.parse("speed=2.5x"), None);
        assert_eq!(parser.parse(""), None);
    }
}
