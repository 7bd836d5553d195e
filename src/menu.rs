//! Interactive numbered menu over a loaded session.
//!
//! This is the presentation layer: it gathers operation parameters from
//! stdin, hands them to the workflow, and prints the reports.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::session::{Session, clean_path_input};
use crate::split::SplitMode;
use crate::workflow::{OpReport, SplitReport, Workflow};

const GREEN: &str = "\x1b[92m";
const RED: &str = "\x1b[91m";
const CYAN: &str = "\x1b[96m";
const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub fn print_header(text: &str) {
    let bar = "=".repeat(60);
    println!("\n{}{}{}", BOLD, bar, RESET);
    println!("{}{:^60}{}", BOLD, text, RESET);
    println!("{}{}{}\n", BOLD, bar, RESET);
}

pub fn print_success(text: &str) {
    println!("{}✓{} {}", GREEN, RESET, text);
}

pub fn print_error(text: &str) {
    println!("{}✗{} {}", RED, RESET, text);
}

pub fn print_info(text: &str) {
    println!("{}ℹ{} {}", CYAN, RESET, text);
}

pub fn print_warning(text: &str) {
    println!("{}⚠{} {}", YELLOW, RESET, text);
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{} ", prompt);
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(buf.trim().to_string())
}

fn show_menu() {
    println!("\n{}", "─".repeat(60));
    println!("{}Operations:{}", BOLD, RESET);
    println!("{}", "─".repeat(60));
    println!("  {}1{}. Get File Info", GREEN, RESET);
    println!("  {}2{}. Convert to MP4", GREEN, RESET);
    println!("  {}3{}. Convert to MP3", GREEN, RESET);
    println!("  {}4{}. Extract Audio", GREEN, RESET);
    println!("  {}5{}. Compress Video", GREEN, RESET);
    println!("  {}6{}. Cut/Trim Video", GREEN, RESET);
    println!("  {}7{}. Split Video", GREEN, RESET);
    println!("  {}8{}. Fix Broken Video", YELLOW, RESET);
    println!("  {}9{}. Select Different File", GREEN, RESET);
    println!("  {}0{}. Exit", RED, RESET);
    println!("{}", "─".repeat(60));
}

pub fn report_op(label: &str, report: &OpReport) {
    print_success(&format!("{} complete!", label));
    print_success(&format!("  Output size: {:.2} MB", report.output_mb()));
    print_success(&format!("  Time: {:.1} seconds", report.elapsed.as_secs_f64()));
    print_success(&format!("  Saved to: {}", report.output.display()));
    if let Some(ratio) = report.size_ratio_percent() {
        print_info(&format!("  Size ratio: {:.1}% of original", ratio));
    }
}

pub fn report_split(report: &SplitReport) {
    print_success("Video split complete!");
    print_success(&format!("  Created {} parts", report.parts.len()));
    print_success(&format!("  Total size: {:.2} MB", report.total_mb()));
    print_success(&format!("  Time: {:.1} seconds", report.elapsed.as_secs_f64()));
    print_success(&format!("  Saved to: {}", report.dir.display()));

    println!("\n{}Parts created:{}", CYAN, RESET);
    for (i, part) in report.parts.iter().enumerate() {
        let name = part
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("  {}. {} ({:.2} MB)", i + 1, name, part.size_mb());
    }
}

fn announce_session(session: &Session) {
    print_success(&format!(
        "Loaded: {} ({:.2} MB)",
        session.file_name(),
        session.size_mb()
    ));
}

fn prompt_for_session() -> Result<Session> {
    println!("\n{}Enter path to video/audio file:{}", CYAN, RESET);
    println!(
        "{}(or drag and drop the file here, then press Enter){}",
        YELLOW, RESET
    );
    let input = read_line("→")?;
    let cleaned = clean_path_input(&input);

    if cleaned.is_empty() {
        return Err(crate::error::FfminiError::InvalidInput(
            "No file path provided".to_string(),
        ));
    }

    Session::load(cleaned)
}

async fn run_trim(workflow: &Workflow, session: &Session) -> Result<OpReport> {
    println!("\n{}", "─".repeat(60));
    println!("{}Cut/Trim Video{}", CYAN, RESET);
    println!("{}", "─".repeat(60));

    let start = read_line("Enter start time (HH:MM:SS or seconds, e.g., 00:00:30):")?;
    let duration = read_line("Enter duration (HH:MM:SS or seconds, e.g., 00:01:00):")?;

    workflow.trim(session, &start, &duration).await
}

async fn run_split(workflow: &Workflow, session: &Session) -> Result<SplitReport> {
    println!("\n{}", "─".repeat(60));
    println!("{}Split Video{}", CYAN, RESET);
    println!("{}", "─".repeat(60));
    println!("\n{}Split by:{}", BOLD, RESET);
    println!("  {}1{}. Time (equal duration segments)", GREEN, RESET);
    println!("  {}2{}. Size (approximate file size)", GREEN, RESET);
    println!("  {}3{}. Number of parts", GREEN, RESET);

    let choice = read_line("\nSelect split method (1-3):")?;

    let mode = match choice.as_str() {
        "1" => {
            let spec =
                read_line("Enter segment duration (HH:MM:SS or seconds, e.g., 00:01:00 or 60):")?;
            SplitMode::ByDuration(spec)
        }
        "2" => {
            let raw = read_line("Enter target size per segment in MB (e.g., 10):")?;
            let mib = raw.parse().map_err(|_| {
                crate::error::FfminiError::InvalidInput(format!("Invalid size '{}'", raw))
            })?;
            SplitMode::BySizeMb(mib)
        }
        "3" => {
            let raw = read_line("Enter number of parts (e.g., 4):")?;
            let parts = raw.parse().map_err(|_| {
                crate::error::FfminiError::InvalidInput(format!("Invalid part count '{}'", raw))
            })?;
            SplitMode::ByParts(parts)
        }
        _ => {
            return Err(crate::error::FfminiError::InvalidInput(
                "Invalid choice".to_string(),
            ));
        }
    };

    workflow.split(session, mode).await
}

/// Main interactive loop. Blocks between operations; one child process runs
/// at a time.
pub async fn run(config: Config, initial_file: Option<PathBuf>) -> Result<()> {
    print_header("ffmini - FFmpeg Front End");

    print_info(&format!(
        "OS: {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    ));

    let workflow = Workflow::new(config)?;
    match workflow.version_info().await {
        Ok(version) => print_success(&format!("{} detected", version)),
        Err(e) => print_warning(&format!("Could not read ffmpeg version: {}", e)),
    }

    println!("\n{}", "─".repeat(60));

    let mut session = match initial_file {
        Some(path) => match Session::load(&path) {
            Ok(session) => session,
            Err(e) => {
                print_error(&format!("{}", e));
                prompt_for_session()?
            }
        },
        None => prompt_for_session()?,
    };
    announce_session(&session);

    loop {
        show_menu();

        let choice = read_line("\nSelect operation (0-9):")?;

        let outcome: Result<()> = match choice.as_str() {
            "0" => {
                print_info("Goodbye!");
                break;
            }
            "1" => match workflow.info(&session).await {
                Ok(report) => {
                    println!("\n{}", report.summary());
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "2" => workflow
                .convert(&session, "mp4")
                .await
                .map(|r| report_op("Conversion", &r)),
            "3" => workflow
                .convert(&session, "mp3")
                .await
                .map(|r| report_op("Conversion", &r)),
            "4" => workflow
                .extract_audio(&session)
                .await
                .map(|r| report_op("Audio extraction", &r)),
            "5" => workflow.compress(&session).await.map(|r| {
                print_success("Video compressed!");
                if let Some(reduction) = r.reduction_percent() {
                    print_success(&format!(
                        "  New size: {:.2} MB ({:.1}% smaller)",
                        r.output_mb(),
                        reduction
                    ));
                }
                print_success(&format!("  Saved to: {}", r.output.display()));
            }),
            "6" => run_trim(&workflow, &session)
                .await
                .map(|r| report_op("Trim", &r)),
            "7" => run_split(&workflow, &session)
                .await
                .map(|r| report_split(&r)),
            "8" => workflow.repair(&session).await.map(|r| {
                report_op("Video repair", &r.op);
                if r.reencoded {
                    print_warning("Note: video was re-encoded, quality may be slightly reduced");
                }
            }),
            "9" => {
                let input = read_line("\nEnter new file path:")?;
                let cleaned = clean_path_input(&input);
                match Session::load(&cleaned) {
                    Ok(new_session) => {
                        session = new_session;
                        announce_session(&session);
                        Ok(())
                    }
                    Err(e) => {
                        print_error(&format!("{}", e));
                        Ok(())
                    }
                }
            }
            _ => {
                print_warning("Invalid choice! Please select 0-9.");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            print_error(&format!("{}", e));
        }

        let _ = read_line(&format!("\n{}Press Enter to continue...{}", YELLOW, RESET));
    }

    Ok(())
}
