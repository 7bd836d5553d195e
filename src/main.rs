//! ffmini - Interactive FFmpeg Front End
//!
//! Entry point. With no subcommand the interactive menu runs over the given
//! file; each operation is also exposed as a subcommand for scripting.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use ffmini::cli::{Args, Commands};
use ffmini::config::Config;
use ffmini::error::FfminiError;
use ffmini::menu;
use ffmini::session::Session;
use ffmini::split::SplitMode;
use ffmini::workflow::Workflow;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        None => menu::run(config, args.file).await?,
        Some(command) => run_command(config, command).await?,
    }

    Ok(())
}

async fn run_command(config: Config, command: Commands) -> Result<()> {
    let workflow = Workflow::new(config)?;

    match command {
        Commands::Info { input } => {
            let session = Session::load(&input)?;
            let report = workflow.info(&session).await?;
            print!("{}", report.summary());
        }
        Commands::Convert { input, format } => {
            let session = Session::load(&input)?;
            let report = workflow.convert(&session, &format).await?;
            menu::report_op("Conversion", &report);
        }
        Commands::Extract { input } => {
            let session = Session::load(&input)?;
            let report = workflow.extract_audio(&session).await?;
            menu::report_op("Audio extraction", &report);
        }
        Commands::Compress { input } => {
            let session = Session::load(&input)?;
            let report = workflow.compress(&session).await?;
            menu::report_op("Compression", &report);
            if let Some(reduction) = report.reduction_percent() {
                menu::print_info(&format!("  Reduction: {:.1}% smaller", reduction));
            }
        }
        Commands::Trim { input, start, duration } => {
            let session = Session::load(&input)?;
            let report = workflow.trim(&session, &start, &duration).await?;
            menu::report_op("Trim", &report);
        }
        Commands::Split { input, duration, size_mb, parts } => {
            let session = Session::load(&input)?;
            let mode = split_mode_from_flags(duration, size_mb, parts)?;
            let report = workflow.split(&session, mode).await?;
            menu::report_split(&report);
        }
        Commands::Repair { input } => {
            let session = Session::load(&input)?;
            let report = workflow.repair(&session).await?;
            menu::report_op("Video repair", &report.op);
            if report.reencoded {
                menu::print_warning("Note: video was re-encoded, quality may be slightly reduced");
            }
        }
    }

    Ok(())
}

fn split_mode_from_flags(
    duration: Option<String>,
    size_mb: Option<u64>,
    parts: Option<u32>,
) -> std::result::Result<SplitMode, FfminiError> {
    match (duration, size_mb, parts) {
        (Some(spec), None, None) => Ok(SplitMode::ByDuration(spec)),
        (None, Some(mib), None) => Ok(SplitMode::BySizeMb(mib)),
        (None, None, Some(n)) => Ok(SplitMode::ByParts(n)),
        _ => Err(FfminiError::InvalidInput(
            "Pick exactly one of --duration, --size-mb, --parts".to_string(),
        )),
    }
}

/// Setup logging to both console and a daily-rolling file under .ffmini/log
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".ffmini").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "ffmini.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::WARN };

    // The console belongs to the menu; only warnings and errors surface there
    // unless --verbose is set.
    let console_layer = fmt::layer()
        .with_target(false)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_mode_requires_exactly_one_flag() {
        assert!(split_mode_from_flags(None, None, None).is_err());
        assert!(split_mode_from_flags(Some("60".into()), Some(10), None).is_err());
        assert_eq!(
            split_mode_from_flags(None, None, Some(4)).unwrap(),
            SplitMode::ByParts(4)
        );
        assert_eq!(
            split_mode_from_flags(None, Some(10), None).unwrap(),
            SplitMode::BySizeMb(10)
        );
    }
}
