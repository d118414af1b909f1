//! Zorzak: upload Python profiling output and explore it with SnakeViz.
//!
//! Thin binary entry point. All logic lives in the `zorzak-core`
//! and `zorzak-gui` crates.

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "zorzak", version, about = "Dashboard for Python pstats files")]
struct Cli {
    /// JSON configuration file (ports, launch timeout, backend command)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level, including everything the backend prints
    #[arg(long, short)]
    verbose: bool,

    /// `.pstats` files to upload on startup
    files: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to the real stderr, never through the capturable console.
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Zorzak starting");

    let config = zorzak_core::config::DashboardConfig::load_or_default(cli.config.as_deref())?;

    // Build application state before opening the window so preloaded files
    // are already listed on the first frame.
    let state = zorzak_gui::ZorzakState::build(config, &cli.files);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Zorzak -- Profile Dashboard")
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 500.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Zorzak",
        options,
        Box::new(|cc| Ok(Box::new(zorzak_gui::ZorzakApp::with_state(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_accepts_config_and_files() {
        let cli = Cli::parse_from(["zorzak", "--config", "z.json", "-v", "a.pstats", "b.pstats"]);
        assert_eq!(cli.config, Some(PathBuf::from("z.json")));
        assert!(cli.verbose);
        assert_eq!(cli.files, vec![PathBuf::from("a.pstats"), PathBuf::from("b.pstats")]);
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["zorzak"]);
        assert!(cli.config.is_none());
        assert!(!cli.verbose);
        assert!(cli.files.is_empty());
    }
}
