use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::Parser;
use expiryguard_core::{ExpiryExtractor, NormalizedDate, Settings, Today};
use expiryguard_ocr::{
    default_backend, spawn_intake_watcher, ExpiryPipeline, OcrBackend, Pdftoppm,
};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

mod cli;
mod output;

const CONFIG_FILE: &str = "expiryguard.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let dirs = directories::ProjectDirs::from("com", "expiryguard", "ExpiryGuard");
    let settings = match (&cli.config, &dirs) {
        (Some(path), _) => Settings::load(path)?,
        (None, Some(dirs)) => Settings::load_or_default(&dirs.config_dir().join(CONFIG_FILE))?,
        (None, None) => Settings::default(),
    };
    let today = cli.today.unwrap_or_else(Today::now);

    match cli.command {
        Command::Scan { file, location, json } => {
            let pipeline = build_pipeline(&settings, dirs.as_ref(), today)?;
            let report = pipeline
                .process_file(&file, location.as_deref())
                .await
                .with_context(|| format!("Failed to process {}", file.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::report_text(&report));
            }
        }

        Command::Text { input, json } => {
            let text = read_input(input.as_deref())?;
            let extraction = ExpiryExtractor::new(today).extract(&text);
            if json {
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            } else {
                print!("{}", output::extraction_text(&extraction));
            }
        }

        Command::Link { date, file, location } => {
            let expiry = manual_date(&date);
            let reminder = settings
                .reminder
                .reminder(&expiry, file.as_deref(), location.as_deref().unwrap_or(""))
                .with_context(|| format!("No calendar link for '{date}'"))?;
            print!("{}", output::reminder_text(&reminder));
        }

        Command::Watch { dir, location } => {
            if !dir.is_dir() {
                bail!("{} is not a directory", dir.display());
            }
            let pipeline = build_pipeline(&settings, dirs.as_ref(), today)?;
            watch(&pipeline, &dir, location.as_deref()).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_pipeline(
    settings: &Settings,
    dirs: Option<&directories::ProjectDirs>,
    today: Today,
) -> anyhow::Result<ExpiryPipeline<Box<dyn OcrBackend>>> {
    let uploads_dir = match (&settings.storage.uploads_dir, dirs) {
        (Some(dir), _) => dir.clone(),
        (None, Some(dirs)) => dirs.data_dir().join("uploads"),
        (None, None) => bail!("No uploads directory configured and no home directory found"),
    };
    std::fs::create_dir_all(&uploads_dir)
        .with_context(|| format!("Failed to create {}", uploads_dir.display()))?;
    tracing::debug!(uploads = %uploads_dir.display(), "upload store ready");

    Ok(ExpiryPipeline::new(
        default_backend(&settings.ocr),
        uploads_dir,
        settings.reminder.clone(),
    )
    .with_rasterizer(Pdftoppm::from_settings(&settings.ocr))
    .with_today(today))
}

fn read_input(input: Option<&Path>) -> anyhow::Result<String> {
    match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Date-picker style `YYYY-MM-DD` becomes `mm/dd/yyyy`; anything else is
/// handed to the link builder as typed.
fn manual_date(input: &str) -> String {
    let input = input.trim();
    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) => NormalizedDate::from(date).to_string(),
        Err(_) => input.to_string(),
    }
}

async fn watch(
    pipeline: &ExpiryPipeline<Box<dyn OcrBackend>>,
    dir: &Path,
    location: Option<&str>,
) -> anyhow::Result<()> {
    // The channel bridges the notify watcher thread and the async processor.
    let (tx, mut rx) = mpsc::channel::<PathBuf>(64);
    let _watcher = spawn_intake_watcher(dir, tx)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;
    tracing::info!("Watching intake folder: {}", dir.display());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let path = tokio::select! {
            Some(path) = rx.recv() => path,
            _ = &mut ctrl_c => break,
        };
        // Processing races the signal too, so a long OCR run does not hold up Ctrl-C.
        tokio::select! {
            result = pipeline.process_file(&path, location) => match result {
                Ok(report) => print!("{}", output::report_text(&report)),
                Err(e) => tracing::warn!("Failed to process {}: {e}", path.display()),
            },
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted while processing {}", path.display());
                break;
            }
        }
    }

    tracing::info!("Stopping intake watcher");
    Ok(())
}
