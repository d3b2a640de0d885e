use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use expiryguard_core::Today;

#[derive(Parser, Debug)]
#[command(author, version, about = "Find the expiry date in a scanned document and set a reminder", long_about = None)]
pub struct Cli {
    /// Settings file (TOML). Defaults to expiryguard.toml in the config directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference date, YYYY-MM-DD (defaults to today)
    #[arg(long, global = true, value_parser = parse_today)]
    pub today: Option<Today>,

    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a document (image, PDF or text), read it and extract the expiry date
    Scan {
        file: PathBuf,

        /// Where the physical document is kept
        #[arg(short, long)]
        location: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract the expiry date from plain text (a file, or stdin when omitted)
    Text {
        input: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build a reminder link for a date entered by hand
    Link {
        /// mm/dd/yyyy, mm/yyyy or YYYY-MM-DD
        date: String,

        /// Document the reminder points at
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Where the physical document is kept
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Process every document dropped into a folder until interrupted
    Watch {
        dir: PathBuf,

        /// Where the physical documents are kept
        #[arg(short, long)]
        location: Option<String>,
    },
}

fn parse_today(s: &str) -> Result<Today, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(Today::new)
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "expiryguard",
            "scan",
            "id.png",
            "--today",
            "2024-05-01",
            "--location",
            "Desk drawer",
        ])
        .unwrap();
        assert_eq!(cli.today, Some(Today::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())));
        match cli.command {
            Command::Scan { file, location, json } => {
                assert_eq!(file, PathBuf::from("id.png"));
                assert_eq!(location.as_deref(), Some("Desk drawer"));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bad_today_is_rejected() {
        assert!(Cli::try_parse_from(["expiryguard", "--today", "05/01/2024", "text"]).is_err());
    }
}
