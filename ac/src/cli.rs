//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// AdCopy - validated ad copy generation for spreadsheet campaigns
#[derive(Parser)]
#[command(
    name = "ac",
    about = "Generate search-ad titles and descriptions into spreadsheet rows",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate content for sheet rows and save the sheet
    Generate {
        /// Sheet ID in the local store
        #[arg(short, long)]
        sheet: String,

        /// Row numbers as shown in a spreadsheet (the header is row 1)
        #[arg(short, long, value_delimiter = ',', required = true)]
        rows: Vec<usize>,

        /// Model, optionally prefixed with the provider (`anthropic:claude-sonnet-4`)
        #[arg(short, long)]
        model: Option<String>,

        /// Industry used for prompt rules
        #[arg(short, long)]
        industry: Option<String>,

        /// Client profile ID from the client directory
        #[arg(long)]
        client: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the prompt that would be sent for an ad group
    Prompt {
        /// Ad group name
        #[arg(short, long)]
        ad_group: String,

        /// Comma-separated keywords
        #[arg(short, long, default_value = "")]
        keywords: String,

        /// Campaign name
        #[arg(long, default_value = "")]
        campaign: String,

        /// Industry used for prompt rules
        #[arg(short, long)]
        industry: Option<String>,

        /// Target persona
        #[arg(short, long)]
        persona: Option<String>,
    },

    /// Validate a raw model response file
    Validate {
        /// File holding the raw response
        file: PathBuf,

        /// Report length and count violations as warnings
        #[arg(long)]
        lenient: bool,

        /// Accept corrected content despite errors
        #[arg(long)]
        allow_partial: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show where titles and descriptions go in a sheet
    Columns {
        /// Sheet ID in the local store
        #[arg(short, long)]
        sheet: String,
    },

    /// Inspect or clear the content cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// List client profiles
    Clients,
}

/// Cache subcommands
#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Show entry counts
    Stats,

    /// Remove every cached entry
    Clear,
}

/// Output format for reports
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("adcopy")
        .join("logs")
        .join("adcopy.log")
}

/// Convert spreadsheet row numbers to indices into the sheet values
///
/// Row 1 is the header and row 0 does not exist; both are dropped.
pub fn row_indices(rows: &[usize]) -> Vec<usize> {
    let mut indices: Vec<usize> = rows.iter().filter(|r| **r > 1).map(|r| r - 1).collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from(["ac", "generate", "--sheet", "s1", "--rows", "3,2", "-m", "openai:gpt-4o"]).unwrap();
        match cli.command {
            Command::Generate { sheet, rows, model, .. } => {
                assert_eq!(sheet, "s1");
                assert_eq!(rows, vec![3, 2]);
                assert_eq!(model.as_deref(), Some("openai:gpt-4o"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_cache_clear() {
        let cli = Cli::try_parse_from(["ac", "-l", "debug", "cache", "clear"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(
            cli.command,
            Command::Cache {
                command: CacheCommand::Clear
            }
        ));
    }

    #[test]
    fn test_row_indices() {
        assert_eq!(row_indices(&[3, 2, 3, 1, 0]), vec![1, 2]);
    }

    #[test]
    fn test_output_format() {
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
