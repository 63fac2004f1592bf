//! CLI argument parsing for sheetstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ss")]
#[command(author, version, about = "File-backed spreadsheet store", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the store directory
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all sheets
    List,

    /// Print the cells of a sheet
    Show {
        /// Sheet ID
        #[arg(required = true)]
        sheet_id: String,

        /// A1-style range (default: A:Z)
        #[arg(short, long)]
        range: Option<String>,
    },

    /// Import a JSON file holding an array of rows
    Import {
        /// Sheet ID to create or replace
        #[arg(required = true)]
        sheet_id: String,

        /// JSON file: [["cell", ...], ...]
        #[arg(required = true)]
        file: PathBuf,

        /// Sheet title
        #[arg(short, long)]
        title: Option<String>,
    },

    /// Write a sheet's rows as JSON to stdout
    Export {
        /// Sheet ID
        #[arg(required = true)]
        sheet_id: String,
    },

    /// Delete a sheet
    Delete {
        /// Sheet ID to delete
        #[arg(required = true)]
        sheet_id: String,
    },
}
