use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use sheetstore::cli::{Cli, Command};
use sheetstore::config::Config;
use sheetstore::{SheetRange, SheetStore, column_label};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let store_path = cli.store.clone().unwrap_or(config.store_path.clone());

    info!("sheetstore starting");

    let store = SheetStore::open(&store_path)?;

    match cli.command {
        Command::List => {
            let sheets = store.list()?;
            if sheets.is_empty() {
                println!("No sheets found");
            } else {
                for sheet in sheets {
                    println!(
                        "{} {} {}",
                        sheet.id.cyan(),
                        format!("{}x{}", sheet.rows, sheet.columns).dimmed(),
                        sheet.title.unwrap_or_default()
                    );
                }
            }
        }
        Command::Show { sheet_id, range } => {
            let range_expr = range.unwrap_or(config.default_range.clone());
            let range = SheetRange::parse(&range_expr)?;
            let doc = store.get(&sheet_id, &range)?;
            if let Some(title) = &doc.title {
                println!("{}", title.bold());
            }
            for (idx, row) in doc.values.iter().enumerate() {
                let cells: Vec<String> = row
                    .iter()
                    .enumerate()
                    .map(|(c, cell)| format!("{}={}", column_label(range.start_col + c).yellow(), cell))
                    .collect();
                println!("{} {}", (range.start_row + idx + 1).to_string().dimmed(), cells.join(" | "));
            }
        }
        Command::Import { sheet_id, file, title } => {
            let content = std::fs::read_to_string(&file).context(format!("Failed to read {}", file.display()))?;
            let values: Vec<Vec<String>> = serde_json::from_str(&content).context("Expected a JSON array of rows")?;
            let rows = values.len();
            store.put(&sheet_id, title, values)?;
            println!("{} Imported {} rows into {}", "✓".green(), rows, sheet_id.cyan());
        }
        Command::Export { sheet_id } => {
            let doc = store.load(&sheet_id)?;
            println!("{}", serde_json::to_string_pretty(&doc.values)?);
        }
        Command::Delete { sheet_id } => {
            store.delete(&sheet_id)?;
            println!("{} Deleted sheet: {}", "✓".green(), sheet_id);
        }
    }

    Ok(())
}
