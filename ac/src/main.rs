//! AdCopy - ad copy generation for spreadsheet campaigns
//!
//! CLI entry point for generating, previewing and validating content.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info, warn};

use adcopy::batch::{JobInput, ProgressCallback};
use adcopy::cache::CacheManager;
use adcopy::cli::{CacheCommand, Cli, Command, OutputFormat, get_log_path, row_indices};
use adcopy::config::Config;
use adcopy::directory::{ClientDirectory, InMemoryClientDirectory};
use adcopy::domain::{ClientProfile, LegacyGenerationOptions, RequestDefaults};
use adcopy::llm::create_router;
use adcopy::orchestrator::{BatchOutcome, GenerationOrchestrator, SaveOutcome};
use adcopy::prompts::{PromptBuilder, PromptOptions, PromptVariables};
use adcopy::sheet::{InputColumns, LocalSheetStore, SpreadsheetStore, map_columns};
use adcopy::validation::{ResponseValidator, ValidationResult, ValidationRules};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!("AdCopy loaded config: default-model={}", config.llm.default_model);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Generate {
            sheet,
            rows,
            model,
            industry,
            client,
            format,
        } => {
            debug!(%sheet, ?rows, "main: matched Generate command");
            cmd_generate(&config, &sheet, &rows, model, industry, client, format).await
        }
        Command::Prompt {
            ad_group,
            keywords,
            campaign,
            industry,
            persona,
        } => {
            debug!(%ad_group, "main: matched Prompt command");
            cmd_prompt(&config, ad_group, keywords, campaign, industry, persona)
        }
        Command::Validate {
            file,
            lenient,
            allow_partial,
            format,
        } => {
            debug!(?file, "main: matched Validate command");
            cmd_validate(&config, &file, lenient, allow_partial, format)
        }
        Command::Columns { sheet } => {
            debug!(%sheet, "main: matched Columns command");
            cmd_columns(&config, &sheet).await
        }
        Command::Cache { command } => {
            debug!(?command, "main: matched Cache command");
            cmd_cache(&config, command).await
        }
        Command::Clients => {
            debug!("main: matched Clients command");
            cmd_clients(&config).await
        }
    }
}

fn request_defaults(config: &Config, model: Option<String>) -> RequestDefaults {
    RequestDefaults {
        model: model.unwrap_or_else(|| config.llm.default_model.clone()),
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
    }
}

fn load_directory(config: &Config) -> Result<Option<InMemoryClientDirectory>> {
    match &config.clients.path {
        Some(path) => Ok(Some(
            InMemoryClientDirectory::load(path).context(format!("Failed to load clients from {}", path.display()))?,
        )),
        None => Ok(None),
    }
}

async fn cmd_generate(
    config: &Config,
    sheet_id: &str,
    rows: &[usize],
    model: Option<String>,
    industry: Option<String>,
    client: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    debug!(%sheet_id, ?rows, "cmd_generate: called");
    config.validate()?;

    let store = Arc::new(LocalSheetStore::open(&config.sheet.store_dir).context("Failed to open sheet store")?);
    // The whole grid is saved back, so read all of it
    let data = store
        .get_full_sheet(sheet_id)
        .await
        .context(format!("Failed to read sheet '{}'", sheet_id))?;
    let Some(headers) = data.values.first() else {
        return Err(eyre!("Sheet '{}' has no header row", sheet_id));
    };
    let inputs = InputColumns::locate(headers.as_slice());

    let profile: Option<ClientProfile> = match client {
        Some(id) => {
            let directory = load_directory(config)?
                .ok_or_else(|| eyre!("No client file configured (clients.path)"))?;
            Some(
                directory
                    .get_by_id(&id)
                    .await
                    .ok_or_else(|| eyre!("Unknown client '{}'", id))?,
            )
        }
        None => None,
    };

    let defaults = request_defaults(config, model);
    let mut jobs = Vec::new();
    for row_index in row_indices(rows) {
        let Some(row) = data.values.get(row_index) else {
            warn!(row_index, "cmd_generate: row past the end of the sheet");
            eprintln!("{} row {} does not exist", "Skipping:".yellow(), row_index + 1);
            continue;
        };
        let options = LegacyGenerationOptions {
            industry: industry.clone(),
            ..inputs.options_for(row)
        };
        let mut request = options.to_request(&defaults);
        if let Some(profile) = &profile {
            request.client = profile.clone();
        }
        jobs.push(JobInput::new(row_index, request));
    }
    if jobs.is_empty() {
        return Err(eyre!("No data rows selected"));
    }

    let router = create_router(&config.llm).context("Failed to create LLM provider")?;
    let prompts = PromptBuilder::new(std::env::current_dir()?);
    let orchestrator = GenerationOrchestrator::from_config(config, Arc::new(router), prompts, store);

    if jobs.len() == 1 {
        let Some(job) = jobs.pop() else {
            return Err(eyre!("No data rows selected"));
        };
        let row = job.row_index;
        let outcome = orchestrator
            .generate_and_save_content(job.request, sheet_id, row, data.values)
            .await;
        print_save_outcome(row, &outcome, &format)?;
        return if outcome.success {
            Ok(())
        } else {
            Err(eyre!("Generation failed for row {}", row + 1))
        };
    }

    let progress: ProgressCallback = Arc::new(|done, total| eprintln!("Progress: {}/{}", done, total));
    let outcome = orchestrator
        .generate_content_for_multiple_rows(jobs, sheet_id, data.values, Some(progress))
        .await;
    print_batch_outcome(&outcome, &format)?;
    if outcome.success {
        Ok(())
    } else {
        Err(eyre!(outcome.error.unwrap_or_else(|| "Batch generation failed".to_string())))
    }
}

fn print_save_outcome(row_index: usize, outcome: &SaveOutcome, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => match (&outcome.content, &outcome.error) {
            (Some(content), _) => {
                let cached = if outcome.from_cache { " (cached)" } else { "" };
                println!(
                    "{} row {}: {} titles, {} descriptions{}",
                    "✓".green(),
                    row_index + 1,
                    content.titles.len(),
                    content.descriptions.len(),
                    cached
                );
            }
            (None, Some(error)) => println!("{} row {}: {}", "✗".red(), row_index + 1, error),
            (None, None) => println!("{} row {}", "?".yellow(), row_index + 1),
        },
    }
    Ok(())
}

fn print_batch_outcome(outcome: &BatchOutcome, format: &OutputFormat) -> Result<()> {
    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    for result in &outcome.results {
        let row = result.row_index + 1;
        match (&result.content, &result.error) {
            (Some(content), _) => println!(
                "{} row {}: {} titles, {} descriptions{}",
                "✓".green(),
                row,
                content.titles.len(),
                content.descriptions.len(),
                if result.from_cache { " (cached)" } else { "" }
            ),
            (None, error) => println!(
                "{} row {}: {}",
                "✗".red(),
                row,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
    println!(
        "{} of {} rows in {:.1}s, {} from cache",
        outcome.succeeded(),
        outcome.results.len(),
        outcome.total_time.as_secs_f64(),
        outcome.cache_hits
    );
    if let Some(error) = &outcome.error {
        println!("{} {}", "Error:".red(), error);
    }
    Ok(())
}

fn cmd_prompt(
    config: &Config,
    ad_group: String,
    keywords: String,
    campaign: String,
    industry: Option<String>,
    persona: Option<String>,
) -> Result<()> {
    debug!(%ad_group, "cmd_prompt: called");
    let options = LegacyGenerationOptions {
        ad_group: Some(ad_group),
        keywords: Some(keywords),
        campaign: Some(campaign),
        industry,
        target_persona: persona,
        ..Default::default()
    };
    let request = options.to_request(&request_defaults(config, None));
    let builder = PromptBuilder::new(std::env::current_dir()?)
        .with_min_description_length(config.generation.min_description_length);
    let prompt = builder.build(&PromptVariables::from_request(&request), &PromptOptions::default());
    println!("{}", prompt);
    Ok(())
}

fn cmd_validate(config: &Config, file: &Path, lenient: bool, allow_partial: bool, format: OutputFormat) -> Result<()> {
    debug!(?file, lenient, allow_partial, "cmd_validate: called");
    let raw = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let rules = ValidationRules {
        min_description_length: config.generation.min_description_length,
        quality_threshold: config.generation.quality_threshold,
        ..Default::default()
    }
    .strict(!lenient)
    .allow_partial(allow_partial);
    let result = ResponseValidator::new(rules).validate_and_correct(&raw);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_validation(&result)?,
    }
    if result.is_valid {
        Ok(())
    } else {
        Err(eyre!("Response is not valid"))
    }
}

fn print_validation(result: &ValidationResult) -> Result<()> {
    let verdict = if result.is_valid { "VALID".green() } else { "INVALID".red() };
    println!("{} (score {:.2})", verdict, result.score);
    for error in &result.errors {
        println!("  {} {}", "error:".red(), error);
    }
    for warning in &result.warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }
    for suggestion in &result.suggestions {
        println!("  {} {}", "hint:".cyan(), suggestion);
    }
    if let Some(content) = &result.corrected_content {
        println!("\nCorrected content:\n{}", serde_json::to_string_pretty(content)?);
    }
    Ok(())
}

async fn cmd_columns(config: &Config, sheet_id: &str) -> Result<()> {
    debug!(%sheet_id, "cmd_columns: called");
    let store = LocalSheetStore::open(&config.sheet.store_dir).context("Failed to open sheet store")?;
    let data = store
        .get_full_sheet(sheet_id)
        .await
        .context(format!("Failed to read sheet '{}'", sheet_id))?;
    let Some(headers) = data.values.first() else {
        return Err(eyre!("Sheet '{}' has no header row", sheet_id));
    };

    let map = map_columns(headers.as_slice(), &config.sheet.protected_headers);
    let label = |column: Option<usize>| match column {
        Some(c) => format!("{} ({})", sheetstore::column_label(c), headers.get(c).map(String::as_str).unwrap_or("")),
        None => "missing".yellow().to_string(),
    };

    for (slot, column) in map.titles.iter().enumerate() {
        println!("Title {:>2}        {}", slot + 1, label(*column));
    }
    for (slot, column) in map.descriptions.iter().enumerate() {
        println!("Description {:>2}  {}", slot + 1, label(*column));
    }
    let protected: Vec<String> = map.protected.iter().map(|c| label(Some(*c))).collect();
    println!("Protected        {}", if protected.is_empty() { "-".to_string() } else { protected.join(", ") });

    let inputs = InputColumns::locate(headers.as_slice());
    println!("Campaign         {}", label(inputs.campaign));
    println!("Ad group         {}", label(inputs.ad_group));
    println!("Keywords         {}", label(inputs.keywords));
    if !map.is_complete() {
        println!(
            "\n{} missing columns are appended on the first generation",
            "Note:".cyan()
        );
    }
    Ok(())
}

async fn cmd_cache(config: &Config, command: CacheCommand) -> Result<()> {
    debug!(?command, "cmd_cache: called");
    let cache = CacheManager::new(&config.cache);
    match command {
        CacheCommand::Stats => {
            let stats = cache.stats().await;
            match &config.cache.durable_dir {
                Some(dir) => println!("Durable dir:      {}", dir.display()),
                None => println!("Durable dir:      (memory only)"),
            }
            match stats.durable_entries {
                Some(n) => println!("Durable entries:  {}", n),
                None => println!("Durable entries:  {}", "unavailable".red()),
            }
            println!("Enabled:          {}", config.cache.enabled);
        }
        CacheCommand::Clear => {
            cache.clear().await;
            println!("{} cache cleared", "✓".green());
        }
    }
    Ok(())
}

async fn cmd_clients(config: &Config) -> Result<()> {
    debug!("cmd_clients: called");
    let Some(directory) = load_directory(config)? else {
        println!("No client file configured (set clients.path in the config)");
        return Ok(());
    };
    let clients = directory.list().await;
    if clients.is_empty() {
        println!("No clients");
        return Ok(());
    }
    for client in clients {
        println!(
            "{:<16} {:<24} {}",
            client.id.bold(),
            client.name,
            client.industry.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
