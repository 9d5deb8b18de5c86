use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use sdrgen::config::Config;
use sdrgen::discovery::{self, DiscoveryInput};
use sdrgen::llm::{OpenAiClient, Usage};
use sdrgen::output::OutputWriter;
use sdrgen::prompt::{PromptKind, PromptSet};
use sdrgen::refine::{PipelineState, RefinementController, RegexScoreExtractor};

fn setup_logging(verbose: bool) -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sdrgen")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("sdrgen.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Generate {
            input,
            sample,
            output_dir,
            no_save,
        } => handle_generate_command(input.as_deref(), *sample, output_dir.as_deref(), *no_save, config).await,
        Commands::Sample => handle_sample_command(),
        Commands::Prompts { stage } => handle_prompts_command(*stage, config),
    }
}

async fn handle_generate_command(
    input: Option<&Path>,
    sample: bool,
    output_dir: Option<&Path>,
    no_save: bool,
    config: &Config,
) -> Result<()> {
    let discovery = match (input, sample) {
        (Some(path), _) => {
            DiscoveryInput::load(path).context(format!("Failed to load discovery input {}", path.display()))?
        }
        (None, true) => {
            info!("Using the built-in sample discovery record");
            discovery::sample_ecommerce()
        }
        (None, false) => bail!("Either --input or --sample is required"),
    };
    print_banner(&discovery, input);

    let openai_config = config
        .llm
        .openai_config(|name| std::env::var(name).ok())
        .context("Failed to configure the text generation service")?;
    let llm = Arc::new(OpenAiClient::new(openai_config).context("Failed to create LLM client")?);

    let prompts = load_prompts(config)?;
    let controller = RefinementController::new(Arc::clone(&llm), config.refinement_config())
        .context("Invalid refinement settings")?
        .with_prompts(prompts)
        .with_score_extractor(RegexScoreExtractor::new(config.refinement.default_score));

    println!("{}", "Running refinement pipeline...".cyan());
    let document = discovery.to_document().context("Failed to render discovery input")?;
    let state = match controller.run(document).await {
        Ok(state) => state,
        Err(e) => {
            if let Some(stage) = e.failed_stage() {
                eprintln!("{} {} stage, no document produced", "Failed at".red().bold(), stage);
            }
            return Err(e).context("BRD/SDR generation failed");
        }
    };

    print_summary(&state, llm.total_usage(), config.output.preview_chars);

    if no_save || !config.output.save {
        info!("Skipping output files");
        return Ok(());
    }

    let dir = output_dir.map(Path::to_path_buf).unwrap_or_else(|| config.output.dir.clone());
    let saved = OutputWriter::new(dir)
        .save(&discovery, &state)
        .context("Failed to save run artifacts")?;

    println!("\n{}", "Saved files:".green().bold());
    for path in saved.paths() {
        println!("  {}", path.display());
    }
    Ok(())
}

fn handle_sample_command() -> Result<()> {
    let sample = discovery::sample_ecommerce();
    println!("{}", sample.to_document().context("Failed to render sample")?);
    Ok(())
}

fn handle_prompts_command(stage: Option<PromptKind>, config: &Config) -> Result<()> {
    let prompts = load_prompts(config)?;
    let kinds: Vec<PromptKind> = match stage {
        Some(kind) => vec![kind],
        None => PromptKind::ALL.to_vec(),
    };

    for kind in kinds {
        let origin = if prompts.is_overridden(kind) { " (override)" } else { "" };
        println!("{}", format!("=== {}{} ===", kind, origin).cyan().bold());
        println!("{}\n", prompts.source(kind));
    }
    Ok(())
}

fn load_prompts(config: &Config) -> Result<PromptSet> {
    match &config.prompts_dir {
        Some(dir) => {
            PromptSet::with_overrides(dir).context(format!("Failed to load prompt overrides from {}", dir.display()))
        }
        None => PromptSet::builtin().context("Failed to load built-in prompts"),
    }
}

fn print_banner(discovery: &DiscoveryInput, input: Option<&Path>) {
    println!("{}", "BRD/SDR Generator".green().bold());
    match input {
        Some(path) => println!("{} {}", "Input:".green(), path.display()),
        None => println!("{} built-in sample", "Input:".green()),
    }
    if let Some(summary) = discovery.summary() {
        println!("{} {}", "Client:".green(), summary.company_name);
        println!("{} {}", "Industry:".green(), summary.industry);
        if !summary.platforms.is_empty() {
            println!("{} {}", "Platforms:".green(), summary.platforms.join(", "));
        }
    }
    println!();
}

fn print_summary(state: &PipelineState, usage: Usage, preview_chars: usize) {
    println!("\n{}", "Refinement complete".green().bold());

    let score = state.validation.score.to_string();
    println!("{} {}/10", "Quality score:".green(), score.bold());
    println!("{} {}", "Revisions:".green(), state.iteration_count);
    if state.was_revised() {
        println!("{}", "Final document is the revised draft".yellow());
    }
    println!(
        "{} {} in / {} out ({} total)",
        "Tokens:".green(),
        usage.input_tokens,
        usage.output_tokens,
        usage.total()
    );

    let output = state.output();
    println!("\n{}", "Preview:".cyan().bold());
    println!("{}", preview(output, preview_chars));
}

fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    setup_logging(cli.is_verbose()).context("Failed to setup logging")?;

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
