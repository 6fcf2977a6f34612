//! `cheap-research`: interactive research assistant.
//!
//! Loads (or creates) the per-user configuration, builds the agent team and runs
//! the prompt loop on stdin/stdout.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use research::agents::backend::ChatCompletionsBackend;
use research::agents::team::{TeamBuilder, api_key_from_env};
use research::exit_codes;
use research::io::compiler::compiler_available;
use research::io::config::ConfigStore;
use research::io::fetch::WebFetcher;
use research::io::templates::TemplateStore;
use research::io::workspace::Workspace;
use research::repl::{run_repl, write_banner};

#[derive(Debug, Parser)]
#[command(
    name = "cheap-research",
    version,
    about = "Terminal research assistant driven by cooperating LLM agents"
)]
struct Cli {
    /// Configuration file to use instead of the per-user default.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More diagnostics on stderr (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    research::logging::init(cli.verbose);
    match run(&cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => ConfigStore::default_path()?,
    };
    let existed = path.exists();
    let config = ConfigStore::open(path.clone())
        .with_context(|| format!("load configuration {}", path.display()))?;

    if !existed {
        println!("Created default configuration at {}", config.path().display());
    }
    for key in config.added_keys() {
        println!("Added missing configuration key: {key}");
    }

    let settings = config.settings();
    if !settings.initialized {
        println!(
            "Please edit the configuration file at {} (set your models and API keys, then \
             initialized = true) and run the program again.",
            config.path().display()
        );
        return Ok(exit_codes::NOT_INITIALIZED);
    }

    let workspace = Workspace::current()?;
    let save_dir = &settings.file_saving.default_directory;
    let save_path = workspace
        .guard(save_dir)
        .with_context(|| format!("default save directory {save_dir}"))?;
    if !save_path.exists() {
        fs::create_dir_all(&save_path)
            .with_context(|| format!("create default save directory {}", save_path.display()))?;
        println!("Created default save directory: {save_dir}");
    }

    if !compiler_available(&settings.latex.compiler) {
        warn!(compiler = %settings.latex.compiler, "LaTeX compiler not found on PATH");
        println!(
            "Warning: '{}' was not found; compile_latex will fail until a TeX distribution is \
             installed.",
            settings.latex.compiler
        );
    }

    let templates = TemplateStore::from_config(&config);
    let fetcher = WebFetcher::new(&settings.web)?;
    let backend = Rc::new(ChatCompletionsBackend::new(&settings.llm)?);
    info!(endpoint = backend.endpoint(), "chat backend ready");

    let mut orchestrator = TeamBuilder::new(settings, &workspace, &templates, &fetcher, backend)
        .fallback_api_key(api_key_from_env(&settings.llm))
        .build()
        .context("build research team")?;

    let mut stdout = io::stdout();
    let shown_save_dir = settings.file_saving.enabled.then_some(save_dir.as_str());
    write_banner(&mut stdout, shown_save_dir)?;
    run_repl(io::stdin().lock(), &mut stdout, &mut orchestrator)?;
    Ok(exit_codes::OK)
}
