use std::process;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};

use kickoff_cli::cli::{print_completions, Cli};
use kickoff_cli::logging::init_logging;
use kickoff_cli::prompt::DialoguerPrompt;
use kickoff_cli::reporter::ConsoleReporter;
use kickoff_core::{
    load_config, resolve_config_path, CommandInstaller, Greeting, PipelineConfig,
    ScaffoldUseCase, SourceFetcher,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(shell) = cli.completions {
        print_completions(shell);
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to resolve the current directory")?;

    let mut config = match resolve_config_path(cli.config.as_deref(), &cwd) {
        Some(path) => {
            if cli.config.is_some() && !path.is_file() {
                bail!("config file not found: {}", path.display());
            }
            debug!(path = %path.display(), "loading config");
            load_config(&path)?
        }
        None => Default::default(),
    };
    cli.apply_overrides(&mut config)?;

    let pipeline_config =
        PipelineConfig::from_config(&config, Greeting::new(env!("CARGO_PKG_VERSION")))?;
    info!(template = %pipeline_config.template, "starting");

    let preset = cli
        .preset_dir_name(&pipeline_config.default_dir_name)
        .map(str::to_string);

    let mut use_case = ScaffoldUseCase::new(
        pipeline_config,
        DialoguerPrompt::new(),
        SourceFetcher::new(),
        CommandInstaller::new(),
        ConsoleReporter::new(),
    );
    let report = use_case.run(&cwd, preset.as_deref())?;
    debug!(files = report.files.len(), "done");
    Ok(())
}
