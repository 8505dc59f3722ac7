//! Routescribe CLI - endpoint documentation from Go sources.

use anyhow::Context;
use clap::Parser;
use routescribe::report::render_summary;
use routescribe::{DuplicateStrategy, ReportFormat, RouteConfig, Routescribe};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "routescribe")]
#[command(version)]
#[command(about = "Document the HTTP endpoints of a Go web server from its source code", long_about = None)]
struct Cli {
    /// Directory (or single .go file) to analyze
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// What to do with duplicate endpoints: keep_first, replace_new or merge
    #[arg(short, long)]
    strategy: Option<DuplicateStrategy>,

    /// Only scan the top-level directory
    #[arg(long)]
    no_recursive: bool,

    /// Also scan _test.go files
    #[arg(long)]
    include_tests: bool,

    /// Skip files larger than this many bytes
    #[arg(long)]
    max_file_size: Option<u64>,

    /// Parser threads (0 = one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Inspect a server running on localhost at this port for response shapes
    #[arg(long, value_name = "PORT")]
    inspect_server: Option<u16>,

    /// Report format: markdown, json or summary
    #[arg(short, long, default_value = "markdown")]
    format: ReportFormat,

    /// Output file (markdown defaults to apidocs.md, other formats to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the report to stdout even for markdown
    #[arg(long, conflicts_with = "output")]
    stdout: bool,

    /// Config file (default: <DIRECTORY>/routescribe.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "routescribe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<RouteConfig> {
    let mut config = match &cli.config {
        Some(path) => RouteConfig::try_load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RouteConfig::for_directory(&cli.directory),
    };

    if let Some(strategy) = cli.strategy {
        config.resolve.duplicate_strategy = strategy;
    }
    if cli.no_recursive {
        config.scan.recursive = false;
    }
    if cli.include_tests {
        config.scan.include_tests = true;
    }
    if let Some(size) = cli.max_file_size {
        config.scan.max_file_size = size;
    }
    if let Some(threads) = cli.threads {
        config.scan.threads = threads;
    }
    if let Some(port) = cli.inspect_server {
        config.inspect.port = Some(port);
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let scribe = Routescribe::new(&cli.directory, config);

    let analysis = scribe
        .analyze()
        .with_context(|| format!("analyzing {}", cli.directory.display()))?;
    let rendered = scribe.render(&analysis, cli.format)?;

    let output = if cli.stdout {
        None
    } else {
        cli.output
            .clone()
            .or_else(|| cli.format.default_output().map(PathBuf::from))
    };

    match output {
        Some(path) => {
            fs::write(&path, rendered)
                .with_context(|| format!("writing {}", path.display()))?;
            print!("{}", render_summary(&analysis));
            println!("✓ Wrote {} report to {}", cli.format, path.display());
        }
        None => print!("{}", rendered),
    }

    Ok(())
}
