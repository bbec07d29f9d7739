//! sqlcell: the migration pipeline CLI
//!
//! # Usage
//!
//! ```bash
//! # Split and classify a SQL file offline
//! sqlcell split model_output.sql
//!
//! # Same, as a notebook
//! sqlcell split model_output.sql --format notebook -o out.ipynb
//!
//! # Full pipeline: analyze → transpile → rewrite → upload
//! sqlcell --config sqlcell.toml run
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use sqlcell::completion::ChatClient;
use sqlcell::config::Config;
use sqlcell::databricks::DatabricksCli;
use sqlcell::notebook::Notebook;
use sqlcell::rewrite::{RewriteReport, Rewriter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlcell")]
#[command(version)]
#[command(about = "Segment, classify and package migrated SQL into notebooks", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlcell split rewritten.sql
    cat reply.txt | sqlcell split --format units
    sqlcell --config sqlcell.toml rewrite --catalog main --schema sales
    sqlcell upload ./transpiled --workspace-dir /Users/me/project")]
struct Cli {
    /// Config file (default: ./sqlcell.toml, then the user config dir)
    #[arg(short, long, global = true, env = "SQLCELL_CONFIG")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SplitFormat {
    /// One document, blocks separated by a blank line
    Flat,
    /// JSON array of content units
    Units,
    /// nbformat v4 notebook JSON
    Notebook,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize, segment and classify SQL from a file or stdin
    Split {
        /// Input file (stdin if omitted)
        file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "flat")]
        format: SplitFormat,

        /// Write to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the lakebridge analyzer
    Analyze,
    /// Run the lakebridge transpiler
    Transpile {
        #[command(flatten)]
        target: TargetArgs,

        /// Skip checking that the catalog and schema exist
        #[arg(long)]
        no_verify: bool,
    },
    /// Rewrite table references with the language model and write notebooks
    Rewrite {
        #[command(flatten)]
        target: TargetArgs,

        /// Directory of transpiled .sql files
        #[arg(long)]
        transpiled_dir: Option<PathBuf>,

        /// Directory for the generated .sql and .ipynb files
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Model name
        #[arg(long)]
        model: Option<String>,
    },
    /// Import files into the workspace
    Upload {
        /// Local file or directory
        source: Option<PathBuf>,

        /// Workspace directory, e.g. /Users/me/project
        #[arg(long)]
        workspace_dir: Option<String>,
    },
    /// Analyze, transpile, rewrite and upload in sequence
    Run {
        #[command(flatten)]
        target: TargetArgs,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Default catalog for unqualified tables
    #[arg(long)]
    catalog: Option<String>,

    /// Default schema for unqualified tables
    #[arg(long)]
    schema: Option<String>,
}

impl TargetArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(catalog) = &self.catalog {
            config.target.catalog = catalog.clone();
        }
        if let Some(schema) = &self.schema {
            config.target.schema = schema.clone();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sqlcell=debug" } else { "sqlcell=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Split {
        file,
        format,
        output,
    } = &cli.command
    {
        return split(file.as_ref(), *format, output.as_ref());
    }

    let mut config = Config::discover(cli.config.as_deref()).context("Failed to load config")?;
    let databricks = DatabricksCli::new(&config.databricks);

    match cli.command {
        Commands::Split { .. } => unreachable!(), // Handled above
        Commands::Analyze => analyze(&databricks, &config).await,
        Commands::Transpile { target, no_verify } => {
            target.apply(&mut config);
            transpile(&databricks, &config, !no_verify).await
        }
        Commands::Rewrite {
            target,
            transpiled_dir,
            output_dir,
            model,
        } => {
            target.apply(&mut config);
            if let Some(dir) = transpiled_dir {
                config.rewrite.transpiled_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.rewrite.output_dir = dir;
            }
            if let Some(model) = model {
                config.rewrite.model = model;
            }
            rewrite(&config).await.map(|_| ())
        }
        Commands::Upload {
            source,
            workspace_dir,
        } => {
            if let Some(source) = source {
                config.upload.source_path = source;
            }
            if let Some(dir) = workspace_dir {
                config.upload.workspace_dir = dir;
            }
            upload(&databricks, &config).await
        }
        Commands::Run { target } => {
            target.apply(&mut config);
            analyze(&databricks, &config).await?;
            transpile(&databricks, &config, true).await?;
            rewrite(&config).await?;
            upload(&databricks, &config).await
        }
    }
}

fn split(file: Option<&PathBuf>, format: SplitFormat, output: Option<&PathBuf>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let artifact = sqlcell::process(&raw);
    let rendered = match format {
        SplitFormat::Flat => artifact.to_document(),
        SplitFormat::Units => serde_json::to_string_pretty(artifact.units())? + "\n",
        SplitFormat::Notebook => Notebook::from(&artifact).to_json()?,
    };

    match output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
            println!(
                "{} Wrote {} unit(s) to {}",
                "✓".green(),
                artifact.units().len(),
                path.display().to_string().cyan()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

async fn analyze(databricks: &DatabricksCli, config: &Config) -> Result<()> {
    config.validate_analyzer()?;
    println!("{}", "Running analyzer...".cyan().bold());
    databricks.analyze(&config.analyzer).await?;
    println!(
        "{} Report generated at {}",
        "✓".green(),
        config.analyzer.report_file.cyan()
    );
    Ok(())
}

async fn transpile(databricks: &DatabricksCli, config: &Config, verify: bool) -> Result<()> {
    config.validate_transpiler()?;
    if verify {
        databricks.verify_target(&config.target).await?;
        databricks.verify_warehouse(&config.transpiler.warehouse).await?;
    }
    println!("{}", "Running transpiler...".cyan().bold());
    databricks.transpile(&config.transpiler, &config.target).await?;
    println!(
        "{} Output generated at {}",
        "✓".green(),
        config.transpiler.output_folder.cyan()
    );
    Ok(())
}

async fn rewrite(config: &Config) -> Result<RewriteReport> {
    config.validate_rewrite()?;
    let client = ChatClient::from_config(&config.rewrite)?;
    let report = Rewriter::new(&config.rewrite, &config.target, client)
        .run()
        .await?;

    for written in &report.written {
        println!(
            "{} {} → {}",
            "✓".green(),
            written.source.white(),
            written.notebook.display().to_string().cyan()
        );
    }
    for (name, error) in &report.failed {
        println!("{} {}: {}", "✗".red(), name.white(), error.red());
    }
    println!(
        "{} file(s) written, {} failed",
        report.written.len().to_string().green(),
        report.failed.len().to_string().red()
    );
    Ok(report)
}

async fn upload(databricks: &DatabricksCli, config: &Config) -> Result<()> {
    config.validate_upload()?;
    let imported = sqlcell::upload::upload(databricks, &config.upload).await?;
    for path in &imported {
        println!("  {} {}", "•".dimmed(), path.white());
    }
    println!(
        "{} Imported {} file(s)",
        "✓".green(),
        imported.len().to_string().cyan()
    );
    Ok(())
}
