// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Command-line front end.
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use mapgraph_core::{graph_digest_hex, ConfigService, Entity, Graph};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::fs_store::FsConfigStore;
use crate::script::{Report, Script};

/// mapgraph developer CLI.
#[derive(Parser, Debug)]
#[command(name = "mapgraph", version, about = "Replay map edit scripts and check graphs")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Config directory (defaults to the platform config dir).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Subcommand.
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay an edit script and report the final state
    Replay {
        /// Path to the script JSON
        script: PathBuf,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a graph file (JSON array of entities)
    Check {
        /// Path to the graph JSON
        graph: PathBuf,
    },
    /// Show the editor config, updating any given fields first
    Config {
        /// Undo depth (0 = unbounded)
        #[arg(long)]
        max_history: Option<usize>,
        /// Validate the graph on every commit
        #[arg(long)]
        validate_on_commit: Option<bool>,
        /// Log every editor change
        #[arg(long)]
        log_changes: Option<bool>,
    },
}

/// Parses arguments, installs logging and runs the chosen command.
pub fn entrypoint() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let service = ConfigService::new(config_store(cli.config.as_deref())?);
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Replay { script, json } => {
            let config = service
                .editor_config()
                .context("failed to load editor config")?;
            debug!(?config, "loaded config");
            let script: Script = read_json(&script)?;
            let report = script.replay(config)?;
            if json {
                serde_json::to_writer_pretty(&mut out, &report)?;
                writeln!(out)?;
            } else {
                write_report(&mut out, &report)?;
            }
        }
        Commands::Check { graph } => {
            let entities: Vec<Entity> = read_json(&graph)?;
            let graph = Graph::from_entities(entities);
            graph.validate().context("graph failed validation")?;
            writeln!(out, "ok {} entities {}", graph.len(), graph_digest_hex(&graph))?;
        }
        Commands::Config {
            max_history,
            validate_on_commit,
            log_changes,
        } => {
            let mut config = service
                .editor_config()
                .context("failed to load editor config")?;
            let changed =
                max_history.is_some() || validate_on_commit.is_some() || log_changes.is_some();
            if let Some(v) = max_history {
                config.max_history = v;
            }
            if let Some(v) = validate_on_commit {
                config.validate_on_commit = v;
            }
            if let Some(v) = log_changes {
                config.log_changes = v;
            }
            if changed {
                service
                    .save_editor_config(&config)
                    .context("failed to save editor config")?;
            }
            serde_json::to_writer_pretty(&mut out, &config)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

fn config_store(dir: Option<&Path>) -> Result<FsConfigStore> {
    match dir {
        Some(dir) => Ok(FsConfigStore::at(dir)),
        None => Ok(FsConfigStore::new()?),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn write_report(out: &mut impl Write, report: &Report) -> Result<()> {
    for line in &report.log {
        writeln!(out, "  {line}")?;
    }
    writeln!(out, "digest   {}", report.digest)?;
    writeln!(out, "entities {}", report.entities)?;
    writeln!(
        out,
        "history  {} of {} edits{}",
        report.cursor,
        report.edits.len(),
        if report.staging { " (+staged)" } else { "" }
    )?;
    for (i, annotation) in report.edits.iter().enumerate() {
        let marker = if i + 1 == report.cursor { '>' } else { ' ' };
        writeln!(out, " {marker} {}", annotation.as_deref().unwrap_or("(unnamed)"))?;
    }
    let diff = &report.difference;
    writeln!(
        out,
        "changes  {} created, {} modified, {} deleted",
        diff.created.len(),
        diff.modified.len(),
        diff.deleted.len()
    )?;
    if let Some(invalid) = &report.invalid {
        writeln!(out, "invalid  {invalid}")?;
    }
    if report.unsaved {
        writeln!(out, "unsaved")?;
    }
    Ok(())
}
