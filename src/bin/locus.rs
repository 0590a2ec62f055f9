//! locus CLI
//!
//! Runs one query from the command line and prints the answer on stdout.
//! An empty answer (`{}` or `[]`) is still a successful run.

// Exclude from coverage - CLI binary tested via integration tests
#![cfg_attr(tarpaulin, ignore)]

use anyhow::Context;
use clap::Parser;
use locus::{Query, QueryConfig, QueryEngine, TreeSitterBackend};
use std::path::PathBuf;

fn parse_query(name: &str) -> Result<Query, String> {
    Query::from_name(&name.replace('-', "_")).ok_or_else(|| {
        let known: Vec<&str> = Query::ALL.iter().map(Query::name).collect();
        format!("unknown query '{}' (expected one of: {})", name, known.join(", "))
    })
}

/// Answer a question about the C or C++ code at a location
#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(version = locus::VERSION)]
#[command(about = "Cursor-position queries over C and C++ sources")]
#[command(after_help = "EXAMPLES:
  # Name of the function enclosing line 13
  locus current_function_at 'src/a.cpp:-std=c++17:13:1'

  # Same question against an unsaved buffer
  locus current-function-at 'src/a.cpp#/tmp/a.cpp.swp:-std=c++17:13:1'

  # Breadcrumb chain, with resolution logs
  locus all_extents 'src/a.cpp::20:9' --log-level debug
")]
struct Cli {
    /// Query to run, e.g. current_function_at, all_extents, type_at
    #[arg(value_name = "QUERY", value_parser = parse_query)]
    query: Query,

    /// Location as path[#unsaved]:flags:line:col
    #[arg(value_name = "LOCATION")]
    location: String,

    /// Config file path (default: ./.locus_config.json, then the user config dir)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level or filter for stderr (default: RUST_LOG, else warn)
    #[arg(long = "log-level", value_name = "LEVEL")]
    log_level: Option<String>,

    /// Disable colored log output
    #[arg(long = "no-color")]
    no_color: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    locus::logging::init_logger(cli.log_level.as_deref(), cli.no_color)
        .context("installing log subscriber")?;

    let config = QueryConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let engine = QueryEngine::with_config(TreeSitterBackend::new(), config);

    println!("{}", engine.run_spec(cli.query, &cli.location));
    Ok(())
}
