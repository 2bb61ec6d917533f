//! Swagger Generator - command-line tool for generating Swagger 2.0 documents.
//!
//! Reads an API manifest (documents, options, types and operations), optionally harvests
//! types and `///` comments from Rust sources, and prints or writes the requested document.
//!
//! # Usage
//!
//! ```bash
//! swagger-gen [OPTIONS] <MANIFEST>
//! ```
//!
//! # Examples
//!
//! Generate the first declared document as YAML:
//! ```bash
//! swagger-gen api.yaml -o swagger.yaml
//! ```
//!
//! Generate document `v2` as JSON, with types harvested from sources:
//! ```bash
//! swagger-gen api.yaml -d v2 -f json --types-dir src -o swagger.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use swagger_gen::cli;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("Swagger Generator starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Swagger document generation completed successfully");

    Ok(())
}
