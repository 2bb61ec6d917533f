use crate::manifest::ApiManifest;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::swagger_generator::SwaggerProvider;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// Swagger Generator - Generate Swagger 2.0 documents from an API manifest
#[derive(Parser, Debug)]
#[command(name = "swagger-gen")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the API manifest (YAML or JSON)
    #[arg(value_name = "MANIFEST")]
    pub manifest_path: PathBuf,

    /// Document to generate (defaults to the first declared document)
    #[arg(short = 'd', long = "document", value_name = "NAME")]
    pub document: Option<String>,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Rust source directory to harvest types and doc comments from (repeatable)
    #[arg(long = "types-dir", value_name = "DIR")]
    pub types_dirs: Vec<PathBuf>,

    /// Doc-comments file (YAML or JSON), used instead of the manifest's
    #[arg(long = "comments", value_name = "FILE")]
    pub comments: Option<PathBuf>,

    /// Host written to the document
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Base path written to the document
    #[arg(long = "base-path")]
    pub base_path: Option<String>,

    /// Transfer protocol written to the document (repeatable)
    #[arg(long = "scheme", value_name = "SCHEME")]
    pub schemes: Vec<String>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.manifest_path.is_file() {
        anyhow::bail!(
            "Manifest does not exist: {}",
            args.manifest_path.display()
        );
    }

    for dir in &args.types_dirs {
        if !dir.is_dir() {
            anyhow::bail!("Types directory is not a directory: {}", dir.display());
        }
    }

    info!("Manifest: {}", args.manifest_path.display());
    info!("Output format: {:?}", args.output_format);
    match &args.output_path {
        Some(output) => info!("Output file: {}", output.display()),
        None => info!("Output: stdout"),
    }

    Ok(args)
}

/// Generate the requested document and return it serialized
pub fn generate(args: &CliArgs) -> Result<String> {
    let mut manifest = ApiManifest::load(&args.manifest_path)
        .with_context(|| format!("Failed to load manifest {}", args.manifest_path.display()))?;

    // Command-line sources come after the manifest's own and are not resolved against it
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    manifest
        .types_dirs
        .extend(args.types_dirs.iter().map(|dir| cwd.join(dir)));
    if let Some(comments) = &args.comments {
        manifest.comments = Some(cwd.join(comments));
    }

    let document_name = match &args.document {
        Some(name) => name.clone(),
        None => manifest
            .documents
            .keys()
            .next()
            .cloned()
            .context("The manifest declares no documents")?,
    };

    let inputs = manifest.into_inputs()?;
    info!(
        "Loaded {} operations and {} types",
        inputs.operations.len(),
        inputs.catalog.len()
    );

    let provider = inputs
        .options
        .create_swagger_provider(inputs.operations, inputs.catalog)?;

    info!("Generating document {}", document_name);
    let schemes = (!args.schemes.is_empty()).then_some(args.schemes.as_slice());
    let document = provider
        .get_swagger(
            &document_name,
            args.host.as_deref(),
            args.base_path.as_deref(),
            schemes,
        )
        .with_context(|| format!("Failed to generate document {}", document_name))?;

    match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document),
        OutputFormat::Json => serialize_json(&document),
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting Swagger document generation...");
    let content = generate(&args)?;

    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
        info!("Successfully wrote Swagger document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}
