//! gingen CLI entrypoint.
//! Parses command-line arguments and dispatches to the core generator.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use gingen_core::{parse_gin_template, resolve, CodeGenerator, Error};

#[derive(Parser)]
#[command(name = "gingen")]
#[command(version, about = "Generate Kratos Gin API code from .gin templates")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate API code from a .gin template file
    Gen {
        /// Path to the .gin template file
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
        /// Service implementation output directory (forces service generation)
        #[arg(short = 's', long = "service")]
        service: Option<String>,
        /// Middleware implementation output directory (forces middleware generation)
        #[arg(short = 'm', long = "middleware")]
        middleware: Option<String>,
    },
    /// Create a new .gin template file with an example service
    New {
        /// Name of the service the template describes
        name: String,
        /// Output path: a directory, or a .gin file path
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Gen {
            file,
            service,
            middleware,
        } => run_gen(file, service, middleware).await,
        Commands::New { name, output } => run_new(&name, output).await,
    }
}

async fn run_gen(
    file: PathBuf,
    service: Option<String>,
    middleware: Option<String>,
) -> anyhow::Result<()> {
    if !file.exists() {
        return Err(Error::NotFound(file).into());
    }

    let content = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read template file {}", file.display()))?;
    let mut template = parse_gin_template(&content)
        .with_context(|| format!("failed to parse template file {}", file.display()))?;

    // Explicit output directories on the command line force generation on,
    // overriding the in-file options.
    if let Some(dir) = service {
        template.options.generate_service = true;
        template.options.service_output_dir = dir;
    }
    if let Some(dir) = middleware {
        template.options.generate_middleware = true;
        template.options.middleware_output_dir = dir;
    }

    let cwd = std::env::current_dir()?;
    let paths = resolve(&template.options, &cwd);
    let generator = CodeGenerator::new(&template, paths.clone())?;
    generator.generate().await?;

    println!(
        "generated API code in {} (package {})",
        paths.output_dir.display(),
        paths.package_name
    );
    Ok(())
}

async fn run_new(name: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let path = gingen_core::scaffold::create_template(name, output.as_deref(), &cwd)
        .await
        .context("failed to create template file")?;
    println!("created template file: {}", path.display());
    Ok(())
}
