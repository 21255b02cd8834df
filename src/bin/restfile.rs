//! `restfile` command-line entry point.
//!
//! ```text
//! restfile check api.http      # print diagnostics, exit 1 on errors
//! restfile order api.http      # print the dependency-first execution order
//! restfile run api.http        # execute every request in order
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use clap::{Parser, Subcommand};
use restfile::config::{load_config, EngineConfig};
use restfile::executor::{ChainExecutor, ReqwestTransport};
use restfile::graph::execution_order;
use restfile::models::HttpFile;
use restfile::parser::parse_with_config;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON settings document with a "restfile" section
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a file and report its diagnostics
    Check { path: PathBuf },
    /// Print the order requests would run in
    Order { path: PathBuf },
    /// Execute every request of a file, dependencies first
    Run { path: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let config = read_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { path } => {
            let file = read_file(&path, &config)?;
            for diagnostic in &file.diagnostics {
                println!("{}:{}", path.display(), diagnostic);
            }
            println!(
                "{} request(s), {} error(s), {} warning(s)",
                file.requests.len(),
                file.errors().count(),
                file.warnings().count()
            );
            Ok(if file.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Order { path } => {
            let file = read_file(&path, &config)?;
            for (position, index) in execution_order(&file)?.into_iter().enumerate() {
                let request = &file.requests[index];
                println!(
                    "{}. {} (line {})",
                    position + 1,
                    request.display_name(),
                    request.line_number
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run { path } => {
            let file = read_file(&path, &config)?;
            if file.has_errors() {
                for diagnostic in file.errors() {
                    eprintln!("{}:{}", path.display(), diagnostic);
                }
            }

            let transport = ReqwestTransport::new(&config)?;
            let mut executor = ChainExecutor::with_config(transport, &config);
            for (index, response) in executor.run_file(&file)? {
                let request = &file.requests[index];
                println!("{} -> {}", request.display_name(), response.status_code);
                let body = response.body_text();
                if !body.is_empty() {
                    println!("{}\n", body);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn read_config(path: Option<&Path>) -> Result<EngineConfig, Box<dyn Error>> {
    let settings = match path {
        Some(path) => Some(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => None,
    };
    Ok(load_config(settings)?)
}

fn read_file(path: &Path, config: &EngineConfig) -> Result<HttpFile, Box<dyn Error>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_with_config(&content, path, config)?)
}
