use anyhow::Context;
use clap::{Parser, Subcommand};
use spec_registry::config::Config;
use spec_registry::error::{ErrorKind, RegistryError};
use spec_registry::types::{FetchQuery, SpecRecord, UploadedFile};
use spec_registry::{logging, metrics, server, ErrorResponse, Registry};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

const PREVIEW_CHARS: usize = 300;

#[derive(Parser)]
#[command(name = "spec-registry")]
#[command(about = "Registry for versioned OpenAPI/Schema specs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a new spec
    Upload {
        /// Path to a JSON or YAML spec file
        file: String,
    },
    /// Replace the content of an existing spec version
    Edit {
        /// Path to a JSON or YAML spec file
        file: String,
    },
    /// Get a spec by app name and optional version
    Get {
        app_name: String,
        /// Specific version to fetch (latest if omitted)
        #[arg(short = 'v', long = "spec-version")]
        spec_version: Option<String>,
    },
    /// List indexed specs
    List {
        /// Only rows for this app
        app_name: Option<String>,
    },
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Read a spec file for upload/edit. A path that cannot be read is reported
/// the same way as a request without a file.
fn read_upload(path: &str) -> Result<UploadedFile, ErrorResponse> {
    let bytes = std::fs::read(path).map_err(|e| {
        ErrorResponse::from_error(&RegistryError::step(
            ErrorKind::FileMissing,
            format!("File not found: {} ({})", path, e),
        ))
    })?;
    let original_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(UploadedFile::new(original_name, bytes))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_rows(rows: &[SpecRecord]) {
    if rows.is_empty() {
        println!("(no specs indexed)");
        return;
    }
    println!(
        "{:<6} {:<24} {:<12} {:<32} {}",
        "id", "app_name", "app_version", "file_path", "created_at"
    );
    for r in rows {
        println!(
            "{:<6} {:<24} {:<12} {:<32} {}",
            r.id,
            r.app_name,
            r.app_version,
            r.file_path,
            r.created_at.to_rfc3339()
        );
    }
}

fn failed(operation: &str, err: ErrorResponse) -> ExitCode {
    error!("{} failed: {}", operation, err);
    eprintln!("❌ {} failed: {} - {}", operation, err.error, err.details);
    ExitCode::FAILURE
}

fn run(cli: Cli, config: Config) -> anyhow::Result<ExitCode> {
    let registry = Registry::open(&config.storage).context("failed to open registry storage")?;

    match cli.command {
        Commands::Upload { file } => {
            let outcome = read_upload(&file).and_then(|f| registry.upload(Some(f)));
            match outcome {
                Ok(resp) => {
                    print_json(&resp)?;
                    println!("✅ Upload successful");
                }
                Err(e) => return Ok(failed("Upload", e)),
            }
        }
        Commands::Edit { file } => {
            let outcome = read_upload(&file).and_then(|f| registry.edit(Some(f)));
            match outcome {
                Ok(resp) => {
                    print_json(&resp)?;
                    println!("✅ Edit successful");
                }
                Err(e) => return Ok(failed("Edit", e)),
            }
        }
        Commands::Get { app_name, spec_version } => {
            match registry.get(FetchQuery::new(app_name, spec_version)) {
                Ok(result) => {
                    println!("App: {}", result.app_name);
                    println!("Version: {}", result.app_version);
                    println!("File: {}", result.file_path);
                    println!("Created: {}", result.created_at.to_rfc3339());
                    let preview: String = result.content.chars().take(PREVIEW_CHARS).collect();
                    println!("Content preview: {}", preview);
                }
                Err(e) => return Ok(failed("Get", e)),
            }
        }
        Commands::List { app_name } => match registry.list(app_name.as_deref()) {
            Ok(rows) => print_rows(&rows),
            Err(e) => return Ok(failed("List", e)),
        },
        Commands::Serve { port } => {
            let mut server_config = config.server.clone();
            if let Some(port) = port {
                server_config.port = port;
            }
            metrics::init_metrics();
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::start_server(Arc::new(registry), &server_config))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = logging::init_logging(&config.logging);

    match run(cli, config) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}
