//! The Multicorn request checker CLI.
//!
//! Provides the `multicornc` command with the following subcommands:
//!
//! - `multicornc check <request.json>` - Infer and print the result type of a request
//! - `multicornc print <request.json>` - Print a request as an s-expression
//!
//! Options:
//! - `--schema` - Storage schema (default: `multicorn.toml` if present)
//! - `--node` - Type the sub-request at a node path such as `$.1.0`
//! - `--json` - Output the type and diagnostics as JSON (one object per line)
//! - `--no-color` - Disable colorized output
//! - `--log-level` - Log verbosity on stderr (default: warn)

mod config;

use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

use multicorn_requests::printer::print;
use multicorn_requests::{NodePath, Request, RequestBuilder, Taxonomy};
use multicorn_typeck::diagnostics::{render_diagnostic, DiagnosticOptions};
use multicorn_typeck::WrapperRegistry;

use crate::config::Config;

const DEFAULT_SCHEMA: &str = "multicorn.toml";

#[derive(Parser)]
#[command(name = "multicornc", version, about = "The Multicorn request checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level for messages on stderr (off, error, warn, info, debug, trace)
    #[arg(long = "log-level", global = true, default_value = "warn")]
    log_level: LevelFilter,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer the result type of a request
    Check {
        /// Path to the request, in JSON form
        request: PathBuf,

        /// Storage schema declaring stored collections and extension operators
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Type the sub-request at this node path (e.g. `$.1.0`) instead of the root
        #[arg(long)]
        node: Option<NodePath>,

        /// Output the type and diagnostics as JSON instead of human-readable format
        #[arg(long)]
        json: bool,

        /// Disable colorized output
        #[arg(long = "no-color")]
        no_color: bool,
    },
    /// Print a request as an s-expression
    Print {
        /// Path to the request, in JSON form
        request: PathBuf,

        /// Storage schema declaring stored collections and extension operators
        #[arg(long)]
        schema: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    match cli.command {
        Commands::Check {
            request,
            schema,
            node,
            json,
            no_color,
        } => {
            let diag_opts = DiagnosticOptions {
                color: !no_color && !json,
                json,
            };
            match check(&request, schema.as_deref(), node.as_ref(), &diag_opts) {
                Ok(true) => {}
                Ok(false) => process::exit(1),
                Err(e) => {
                    if json {
                        let msg = serde_json::json!({
                            "code": "C0001",
                            "severity": "error",
                            "message": e,
                            "file": request.display().to_string(),
                            "spans": [],
                            "fix": null
                        });
                        eprintln!("{}", msg);
                    } else {
                        eprintln!("error: {}", e);
                    }
                    process::exit(1);
                }
            }
        }
        Commands::Print { request, schema } => match load(&request, schema.as_deref()) {
            Ok((request, _)) => println!("{}", print(&request).text),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
    }
}

fn setup_logging(level: LevelFilter) {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Blue)
        .debug(Color::Magenta)
        .trace(Color::Green);
    let dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{}: {}",
                colors.color(record.level()).to_string().to_lowercase(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply();
    if let Err(e) = dispatch {
        eprintln!("warning: logging disabled: {}", e);
    }
}

/// Load the schema and build the request.
///
/// Without `--schema`, `multicorn.toml` in the working directory is used
/// when it exists.
fn load(request: &Path, schema: Option<&Path>) -> Result<(Request, Taxonomy), String> {
    let config = match schema {
        Some(path) => Config::from_file(path)?,
        None if Path::new(DEFAULT_SCHEMA).exists() => Config::from_file(Path::new(DEFAULT_SCHEMA))?,
        None => {
            log::info!("no schema given and no {} found; no storages declared", DEFAULT_SCHEMA);
            Config::default()
        }
    };
    let taxonomy = config.taxonomy()?;
    let catalog = config.catalog();
    log::debug!("schema declares storages {:?}", catalog.names());

    let text = std::fs::read_to_string(request)
        .map_err(|e| format!("Failed to read '{}': {}", request.display(), e))?;
    let built = RequestBuilder::new(&taxonomy, &catalog)
        .build_json(&text)
        .map_err(|e| format!("{}: {}", request.display(), e))?;
    Ok((built, taxonomy))
}

/// Type-check the request and report the result.
///
/// Returns `Ok(false)` when the request fails to type; the diagnostic has
/// already been printed.
fn check(
    path: &Path,
    schema: Option<&Path>,
    node: Option<&NodePath>,
    diag_opts: &DiagnosticOptions,
) -> Result<bool, String> {
    let (request, taxonomy) = load(path, schema)?;
    let registry = WrapperRegistry::with_taxonomy(taxonomy);
    let node = node.cloned().unwrap_or_else(NodePath::root);

    match registry.infer_at(&request, &node) {
        Ok(Some(ty)) => {
            if diag_opts.json {
                let out = serde_json::json!({
                    "file": path.display().to_string(),
                    "path": node.to_string(),
                    "type": ty.to_string(),
                });
                println!("{}", out);
            } else {
                println!("{}", ty);
            }
            Ok(true)
        }
        Ok(None) => Err(format!("no node at {} in '{}'", node, path.display())),
        Err(error) => {
            let file_name = path.display().to_string();
            let rendered = render_diagnostic(&error, &request, &file_name, diag_opts);
            if diag_opts.json {
                eprintln!("{}", rendered);
            } else {
                eprint!("{}", rendered);
            }
            Ok(false)
        }
    }
}
