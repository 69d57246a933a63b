//! Command-line interface for `GeoBuild`, turning CSV tables into geoscience objects.
//!
//! This binary is a thin façade over the [`geobuild_core`] library: it parses
//! arguments, configures logging, wires a CSV table source and a local object
//! store, and delegates to the core operations.
//!
//! # Available Commands
//!
//! - `build` - Build an object from source tables and store it (or dry-run it)
//! - `preview` - Show the structure and first rows of a source table
//! - `schemas` - List the object types and the schemas they target
//! - `show` - Print a stored object

mod display;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing::{Level, debug, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use geobuild_core::error::ConfigError;
use geobuild_core::operations::{self, BuildRequest, BuildResponse};
use geobuild_core::schemas::get_object_schemas;
use geobuild_core::sources::CsvTableSource;
use geobuild_core::store::LocalObjectStore;
use geobuild_core::types::Crs;
use geobuild_core::{GeoBuildError, ObjectRef, ObjectType};

#[derive(Parser)]
#[command(
    name = "geobuild",
    version,
    about = "Build geoscience objects from tabular data",
    long_about = "GeoBuild turns CSV tables into pointsets, line segments, downhole collections\n\
                  and downhole intervals, reporting every dropped row as a validation message."
)]
/// Command-line arguments and options for the `GeoBuild` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `GeoBuild` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Builds an object from source tables.
    ///
    /// Table handles in --sources are resolved against --data-dir; the column
    /// mapping in --columns binds table columns to the roles of the object type.
    Build(BuildArgs),

    /// Shows the columns, inferred types and first rows of a source table.
    Preview {
        /// Path to the CSV file.
        #[arg(value_name = "FILE")]
        file: String,

        /// Number of rows to show.
        #[arg(long, default_value_t = 10)]
        max_rows: usize,

        /// Directory relative file paths are resolved against.
        #[arg(long, env = "GEOBUILD_DATA_DIR", value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Lists the object types that can be built and their schemas.
    Schemas,

    /// Prints a stored object as JSON.
    Show {
        /// Workspace the object belongs to.
        #[arg(long, value_name = "ID")]
        workspace: String,

        /// Object id.
        #[arg(long, value_name = "ID", required_unless_present = "path", conflicts_with = "path")]
        id: Option<String>,

        /// Object path.
        #[arg(long, value_name = "PATH")]
        path: Option<String>,

        /// Version to fetch; latest when omitted.
        #[arg(long, value_name = "VERSION")]
        version: Option<String>,

        /// Root directory of the local object store.
        #[arg(long, env = "GEOBUILD_STORE_DIR", default_value = ".geobuild", value_name = "DIR")]
        store_dir: PathBuf,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Object type to build (e.g. "pointset", "downhole-intervals").
    #[arg(long = "type", value_name = "TYPE")]
    object_type: ObjectType,

    /// Workspace the object is created in.
    #[arg(long, value_name = "ID")]
    workspace: String,

    /// Object path inside the workspace.
    #[arg(long, value_name = "OBJECT_PATH")]
    path: String,

    /// Object name.
    #[arg(long)]
    name: String,

    /// Source map as JSON, e.g. '{"points": "samples.csv"}'.
    #[arg(long, value_name = "JSON")]
    sources: String,

    /// Column mapping as JSON, e.g. '{"x": "EAST", "y": "NORTH", "z": "RL"}'.
    #[arg(long, value_name = "JSON")]
    columns: String,

    /// Free-text object description.
    #[arg(long, default_value = "")]
    description: String,

    /// Coordinate reference system, e.g. "EPSG:28350".
    #[arg(long, default_value = "unspecified")]
    crs: String,

    /// Validate and project without storing.
    #[arg(long)]
    dry_run: bool,

    /// Print the response as JSON.
    #[arg(long)]
    json: bool,

    /// Directory relative source paths are resolved against.
    #[arg(long, env = "GEOBUILD_DATA_DIR", value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Root directory of the local object store.
    #[arg(long, env = "GEOBUILD_STORE_DIR", default_value = ".geobuild", value_name = "DIR")]
    store_dir: PathBuf,
}

/// Entry point for the `GeoBuild` command-line interface.
///
/// # Errors
///
/// Returns an error if the logging system cannot be initialized. Command
/// failures are reported on stderr and turned into a non-zero exit code.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let outcome = match cli.command {
        Commands::Build(args) => handle_build(args).await,
        Commands::Preview {
            file,
            max_rows,
            data_dir,
        } => handle_preview(&file, max_rows, data_dir),
        Commands::Schemas => {
            handle_schemas();
            Ok(())
        },
        Commands::Show {
            workspace,
            id,
            path,
            version,
            store_dir,
        } => {
            let object = match (id, path) {
                (Some(id), _) => ObjectRef::Id(id),
                (None, Some(path)) => ObjectRef::Path(path),
                (None, None) => {
                    return Ok(report(&GeoBuildError::from(ConfigError::MissingRequired {
                        option: "--id or --path".to_string(),
                    })));
                },
            };
            handle_show(&workspace, &object, version.as_deref(), &store_dir).await
        },
    };

    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    })
}

/// Prints an error with its messages and suggestion to stderr.
fn report(err: &GeoBuildError) -> ExitCode {
    eprintln!("Error: {}", err.user_message());
    if let Some(messages) = err.messages().filter(|m| !m.is_empty()) {
        eprintln!("{}", display::messages_table(messages));
    }
    if let Some(suggestion) = err.recovery_suggestion() {
        eprintln!("\n{suggestion}");
    }
    ExitCode::FAILURE
}

fn parse_document(option: &str, raw: &str) -> geobuild_core::Result<Value> {
    serde_json::from_str(raw).map_err(|e| {
        ConfigError::InvalidOption {
            option: option.to_string(),
            message: format!("not valid JSON: {e}"),
        }
        .into()
    })
}

fn table_source(data_dir: Option<PathBuf>) -> CsvTableSource {
    match data_dir {
        Some(dir) => CsvTableSource::new().with_data_dir(dir),
        None => CsvTableSource::new(),
    }
}

/// Each workspace gets its own directory under the store root, named by its
/// canonical UUID.
fn workspace_store(store_dir: &Path, workspace: &str) -> geobuild_core::Result<LocalObjectStore> {
    let id = Uuid::parse_str(workspace).map_err(|e| ConfigError::InvalidOption {
        option: "--workspace".to_string(),
        message: format!("'{workspace}' is not a workspace UUID: {e}"),
    })?;
    Ok(LocalObjectStore::new(store_dir.join(id.hyphenated().to_string())))
}

async fn handle_build(args: BuildArgs) -> geobuild_core::Result<()> {
    let request = BuildRequest::new(args.object_type, &args.workspace, &args.path, &args.name)
        .with_sources(parse_document("--sources", &args.sources)?)
        .with_columns(parse_document("--columns", &args.columns)?)
        .with_description(args.description)
        .with_crs(Crs::parse(&args.crs))
        .with_dry_run(args.dry_run);

    info!("Building {} '{}'", request.object_type, request.name);
    debug!("Store root: {}", args.store_dir.display());

    let store = workspace_store(&args.store_dir, &args.workspace)?;
    let tables = table_source(args.data_dir);
    let response = operations::build_object(&request, &tables, &store).await?;

    if args.json {
        let json = serde_json::to_string_pretty(&response).map_err(anyhow::Error::from)?;
        println!("{json}");
        return Ok(());
    }

    match &response {
        BuildResponse::Validated {
            object_name,
            schema_id,
            ..
        } => {
            println!("\nValidated {object_name} (dry run, nothing stored)");
            println!("Schema: {schema_id}");
        },
        BuildResponse::Created {
            id,
            path,
            version_id,
            ..
        } => {
            println!("\nCreated {path}");
            println!("Object id: {id}");
            println!("Version: {version_id}");
        },
    }
    display::display_messages(response.messages());

    let errors = response.messages().count(geobuild_core::Severity::Error);
    if errors > 0 {
        warn!("Build finished with {errors} error message(s); some data was excluded");
    }
    Ok(())
}

fn handle_preview(file: &str, max_rows: usize, data_dir: Option<PathBuf>) -> geobuild_core::Result<()> {
    let tables = table_source(data_dir);
    let preview = operations::preview_table(&tables, file, max_rows)?;
    display::display_preview(&preview);
    Ok(())
}

/// Handles the `schemas` subcommand by displaying the schema registry.
fn handle_schemas() {
    let schemas = get_object_schemas();
    println!("\nObject Types ({} total):\n", schemas.len());
    println!("{}", display::schemas_table(&schemas));
}

async fn handle_show(
    workspace: &str,
    object: &ObjectRef,
    version: Option<&str>,
    store_dir: &Path,
) -> geobuild_core::Result<()> {
    let store = workspace_store(store_dir, workspace)?;
    let downloaded = operations::fetch_object(&store, object, version).await?;
    let json = serde_json::to_string_pretty(&downloaded).map_err(anyhow::Error::from)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document_rejects_bad_json() {
        let err = parse_document("--columns", "{x:").unwrap_err();
        assert!(matches!(
            err,
            GeoBuildError::Config(ConfigError::InvalidOption { ref option, .. }) if option == "--columns"
        ));
        assert!(err.is_recoverable());
    }

    const WORKSPACE: &str = "5f0c1c7e-8a4b-4c3e-9a61-2b7d0e4f9a10";

    #[test]
    fn test_workspace_store_is_scoped() {
        let store = workspace_store(Path::new("/tmp/store"), WORKSPACE).unwrap();
        assert_eq!(
            store.root(),
            Path::new("/tmp/store/5f0c1c7e-8a4b-4c3e-9a61-2b7d0e4f9a10")
        );

        // simple form is stored under the hyphenated name
        let store =
            workspace_store(Path::new("/tmp/store"), "5F0C1C7E8A4B4C3E9A612B7D0E4F9A10").unwrap();
        assert_eq!(store.root(), Path::new("/tmp/store").join(WORKSPACE));
    }

    #[test]
    fn test_workspace_store_rejects_paths() {
        for workspace in ["/etc/evil", "../../outside", "ws-1", "", "a/b"] {
            let err = workspace_store(Path::new("/tmp/store"), workspace).unwrap_err();
            assert!(
                matches!(
                    err,
                    GeoBuildError::Config(ConfigError::InvalidOption { ref option, .. }) if option == "--workspace"
                ),
                "{workspace}: {err:?}"
            );
        }
    }

    #[test]
    fn test_cli_parses_build() {
        let cli = Cli::try_parse_from([
            "geobuild",
            "build",
            "--type",
            "line_segments",
            "--workspace",
            "ws",
            "--path",
            "/faults.json",
            "--name",
            "faults",
            "--sources",
            "{}",
            "--columns",
            "{}",
            "--dry-run",
        ])
        .unwrap();
        let Commands::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.object_type, ObjectType::LineSegments);
        assert!(args.dry_run);
        assert_eq!(args.crs, "unspecified");
    }

    #[test]
    fn test_cli_rejects_unknown_type() {
        let result = Cli::try_parse_from([
            "geobuild", "build", "--type", "mesh", "--workspace", "ws", "--path", "/m", "--name",
            "m", "--sources", "{}", "--columns", "{}",
        ]);
        assert!(result.is_err());
    }
}
