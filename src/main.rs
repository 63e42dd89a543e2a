use anyhow::{Context, Result};
use api_impact::compat::registry;
use api_impact::{
    AnalysisOptions, AnalysisQuery, ChangeKind, ClientSpec, JsonDiffProvider, JsonModelProvider,
    LibraryVersion,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "api-impact")]
#[command(about = "Find the client code broken by a library upgrade")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct LibraryArgs {
    #[arg(long, help = "Coordinates of the old library version")]
    old: String,
    #[arg(long, help = "Coordinates of the new library version")]
    new: String,
    #[arg(long, help = "JSON file with the raw API diff between the two versions")]
    diff: PathBuf,
    #[arg(long, help = "Model root of the old library version")]
    library: PathBuf,
    #[arg(long, help = "Old library sources used to locate changes")]
    library_sources: Option<PathBuf>,
    #[arg(long, help = "YAML configuration file")]
    config: Option<PathBuf>,
    #[arg(long, help = "Output format", value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Parser)]
enum Commands {
    #[command(about = "List the breaking changes between two library versions")]
    Delta {
        #[command(flatten)]
        library: LibraryArgs,
    },
    #[command(about = "Find broken uses of the breaking changes in client projects")]
    Impact {
        #[command(flatten)]
        library: LibraryArgs,
        #[arg(
            long = "client",
            required = true,
            help = "Client source root, optionally prefixed with an id (id=path)"
        )]
        clients: Vec<String>,
        #[arg(long, help = "Clients analyzed in parallel")]
        workers: Option<usize>,
    },
    #[command(about = "List change kinds and whether broken uses are detected for them")]
    Kinds {
        #[arg(long, help = "Output format", value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Delta { library } => {
            let query = build_query(&library, Vec::new(), None)?;
            let diff = JsonDiffProvider::new(&library.diff);
            let delta = api_impact::build_delta(&query, &diff, &JsonModelProvider)
                .context("Failed to build delta")?;

            match library.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&delta)?);
                }
                OutputFormat::Text => {
                    if delta.is_empty() {
                        println!("No breaking changes between {} and {}.", delta.old, delta.new);
                    } else {
                        println!("Breaking changes between {} and {}:", delta.old, delta.new);
                        for change in delta.changes() {
                            println!("  {change}");
                            if let Some(origin) = change.origin() {
                                println!("    Declared at: {origin}");
                            }
                        }
                        println!();
                        println!("Summary:");
                        for (kind, count) in delta.summary() {
                            println!("  {kind}: {count}");
                        }
                    }
                    if !delta.skipped().is_empty() {
                        println!("Skipped entries: {}", delta.skipped().len());
                    }
                }
            }
        }
        Commands::Impact {
            library,
            clients,
            workers,
        } => {
            let clients = clients
                .iter()
                .map(|arg| parse_client(arg))
                .collect::<Vec<_>>();
            let query = build_query(&library, clients, workers)?;
            let diff = JsonDiffProvider::new(&library.diff);
            let result = api_impact::analyze(&query, &diff, Arc::new(JsonModelProvider))
                .context("Impact analysis failed")?;

            match library.format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{} breaking changes between {} and {}",
                        result.delta.changes().len(),
                        result.delta.old,
                        result.delta.new
                    );
                    for impact in result.impacts.values() {
                        if let Some(failure) = &impact.failure {
                            println!("[{}] analysis failed: {failure}", impact.client);
                            continue;
                        }
                        if !impact.is_broken() {
                            println!("[{}] not impacted", impact.client);
                            continue;
                        }
                        println!("[{}] {} broken uses:", impact.client, impact.broken_uses.len());
                        for broken in &impact.broken_uses {
                            println!("  {broken}");
                        }
                    }
                    println!();
                    println!("Summary:");
                    println!("  Clients analyzed: {}", result.impacts.len());
                    println!("  Clients broken: {}", result.broken_clients().len());
                    if !result.failed_clients().is_empty() {
                        println!(
                            "  Clients failed: {} ({})",
                            result.failed_clients().len(),
                            result.failed_clients().join(", ")
                        );
                    }
                }
            }

            if !result.broken_clients().is_empty() {
                std::process::exit(1);
            }
        }
        Commands::Kinds { format } => match format {
            OutputFormat::Json => {
                let kinds: Vec<_> = ChangeKind::all()
                    .iter()
                    .map(|kind| {
                        serde_json::json!({
                            "kind": kind,
                            "levels": kind.levels().iter().map(|l| l.to_string()).collect::<Vec<_>>(),
                            "detected": registry::is_supported(*kind),
                            "excluded_by_default": ChangeKind::default_excluded().contains(kind),
                            "description": kind.description(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&kinds)?);
            }
            OutputFormat::Text => {
                for kind in ChangeKind::all() {
                    let levels: Vec<_> = kind.levels().iter().map(|l| l.to_string()).collect();
                    let detected = if registry::is_supported(*kind) { "detected" } else { "-" };
                    println!("{:<50} {:<30} {:<9} {}", kind.id(), levels.join(","), detected, kind.description());
                }
                println!();
                println!(
                    "{} kinds, {} with broken-use detection",
                    ChangeKind::all().len(),
                    registry::supported_kinds().len()
                );
            }
        },
    }

    Ok(())
}

fn build_query(args: &LibraryArgs, clients: Vec<ClientSpec>, workers: Option<usize>) -> Result<AnalysisQuery> {
    let mut options = match &args.config {
        Some(path) => AnalysisOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?,
        None => AnalysisOptions::default(),
    };
    if let Some(workers) = workers {
        options = options.with_workers(workers);
    }

    let mut builder = AnalysisQuery::builder()
        .old(LibraryVersion::new(&args.old).with_artifact(&args.library))
        .new_version(LibraryVersion::new(&args.new))
        .library(&args.library)
        .clients(clients)
        .options(options);
    if let Some(sources) = &args.library_sources {
        builder = builder.library_sources(sources);
    }
    builder.build().context("Invalid analysis query")
}

/// `id=path`, or a bare path whose directory name is the id.
fn parse_client(arg: &str) -> ClientSpec {
    match arg.split_once('=') {
        Some((id, path)) => ClientSpec::new(id, path),
        None => {
            let path = Path::new(arg);
            let id = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| arg.to_string());
            ClientSpec::new(id, path)
        }
    }
}
