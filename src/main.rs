mod cli;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use nf_core::config::Config;
use nf_library::{ItemKind, Library};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = Config::load_or_default(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting notflix");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("Collections configured: {}", config.collections.len());

    nf_server::start(config).await?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "notflix=trace,nf_server=trace,nf_library=debug,nf_core=debug,tower_http=debug"
                .to_string()
        } else {
            "notflix=info,nf_server=info,nf_library=info,nf_core=info,tower_http=info".to_string()
        }
    });

    // Logs go to stderr so `scan --json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Scan { json } => scan_library(cli.config.as_deref(), json),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("notflix {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn scan_library(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = Config::load_or_default(config_path)?;
    if config.collections.is_empty() {
        anyhow::bail!("No collections configured");
    }

    let started = std::time::Instant::now();
    let library = nf_library::scan(&config.collections);
    tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Scan finished");

    if json {
        println!("{}", serde_json::to_string_pretty(&scan_summary(&library))?);
        return Ok(());
    }

    for collection in library.collections() {
        let movies = collection
            .items
            .iter()
            .filter(|i| i.kind == ItemKind::Movie)
            .count();
        let shows = collection.items.len() - movies;
        let episodes: usize = collection
            .items
            .iter()
            .flat_map(|i| i.seasons.iter())
            .map(|s| s.episodes.len())
            .sum();
        println!(
            "{} ({}): {} movies, {} shows, {} episodes",
            collection.name,
            collection.directory.display(),
            movies,
            shows,
            episodes
        );
    }
    println!(
        "Total: {} items, {} episodes",
        library.item_count(),
        library.episode_count()
    );
    Ok(())
}

fn scan_summary(library: &Library) -> serde_json::Value {
    let collections: Vec<serde_json::Value> = library
        .collections()
        .iter()
        .map(|c| {
            serde_json::json!({
                "name": c.name,
                "id": c.source_id,
                "type": c.kind.collection_type(),
                "directory": c.directory,
                "items": c.items.iter().map(|i| serde_json::json!({
                    "id": i.id,
                    "name": i.name,
                    "year": i.year,
                    "seasons": i.seasons.len(),
                })).collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::json!({
        "collections": collections,
        "items": library.item_count(),
        "episodes": library.episode_count(),
    })
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            Config::load(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("Configuration loaded with {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  - {warning}");
        }
    }
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Collections: {}", config.collections.len());
    for c in &config.collections {
        println!(
            "    [{}] {} ({}) -> {}",
            c.id,
            c.name,
            c.kind.collection_type(),
            c.directory.display()
        );
    }
    println!("  Rescan interval: {}s", config.library.rescan_interval_secs);

    Ok(())
}
