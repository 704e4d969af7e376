//! cachectl - run the memoization scenarios against a chosen backend

mod github;
mod scenarios;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use cacheable::backend::{backend_type_name, StatsSnapshot};
use cacheable::{get_backend, set_backend, CacheConfig, MemoryBackend};
use cacheable_lru::LruBackend;
use clap::Parser;
use tracing::info;

use crate::scenarios::Scenario;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend name (memory, null, lru); overrides config and CACHEABLE_BACKEND
    #[arg(short, long)]
    backend: Option<String>,

    /// LRU capacity (number of entries)
    #[arg(short, long, default_value_t = cacheable_lru::DEFAULT_CAPACITY)]
    capacity: usize,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print backend statistics after the run
    #[arg(long)]
    stats: bool,

    #[command(subcommand)]
    scenario: Scenario,
}

/// Config file, then environment, then command line
fn resolve_config(args: &Args) -> Result<CacheConfig> {
    let config = match &args.config {
        Some(path) => CacheConfig::load(path)?,
        None => CacheConfig::default(),
    };

    let mut config = config.with_env_overrides();
    if let Some(backend) = &args.backend {
        config.backend = backend.clone();
    }
    Ok(config)
}

type StatsProbe = Box<dyn Fn() -> StatsSnapshot>;

/// Held by tests that swap the process-wide backend or depend on its contents
#[cfg(test)]
static BACKEND_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

/// Install the configured backend; keeps a handle on stores that count
fn select_backend(config: &CacheConfig, capacity: usize) -> Result<Option<StatsProbe>> {
    cacheable_lru::install(capacity);

    let probe: Option<StatsProbe> = match backend_type_name(&config.backend).as_str() {
        "MemoryBackend" => {
            let backend = Arc::new(MemoryBackend::new());
            set_backend(Arc::clone(&backend))?;
            Some(Box::new(move || backend.stats().snapshot()))
        }
        "LruBackend" => {
            let backend = Arc::new(LruBackend::new(capacity));
            set_backend(Arc::clone(&backend))?;
            Some(Box::new(move || backend.stats().snapshot()))
        }
        _ => {
            config.apply_backend()?;
            None
        }
    };
    Ok(probe)
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    info!("Starting cachectl v{}", env!("CARGO_PKG_VERSION"));
    let probe = select_backend(&config, args.capacity)?;
    info!("Backend: {}", get_backend().name());

    let requests = args.scenario.run(&config)?;
    println!("\nRequests to GitHub: {}", requests);

    if args.stats {
        match probe {
            Some(probe) => println!("{}", serde_json::to_string_pretty(&probe())?),
            None => println!("Backend `{}` keeps no statistics", get_backend().name()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["cachectl", "--backend", "lru", "-c", "8", "custom-key"]);
        assert_eq!(args.backend.as_deref(), Some("lru"));
        assert_eq!(args.capacity, 8);
        assert_eq!(args.scenario, Scenario::CustomKey);
    }

    #[test]
    fn test_command_line_backend_wins_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"backend": "null"}}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::parse_from(["cachectl", "--config", &path, "--backend", "lru", "simple"]);
        assert_eq!(resolve_config(&args).unwrap().backend, "lru");
    }

    #[test]
    fn test_config_file_is_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"methods": {{"star_count": {{"cache_options": {{"expires_in": 60}}}}}}}}"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::parse_from(["cachectl", "--config", &path, "--backend", "memory", "all"]);
        let config = resolve_config(&args).unwrap();
        assert!(config.methods.contains_key("star_count"));
    }

    #[test]
    fn test_backend_names_are_normalized() {
        let _guard = BACKEND_LOCK.lock();
        for name in ["lru", "LRU", "Lru"] {
            let config = CacheConfig {
                backend: name.to_string(),
                ..CacheConfig::default()
            };
            let probe = select_backend(&config, 4).unwrap();
            assert!(probe.is_some(), "{name} should keep statistics");
            assert_eq!(get_backend().name(), "lru");
        }

        let config = CacheConfig {
            backend: "MEMORY".to_string(),
            ..CacheConfig::default()
        };
        assert!(select_backend(&config, 4).unwrap().is_some());
        assert_eq!(get_backend().name(), "memory");
    }
}
