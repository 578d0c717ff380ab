use crate::analysis::traversal::measure_neighbour_fetch;
use crate::config::{DanglingPolicy, RunConfig};
use crate::core::graph::GraphBuilder;
use crate::core::ids::CityCatalog;
use crate::core::redis_store::RedisStore;
use crate::core::store::{MemoryStore, Store};
use crate::ingest::seed::load_city_names;
use crate::ingest::synthetic::expand_city_names;
use anyhow::Context;
use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, info, warn};

pub mod analysis;
pub mod config;
pub mod core;
pub mod ingest;

/// Builds a random city-neighbour graph in a key-value store and times
/// neighbour lookups over it.
#[derive(Parser)]
#[command(name = "citygraph-bench", version)]
struct Cli {
    /// Line-delimited file of city names
    seed_file: PathBuf,
    /// Cities to create after suffixing copies of the seed names
    #[arg(long, default_value_t = RunConfig::default().total_city_instances)]
    total_cities: usize,
    /// Seed names used to generate the cities
    #[arg(long, default_value_t = RunConfig::default().unique_city_pool_size)]
    unique_cities: usize,
    /// Neighbours drawn per city
    #[arg(long, default_value_t = RunConfig::default().neighbour_degree)]
    degree: usize,
    /// Measurement passes over all cities
    #[arg(long, default_value_t = RunConfig::default().measurement_repeats)]
    repeats: usize,
    /// Write ops buffered before a pipeline sync
    #[arg(long, default_value_t = RunConfig::default().pipeline_flush_every)]
    flush_every: usize,
    /// RNG seed, random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Fail a pass on a neighbour id without a name instead of skipping it
    #[arg(long)]
    abort_on_dangling: bool,
    /// Redis server to benchmark, e.g. redis://127.0.0.1/; in-process store when omitted
    #[arg(long)]
    redis_url: Option<String>,
    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl From<&Cli> for RunConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            total_city_instances: cli.total_cities,
            unique_city_pool_size: cli.unique_cities,
            neighbour_degree: cli.degree,
            measurement_repeats: cli.repeats,
            pipeline_flush_every: cli.flush_every,
            seed: cli.seed,
            dangling_policy: if cli.abort_on_dangling {
                DanglingPolicy::Abort
            } else {
                DanglingPolicy::Skip
            },
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let cfg = RunConfig::from(&cli);
    match &cli.redis_url {
        Some(url) => {
            let store = RedisStore::open(url).context("connecting to redis")?;
            run(&cli.seed_file, &cfg, store)?;
        }
        None => {
            let store = run(&cli.seed_file, &cfg, MemoryStore::new())?;
            info!(round_trips = store.round_trips(), "in-process store done");
        }
    }
    Ok(())
}

/// Runs every phase against `store` and hands it back afterwards.
fn run<S: Store>(seed_file: &Path, cfg: &RunConfig, mut store: S) -> anyhow::Result<S> {
    let seed = cfg.seed.unwrap_or_else(rand::random);
    info!(seed, "starting run");
    let mut rng = StdRng::seed_from_u64(seed);

    let unique = load_city_names(seed_file)?;
    println!("Found {} cities in {}", unique.len(), seed_file.display());
    store.flush_all().context("flushing store")?;
    if unique.len() < cfg.unique_city_pool_size {
        warn!(
            found = unique.len(),
            wanted = cfg.unique_city_pool_size,
            "seed file has fewer names than the unique pool size"
        );
    }
    let names = expand_city_names(&unique, cfg, &mut rng);

    let mut catalog = CityCatalog::new(store, cfg.pipeline_flush_every);
    let started = Instant::now();
    let created = catalog
        .create_cities(&names)
        .context("creating cities")?;
    println!(
        "{} cities added in {} secs",
        created,
        started.elapsed().as_secs_f64()
    );

    let mut builder = GraphBuilder::new(cfg.neighbour_degree, rng)?;
    let started = Instant::now();
    let links = builder
        .link_cities(&mut catalog, &names)
        .context("linking cities")?;
    println!(
        "{} edges added in {} secs",
        links.links,
        started.elapsed().as_secs_f64()
    );
    info!(
        self_drops = links.self_drops,
        capped = links.capped,
        "graph built"
    );

    println!();
    println!("Fetching adjacent cities for all cities : ");
    for run in 1..=cfg.measurement_repeats {
        let m = measure_neighbour_fetch(&mut catalog, &names, cfg.dangling_policy)
            .with_context(|| format!("measurement run #{run}"))?;
        println!("Run #{} {}", run, m.summary);
        if m.dangling > 0 || m.unknown > 0 {
            warn!(
                run,
                dangling = m.dangling,
                unknown = m.unknown,
                "measurement saw inconsistent data"
            );
        }
    }

    Ok(catalog.into_store())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::CityId;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_full_run_on_memory_store() {
        let path = std::env::temp_dir().join(format!("citygraph-seed-{}.txt", std::process::id()));
        std::fs::write(&path, "Oslo\nLima\nBerlin\nLima\n").unwrap();
        let cfg = RunConfig {
            total_city_instances: 12,
            unique_city_pool_size: 3,
            neighbour_degree: 2,
            measurement_repeats: 2,
            seed: Some(42),
            ..Default::default()
        };

        let result = run(&path, &cfg, MemoryStore::new());
        std::fs::remove_file(&path).unwrap();
        let mut catalog = CityCatalog::new(result.unwrap(), 64);

        for id in 0..12 {
            let name = catalog.name_of(id).unwrap().unwrap();
            assert_eq!(Some(id), catalog.id_of(&name).unwrap());
        }
        assert_eq!(None, catalog.name_of(12).unwrap());

        let adj = (0..12 as CityId)
            .map(|id| (id, catalog.neighbour_ids(id).unwrap().into_iter().collect()))
            .collect::<HashMap<CityId, HashSet<CityId>>>();
        assert!(adj.values().any(|neighbours| !neighbours.is_empty()));
        for (id, neighbours) in &adj {
            assert!(neighbours.len() <= 2);
            assert!(!neighbours.contains(id));
            assert!(neighbours.iter().all(|n| adj[n].contains(id)));
        }
    }

    #[test]
    fn test_missing_seed_file_fails_before_writes() {
        let cfg = RunConfig {
            seed: Some(1),
            ..Default::default()
        };

        let err = run(Path::new("/nonexistent/seeds.txt"), &cfg, MemoryStore::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::core::error::BenchError>(),
            Some(crate::core::error::BenchError::MissingSeedData { .. })
        ));
    }
}
