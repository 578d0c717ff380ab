use crate::analysis::stats::{StatisticalSummary, Statistics};
use crate::config::DanglingPolicy;
use crate::core::error::{BenchError, Result};
use crate::core::ids::CityCatalog;
use crate::core::store::Store;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Measurement {
    pub summary: StatisticalSummary,
    /// Neighbour ids skipped because they had no name mapping.
    pub dangling: u64,
    /// Input names without an id mapping.
    pub unknown: u64,
}

#[derive(Debug, Default, PartialEq)]
pub struct NeighbourLookup {
    pub names: Vec<String>,
    pub dangling: u64,
    pub known: bool,
}

/// One timed unit of work: id lookup, neighbour-set fetch and one id->name
/// lookup per neighbour.
pub fn neighbour_names<S: Store>(
    catalog: &mut CityCatalog<S>,
    city: &str,
    policy: DanglingPolicy,
) -> Result<NeighbourLookup> {
    let Some(city_id) = catalog.id_of(city)? else {
        return Ok(NeighbourLookup::default());
    };

    let mut lookup = NeighbourLookup {
        known: true,
        ..Default::default()
    };
    for id in catalog.neighbour_ids(city_id)? {
        match (catalog.name_of(id)?, policy) {
            (Some(name), _) => lookup.names.push(name),
            (None, DanglingPolicy::Skip) => {
                warn!(city, id, "skipping dangling neighbour reference");
                lookup.dangling += 1;
            }
            (None, DanglingPolicy::Abort) => {
                return Err(BenchError::DanglingReference {
                    city: city.to_string(),
                    id,
                });
            }
        }
    }
    Ok(lookup)
}

/// Times [`neighbour_names`] for every city. Each call is independent and
/// yields its own summary.
pub fn measure_neighbour_fetch<S: Store>(
    catalog: &mut CityCatalog<S>,
    names: &BTreeSet<String>,
    policy: DanglingPolicy,
) -> Result<Measurement> {
    let mut stats = Statistics::with_capacity(names.len());
    let mut dangling = 0;
    let mut unknown = 0;

    for city in names {
        let started = Instant::now();
        let lookup = neighbour_names(catalog, city, policy)?;
        stats.record(started.elapsed());

        dangling += lookup.dangling;
        if !lookup.known {
            unknown += 1;
        }
    }

    debug!(samples = stats.len(), dangling, unknown, "measurement pass done");
    let summary = stats.summary().ok_or(BenchError::EmptyCitySet)?;
    Ok(Measurement {
        summary,
        dangling,
        unknown,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::GraphBuilder;
    use crate::core::ids::neighbours_key;
    use crate::core::store::{MemoryStore, StoreError};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn five_cities() -> BTreeSet<String> {
        ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn linked_catalog(names: &BTreeSet<String>, degree: usize) -> CityCatalog<MemoryStore> {
        let mut catalog = CityCatalog::new(MemoryStore::new(), 8);
        catalog.create_cities(names).unwrap();
        GraphBuilder::new(degree, StdRng::seed_from_u64(21))
            .unwrap()
            .link_cities(&mut catalog, names)
            .unwrap();
        catalog
    }

    fn snapshot(
        catalog: &mut CityCatalog<MemoryStore>,
        names: &BTreeSet<String>,
    ) -> HashMap<String, BTreeSet<String>> {
        names
            .iter()
            .map(|city| {
                let lookup = neighbour_names(catalog, city, DanglingPolicy::Abort).unwrap();
                (city.clone(), lookup.names.into_iter().collect())
            })
            .collect()
    }

    #[test]
    fn test_five_city_measurement() {
        let names = five_cities();
        let mut catalog = linked_catalog(&names, 2);

        let m = measure_neighbour_fetch(&mut catalog, &names, DanglingPolicy::Skip).unwrap();
        assert_eq!(5, m.summary.count);
        assert_eq!(0, m.dangling);
        assert_eq!(0, m.unknown);
        for v in [m.summary.min, m.summary.mean, m.summary.max, m.summary.median] {
            assert!(v.is_finite());
            assert!(v >= 0.0);
        }
        assert!(m.summary.min <= m.summary.median);
        assert!(m.summary.median <= m.summary.max);
    }

    #[test]
    fn test_neighbour_names_resolve_symmetrically() {
        let names = five_cities();
        let mut catalog = linked_catalog(&names, 2);
        let adj = snapshot(&mut catalog, &names);

        for (city, neighbours) in &adj {
            assert!(!neighbours.contains(city));
            for n in neighbours {
                assert!(adj[n].contains(city));
            }
        }
    }

    #[test]
    fn test_repeated_reads_are_stable() {
        let names = five_cities();
        let mut catalog = linked_catalog(&names, 3);

        let before = snapshot(&mut catalog, &names);
        for _ in 0..3 {
            measure_neighbour_fetch(&mut catalog, &names, DanglingPolicy::Skip).unwrap();
        }
        assert_eq!(before, snapshot(&mut catalog, &names));
    }

    #[test]
    fn test_dangling_reference_skipped() {
        let names = five_cities();
        let mut catalog = linked_catalog(&names, 2);
        catalog.store_mut().set_add(&neighbours_key(0), "99").unwrap();

        let lookup = neighbour_names(&mut catalog, "A", DanglingPolicy::Skip).unwrap();
        assert_eq!(1, lookup.dangling);
        assert!(lookup.known);

        let m = measure_neighbour_fetch(&mut catalog, &names, DanglingPolicy::Skip).unwrap();
        assert_eq!(1, m.dangling);
        assert_eq!(5, m.summary.count);
    }

    #[test]
    fn test_dangling_reference_aborts() {
        let names = five_cities();
        let mut catalog = linked_catalog(&names, 2);
        catalog.store_mut().set_add(&neighbours_key(0), "99").unwrap();

        assert!(matches!(
            measure_neighbour_fetch(&mut catalog, &names, DanglingPolicy::Abort),
            Err(BenchError::DanglingReference { id: 99, .. })
        ));
    }

    #[test]
    fn test_unknown_city_still_sampled() {
        let names = five_cities();
        let mut catalog = linked_catalog(&names, 2);
        let mut query = names.clone();
        query.insert("Z".to_string());

        let m = measure_neighbour_fetch(&mut catalog, &query, DanglingPolicy::Skip).unwrap();
        assert_eq!(6, m.summary.count);
        assert_eq!(1, m.unknown);
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut catalog = CityCatalog::new(MemoryStore::new(), 8);

        assert!(matches!(
            measure_neighbour_fetch(&mut catalog, &BTreeSet::new(), DanglingPolicy::Skip),
            Err(BenchError::EmptyCitySet)
        ));
    }

    #[test]
    fn test_store_failure_propagates() {
        let names = five_cities();
        let mut catalog = linked_catalog(&names, 2);
        catalog.store_mut().disconnect();

        assert!(matches!(
            measure_neighbour_fetch(&mut catalog, &names, DanglingPolicy::Skip),
            Err(BenchError::Store(StoreError::Unavailable(_)))
        ));
    }
}
