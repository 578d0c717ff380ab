use crate::core::error::{BenchError, Result};
use crate::core::ids::{CityCatalog, CityId, neighbours_key};
use crate::core::store::{Pipeline, Store};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Default, PartialEq)]
pub struct LinkStats {
    /// Bidirectional edges written, one per (city, candidate) pair.
    pub links: u64,
    /// Cities that drew themselves inside their shuffled prefix.
    pub self_drops: u64,
    /// Candidates dropped because one endpoint already had `degree` neighbours.
    pub capped: u64,
    /// Largest number of candidates selected by a single city.
    pub max_picked: usize,
}

pub struct GraphBuilder<R> {
    degree: usize,
    rng: R,
}

impl<R: Rng> GraphBuilder<R> {
    pub fn new(degree: usize, rng: R) -> Result<Self> {
        if degree == 0 {
            return Err(BenchError::InvalidDegree(degree));
        }
        Ok(Self { degree, rng })
    }

    /// Links every city to up to `degree` others. Each city shuffles the full
    /// pool and takes a prefix of `degree` names, dropping itself if present.
    /// A new edge is skipped when either endpoint already has `degree`
    /// neighbours, so on a flushed store no neighbour set exceeds `degree`.
    pub fn link_cities<S: Store>(
        &mut self,
        catalog: &mut CityCatalog<S>,
        names: &BTreeSet<String>,
    ) -> Result<LinkStats> {
        let mut pool = names.iter().map(String::as_str).collect::<Vec<&str>>();
        let mut pipe = Pipeline::new(catalog.flush_every());
        let mut adjacent: HashMap<CityId, HashSet<CityId>> = HashMap::new();
        let mut stats = LinkStats::default();

        for city in names {
            let city_id = resolve(catalog, city)?;
            let (candidates, dropped) = self.pick_candidates(&mut pool, city);
            if dropped {
                stats.self_drops += 1;
            }
            stats.max_picked = stats.max_picked.max(candidates.len());

            for neighbour in candidates {
                let neighbour_id = resolve(catalog, neighbour)?;
                if !self.admit(&mut adjacent, city_id, neighbour_id) {
                    stats.capped += 1;
                    continue;
                }
                pipe.set_add(neighbours_key(city_id), neighbour_id.to_string())
                    .set_add(neighbours_key(neighbour_id), city_id.to_string());
                pipe.sync_if_due(catalog.store_mut())?;
                stats.links += 1;
            }
        }
        pipe.sync(catalog.store_mut())?;

        debug!(
            links = stats.links,
            self_drops = stats.self_drops,
            capped = stats.capped,
            syncs = pipe.syncs(),
            "cities linked"
        );
        Ok(stats)
    }

    fn pick_candidates<'a>(&mut self, pool: &mut [&'a str], city: &str) -> (Vec<&'a str>, bool) {
        pool.shuffle(&mut self.rng);
        let mut prefix = pool[..self.degree.min(pool.len())].to_vec();
        match prefix.iter().position(|name| *name == city) {
            Some(pos) => {
                prefix.remove(pos);
                (prefix, true)
            }
            None => (prefix, false),
        }
    }

    /// Records the edge `a - b` unless it is new and would push either
    /// endpoint past `degree`. An already recorded edge is always admitted.
    fn admit(&self, adjacent: &mut HashMap<CityId, HashSet<CityId>>, a: CityId, b: CityId) -> bool {
        let degree_of = |id: CityId| adjacent.get(&id).map_or(0, HashSet::len);
        let known = adjacent.get(&a).is_some_and(|set| set.contains(&b));
        if !known && (degree_of(a) >= self.degree || degree_of(b) >= self.degree) {
            return false;
        }
        adjacent.entry(a).or_default().insert(b);
        adjacent.entry(b).or_default().insert(a);
        true
    }
}

fn resolve<S: Store>(catalog: &mut CityCatalog<S>, name: &str) -> Result<CityId> {
    catalog
        .id_of(name)?
        .ok_or_else(|| BenchError::UnknownCity(name.to_string()))
}
