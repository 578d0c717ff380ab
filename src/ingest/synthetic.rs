use crate::config::RunConfig;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;

/// Builds `total_city_instances` distinct names from at most
/// `unique_city_pool_size` seed names by suffixing `_<copy>`.
pub fn expand_city_names<R: Rng>(
    unique: &BTreeSet<String>,
    cfg: &RunConfig,
    rng: &mut R,
) -> BTreeSet<String> {
    let mut pool = unique.iter().collect::<Vec<&String>>();
    if pool.len() > cfg.unique_city_pool_size {
        pool.shuffle(rng);
        pool.truncate(cfg.unique_city_pool_size);
    }
    if pool.is_empty() {
        return BTreeSet::new();
    }

    let copies = cfg.total_city_instances.div_ceil(pool.len());
    let mut all = (0..copies)
        .flat_map(|copy| pool.iter().map(move |name| format!("{name}_{copy}")))
        .collect::<Vec<String>>();
    all.shuffle(rng);
    all.truncate(cfg.total_city_instances);
    all.into_iter().collect()
}
