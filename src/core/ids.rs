use crate::core::error::{BenchError, Result};
use crate::core::store::{Pipeline, Store};
use std::collections::BTreeSet;
use tracing::debug;

pub type CityId = u32;

pub fn name_key(id: CityId) -> String {
    format!("city_name:{id}")
}

pub fn id_key(name: &str) -> String {
    format!("city_id:{name}")
}

pub fn neighbours_key(id: CityId) -> String {
    format!("neighbours:{id}")
}

fn parse_id(key: String, value: String) -> Result<CityId> {
    value
        .parse::<CityId>()
        .map_err(|_| BenchError::InvalidId { key, value })
}

/// Every one of `count` cities needs a distinct `CityId`.
fn check_id_space(count: usize) -> Result<()> {
    match count.checked_sub(1).map(CityId::try_from) {
        Some(Err(_)) => Err(BenchError::TooManyCities(count)),
        _ => Ok(()),
    }
}

/// Name <-> id mapping persisted in the store. Owns the store handle so the
/// graph builder and the traversal benchmark reach it through one place.
pub struct CityCatalog<S> {
    store: S,
    flush_every: usize,
}

impl<S: Store> CityCatalog<S> {
    pub fn new(store: S, flush_every: usize) -> Self {
        Self {
            store,
            flush_every: flush_every.max(1),
        }
    }

    /// Assigns ids `0..names.len()` in set order and writes both mapping
    /// directions through a pipeline. Returns once every write is synced.
    pub fn create_cities(&mut self, names: &BTreeSet<String>) -> Result<usize> {
        if names.is_empty() {
            return Err(BenchError::EmptyCitySet);
        }
        check_id_space(names.len())?;

        let mut pipe = Pipeline::new(self.flush_every);
        for (id, name) in (0..=CityId::MAX).zip(names) {
            pipe.set(name_key(id), name.as_str())
                .set(id_key(name), id.to_string());
            pipe.sync_if_due(&mut self.store)?;
        }
        pipe.sync(&mut self.store)?;

        debug!(cities = names.len(), syncs = pipe.syncs(), "cities created");
        Ok(names.len())
    }

    pub fn id_of(&mut self, name: &str) -> Result<Option<CityId>> {
        let key = id_key(name);
        match self.store.get(&key)? {
            Some(value) => parse_id(key, value).map(Some),
            None => Ok(None),
        }
    }

    pub fn name_of(&mut self, id: CityId) -> Result<Option<String>> {
        Ok(self.store.get(&name_key(id))?)
    }

    pub fn neighbour_ids(&mut self, id: CityId) -> Result<Vec<CityId>> {
        let key = neighbours_key(id);
        self.store
            .set_members(&key)?
            .into_iter()
            .map(|member| parse_id(key.clone(), member))
            .collect()
    }

    pub fn flush_every(&self) -> usize {
        self.flush_every
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
