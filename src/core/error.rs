use crate::core::ids::CityId;
use crate::core::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no seed data in {}: {reason}", path.display())]
    MissingSeedData { path: PathBuf, reason: String },

    #[error("neighbour id {id} of city {city:?} has no name mapping")]
    DanglingReference { city: String, id: CityId },

    #[error("city {0:?} has no id mapping")]
    UnknownCity(String),

    #[error("value {value:?} under key {key:?} is not a city id")]
    InvalidId { key: String, value: String },

    #[error("{0} cities exceed the city id space")]
    TooManyCities(usize),

    #[error("city set is empty")]
    EmptyCitySet,

    #[error("neighbour degree must be at least 1, got {0}")]
    InvalidDegree(usize),
}

pub type Result<T> = std::result::Result<T, BenchError>;
