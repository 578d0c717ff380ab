pub mod error;
pub mod graph;
pub mod ids;
pub mod redis_store;
pub mod store;
