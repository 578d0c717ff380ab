pub mod stats;
pub mod traversal;
