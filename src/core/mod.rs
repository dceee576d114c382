pub mod engine;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod graph;
pub mod library;
pub mod map;
pub mod paths;
pub mod store;
pub mod tracker;
pub mod validate;
