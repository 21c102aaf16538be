//! Node resolution and cursor connections for a content graph
//!
//! Global ids and URIs resolve to [`node::Node`]s through batching
//! loaders, lists of nodes are exposed as relay style connections.
pub mod config;
pub mod connection;
pub mod context;
pub mod fallible;
pub mod graphql;
pub mod loader;
pub mod node;
pub mod store;
pub mod uri;

#[cfg(test)]
mod tests;
