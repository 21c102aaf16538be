//! The content store contract
//!
//! The resolution layer never talks to a database itself. Everything it
//! needs from the outside world goes through [`ContentStore`]: fetching
//! entities by id in batches, running ordered queries and deciding whether
//! the current viewer may read an entity.
use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::node::{EntityKind, Node};

mod memory;
mod query;
mod registry;

pub use memory::{MemoryStore, Seed};
pub use query::*;
pub use registry::{FrontPage, ReadingSettings, Registry};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("the content store is unavailable: {0}")]
    Unavailable(String),
    #[error("the store cannot run a {0} query with {1} criteria")]
    MismatchedCriteria(EntityKind, &'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Content types, taxonomies, roles and reading settings. Read-only.
    fn registry(&self) -> &Registry;

    /// Gets every entity of ``kind`` whose native id is in ``ids``.
    /// Ids without an entity are left out of the result.
    async fn get_many(&self, kind: EntityKind, ids: &[String]) -> StoreResult<Vec<Node>>;

    /// Runs an ordered query, see [`StoreQuery`] for the exact semantics.
    async fn query(&self, query: &StoreQuery) -> StoreResult<Vec<Node>>;

    /// Whether ``viewer`` may see ``node`` at all. Denied nodes are treated
    /// exactly like missing ones.
    fn can_read(&self, viewer: &Viewer, node: &Node) -> bool;
}

/// The identity the request is resolved for
///
/// How a viewer is authenticated is none of this crate's business; it is
/// handed over fully formed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<i64>,
    pub capabilities: BTreeSet<String>,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user<I, S>(user_id: i64, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id: Some(user_id),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
        }
    }

    pub fn can(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is(&self, user_id: Option<i64>) -> bool {
        self.user_id.is_some() && self.user_id == user_id
    }
}
