//! Per request batching loaders
//!
//! Every [`LoaderKey`] gets one [`EntityLoader`] wrapped in a
//! [`DataLoader`](async_graphql::dataloader::DataLoader). Loads issued in the
//! same batch window are coalesced into a single
//! [`ContentStore::get_many`] call and every result, including ``None``, is
//! cached for the rest of the request.
use std::{collections::HashMap, sync::Arc};

use async_graphql::dataloader::Loader;
use futures::future::BoxFuture;
use log::{debug, warn};

use crate::{
    fallible::ResolveResult,
    node::Node,
    store::{ContentStore, StoreError, Viewer},
};

pub use crate::node::EntityKind as LoaderKey;

/// A lazily evaluated lookup. It resolves to ``None`` when the entity does
/// not exist or the viewer may not see it.
pub type Deferred<'a, T = Node> = BoxFuture<'a, ResolveResult<Option<T>>>;

pub struct EntityLoader {
    kind: LoaderKey,
    store: Arc<dyn ContentStore>,
    viewer: Arc<Viewer>,
}

impl EntityLoader {
    pub fn new(kind: LoaderKey, store: Arc<dyn ContentStore>, viewer: Arc<Viewer>) -> Self {
        Self {
            kind,
            store,
            viewer,
        }
    }
}

impl Loader<String> for EntityLoader {
    type Value = Option<Node>;
    type Error = Arc<StoreError>;

    async fn load(&self, keys: &[String]) -> Result<HashMap<String, Self::Value>, Self::Error> {
        debug!("Loading {} {} node(s) in one batch", keys.len(), self.kind);

        let nodes = self.store.get_many(self.kind, keys).await.map_err(|e| {
            warn!("Loading {} nodes failed: {}", self.kind, e);
            Arc::new(e)
        })?;

        // absent and denied ids are cached as well
        let mut values: HashMap<String, Option<Node>> =
            keys.iter().map(|key| (key.clone(), None)).collect();
        for node in nodes {
            if node.kind() == self.kind && self.store.can_read(&self.viewer, &node) {
                values.insert(node.key(), Some(node));
            }
        }
        Ok(values)
    }
}
