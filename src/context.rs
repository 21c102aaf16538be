//! The per request context
//!
//! A [`RequestContext`] is built for every graphql request and attached to
//! the request data. It owns the loaders, so caches never leak from one
//! request into the next.
use std::{collections::HashMap, sync::Arc};

use async_graphql::dataloader::{DataLoader, HashMapCache};
use futures::future::FutureExt;
use log::warn;

use crate::{
    config::{ConnectionSettings, LoaderSettings},
    fallible::ResolveResult,
    loader::{Deferred, EntityLoader, LoaderKey},
    node::{Node, NodeTypeResolver},
    store::{ContentStore, Registry, StoreQuery, Viewer},
};

pub type NodeLoader = DataLoader<EntityLoader, HashMapCache>;

pub struct RequestContext {
    store: Arc<dyn ContentStore>,
    viewer: Arc<Viewer>,
    loaders: HashMap<LoaderKey, NodeLoader>,
    connections: ConnectionSettings,
    node_types: Arc<NodeTypeResolver>,
}

impl RequestContext {
    pub fn new(
        store: Arc<dyn ContentStore>,
        viewer: Viewer,
        node_types: Arc<NodeTypeResolver>,
        connections: ConnectionSettings,
        batching: LoaderSettings,
    ) -> Self {
        let viewer = Arc::new(viewer);
        let loaders = LoaderKey::ALL
            .iter()
            .map(|&key| {
                let loader = DataLoader::with_cache(
                    EntityLoader::new(key, store.clone(), viewer.clone()),
                    tokio::spawn,
                    HashMapCache::default(),
                )
                .delay(batching.batch_delay())
                .max_batch_size(batching.max_batch_size);
                (key, loader)
            })
            .collect();

        Self {
            store,
            viewer,
            loaders,
            connections,
            node_types,
        }
    }

    pub fn registry(&self) -> &Registry {
        self.store.registry()
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn node_types(&self) -> &NodeTypeResolver {
        &self.node_types
    }

    pub fn limits(&self) -> &ConnectionSettings {
        &self.connections
    }

    pub fn can_read(&self, node: &Node) -> bool {
        self.store.can_read(&self.viewer, node)
    }

    /// Queues ``id`` on the loader of ``key``. Nothing is fetched until the
    /// returned future is polled.
    pub fn load_deferred(&self, key: LoaderKey, id: impl Into<String>) -> Deferred<'_> {
        let id = key.canonical_id(&id.into());
        let loader = self.loaders.get(&key);
        async move {
            match loader {
                Some(loader) => Ok(loader.load_one(id).await?.flatten()),
                None => Ok(None),
            }
        }
        .boxed()
    }

    /// Fetches one entity straight from the store, skipping the viewer's
    /// read check and the loader cache
    pub async fn get_unchecked(&self, key: LoaderKey, id: &str) -> ResolveResult<Option<Node>> {
        let id = key.canonical_id(id);
        let nodes = self
            .store
            .get_many(key, std::slice::from_ref(&id))
            .await
            .map_err(|e| {
                warn!("Loading {} {} failed: {}", key, id, e);
                e
            })?;
        Ok(nodes.into_iter().find(|node| node.kind() == key))
    }

    /// Puts nodes fetched by a query into the cache of the ``key`` loader
    pub async fn prime(&self, key: LoaderKey, nodes: &[Node]) {
        if let Some(loader) = self.loaders.get(&key) {
            loader
                .feed_many(
                    nodes
                        .iter()
                        .filter(|node| node.kind() == key)
                        .map(|node| (node.key(), Some(node.clone()))),
                )
                .await;
        }
    }

    /// Runs an ordered query. Access control is left to the caller.
    pub async fn query(&self, query: &StoreQuery) -> ResolveResult<Vec<Node>> {
        self.store.query(query).await.map_err(|e| {
            warn!("Querying {} nodes failed: {}", query.kind, e);
            e.into()
        })
    }
}
