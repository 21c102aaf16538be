use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    config::{ConnectionSettings, LoaderSettings},
    context::RequestContext,
    node::{EntityKind, Node, NodeTypeResolver},
    store::{ContentStore, MemoryStore, Registry, StoreError, StoreQuery, StoreResult, Viewer},
};

/// Posts 1 to 8 are dated 2021-01-0N, the even ones are private
pub fn seed() -> serde_json::Value {
    let mut posts: Vec<serde_json::Value> = (1..=8)
        .map(|id| {
            json!({
                "id": id,
                "post_type": "post",
                "title": format!("Post {}", id),
                "slug": if id == 1 { "hello-world".to_string() } else { format!("post-{}", id) },
                "status": if id % 2 == 0 { "private" } else { "publish" },
                "author_id": 2,
                "date": format!("2021-01-0{}T10:00:00", id),
                "term_ids": match id { 1 => vec![100], 3 => vec![101, 200], _ => vec![] },
            })
        })
        .collect();
    posts.extend(vec![
        json!({
            "id": 9,
            "post_type": "post",
            "title": "Draft",
            "slug": "draft",
            "status": "draft",
            "author_id": 2,
            "last_editor_id": 1,
            "edit_lock": { "timestamp": 1_600_000_000, "user_id": 1 },
            "date": "2021-01-09T10:00:00",
        }),
        json!({
            "id": 20,
            "post_type": "page",
            "title": "About",
            "slug": "about",
            "status": "publish",
            "author_id": 1,
            "date": "2020-12-01T10:00:00",
        }),
        json!({
            "id": 21,
            "post_type": "page",
            "title": "Team",
            "slug": "team",
            "status": "publish",
            "author_id": 1,
            "parent_id": 20,
            "date": "2020-12-02T10:00:00",
        }),
        json!({
            "id": 30,
            "post_type": "book",
            "title": "Dune",
            "slug": "dune",
            "status": "publish",
            "author_id": 2,
            "date": "2020-11-01T10:00:00",
        }),
        json!({
            "id": 40,
            "post_type": "revision",
            "title": "Post 1",
            "slug": "1-revision-v1",
            "status": "inherit",
            "author_id": 2,
            "parent_id": 1,
            "date": "2021-01-01T11:00:00",
        }),
    ]);

    json!({
        "registry": {
            "content_types": [
                { "name": "post", "graphql_single_name": "post", "graphql_plural_name": "posts" },
                {
                    "name": "page",
                    "graphql_single_name": "page",
                    "graphql_plural_name": "pages",
                    "hierarchical": true
                },
                {
                    "name": "book",
                    "graphql_single_name": "book",
                    "graphql_plural_name": "books",
                    "has_archive": "books",
                    "rewrite_slug": "book"
                },
                {
                    "name": "revision",
                    "graphql_single_name": "revision",
                    "graphql_plural_name": "revisions",
                    "public": false
                }
            ],
            "taxonomies": [
                {
                    "name": "category",
                    "graphql_single_name": "category",
                    "graphql_plural_name": "categories",
                    "hierarchical": true,
                    "rewrite_slug": "category",
                    "object_types": ["post"]
                },
                {
                    "name": "post_tag",
                    "graphql_single_name": "tag",
                    "graphql_plural_name": "tags",
                    "rewrite_slug": "tag",
                    "object_types": ["post"]
                }
            ],
            "roles": [
                { "name": "administrator", "display_name": "Administrator" },
                { "name": "author", "display_name": "Author" }
            ],
            "settings": { "permalink_structure": "/%year%/%monthnum%/%postname%/" }
        },
        "users": [
            {
                "id": 1,
                "login": "admin",
                "nicename": "admin",
                "display_name": "Site Admin",
                "registered": "2020-01-01T00:00:00",
                "roles": ["administrator"]
            },
            {
                "id": 2,
                "login": "jane",
                "nicename": "jane",
                "display_name": "Jane Doe",
                "registered": "2020-02-01T00:00:00",
                "roles": ["author"]
            },
            {
                "id": 3,
                "login": "bob",
                "nicename": "bob",
                "display_name": "Bob",
                "registered": "2020-03-01T00:00:00",
                "roles": ["author"]
            }
        ],
        "posts": posts,
        "terms": [
            { "id": 100, "taxonomy": "category", "name": "News", "slug": "news", "count": 1 },
            {
                "id": 101,
                "taxonomy": "category",
                "name": "Local",
                "slug": "local",
                "parent_id": 100,
                "count": 1
            },
            { "id": 200, "taxonomy": "post_tag", "name": "Welcome", "slug": "welcome", "count": 1 }
        ],
        "comments": [
            {
                "id": 500,
                "post_id": 1,
                "author_id": 1,
                "content": "First!",
                "date": "2021-01-01T12:00:00",
                "status": "approve"
            },
            {
                "id": 501,
                "post_id": 1,
                "author_name": "A Visitor",
                "author_email": "visitor@example.org",
                "content": "Nice post.",
                "date": "2021-01-01T13:00:00",
                "status": "approve"
            },
            {
                "id": 502,
                "post_id": 1,
                "author_name": "Spammer",
                "content": "Buy now",
                "date": "2021-01-01T14:00:00",
                "status": "hold"
            }
        ]
    })
}

pub fn memory_store() -> MemoryStore {
    MemoryStore::from_json(&seed().to_string()).expect("the test seed is malformed")
}

pub fn admin() -> Viewer {
    Viewer::user(
        1,
        [
            "list_users",
            "edit_others_posts",
            "read_private_posts",
            "moderate_comments",
            "manage_options",
        ],
    )
}

pub fn context(store: Arc<dyn ContentStore>, viewer: Viewer) -> RequestContext {
    context_with(store, viewer, ConnectionSettings::default())
}

pub fn context_with(
    store: Arc<dyn ContentStore>,
    viewer: Viewer,
    connections: ConnectionSettings,
) -> RequestContext {
    RequestContext::new(
        store,
        viewer,
        Arc::new(NodeTypeResolver::new()),
        connections,
        LoaderSettings::default(),
    )
}

pub fn anonymous_context() -> RequestContext {
    context(Arc::new(memory_store()), Viewer::anonymous())
}

pub fn admin_context() -> RequestContext {
    context(Arc::new(memory_store()), admin())
}

/// Records every batch handed to [`ContentStore::get_many`]
pub struct CountingStore {
    inner: MemoryStore,
    batches: Mutex<Vec<(EntityKind, Vec<String>)>>,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// The batches so far, with sorted ids
    pub fn batches(&self) -> Vec<(EntityKind, Vec<String>)> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentStore for CountingStore {
    fn registry(&self) -> &Registry {
        self.inner.registry()
    }

    async fn get_many(&self, kind: EntityKind, ids: &[String]) -> StoreResult<Vec<Node>> {
        let mut sorted = ids.to_vec();
        sorted.sort();
        self.batches.lock().unwrap().push((kind, sorted));
        self.inner.get_many(kind, ids).await
    }

    async fn query(&self, query: &StoreQuery) -> StoreResult<Vec<Node>> {
        self.inner.query(query).await
    }

    fn can_read(&self, viewer: &Viewer, node: &Node) -> bool {
        self.inner.can_read(viewer, node)
    }
}

/// A store whose backend is gone
pub struct FailingStore {
    registry: Registry,
}

impl FailingStore {
    pub fn new() -> Self {
        Self {
            registry: memory_store().registry().clone(),
        }
    }
}

#[async_trait]
impl ContentStore for FailingStore {
    fn registry(&self) -> &Registry {
        &self.registry
    }

    async fn get_many(&self, _: EntityKind, _: &[String]) -> StoreResult<Vec<Node>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn query(&self, _: &StoreQuery) -> StoreResult<Vec<Node>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    fn can_read(&self, _: &Viewer, _: &Node) -> bool {
        true
    }
}
