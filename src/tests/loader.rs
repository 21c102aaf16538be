use std::sync::Arc;

use futures::future::join_all;

use super::fixtures::*;
use crate::{
    fallible::ResolveError,
    node::{EntityKind, Node},
    store::Viewer,
};

#[tokio::test]
async fn test_same_id_is_fetched_once() {
    let store = Arc::new(CountingStore::new(memory_store()));
    let ctx = context(store.clone(), Viewer::anonymous());

    let nodes = join_all((0..5).map(|_| ctx.load_deferred(EntityKind::Post, "1"))).await;

    assert_eq!(nodes.len(), 5);
    for node in nodes {
        assert!(matches!(node, Ok(Some(Node::Post(post))) if post.id == 1));
    }
    assert_eq!(
        store.batches(),
        vec![(EntityKind::Post, vec!["1".to_string()])]
    );
}

#[tokio::test]
async fn test_concurrent_ids_share_a_batch() {
    let store = Arc::new(CountingStore::new(memory_store()));
    let ctx = context(store.clone(), Viewer::anonymous());

    let nodes = join_all(
        ["1", "3", "5"]
            .iter()
            .map(|id| ctx.load_deferred(EntityKind::Post, *id)),
    )
    .await;

    let ids: Vec<i64> = nodes
        .into_iter()
        .map(|node| match node {
            Ok(Some(Node::Post(post))) => post.id,
            other => panic!("unexpected result {:?}", other),
        })
        .collect();
    assert_eq!(ids, vec![1, 3, 5]);
    assert_eq!(
        store.batches(),
        vec![(
            EntityKind::Post,
            vec!["1".to_string(), "3".to_string(), "5".to_string()]
        )]
    );
}

#[tokio::test]
async fn test_equivalent_ids_share_an_entry() {
    let store = Arc::new(CountingStore::new(memory_store()));
    let ctx = context(store.clone(), Viewer::anonymous());

    let nodes = join_all(
        ["01", "1", "+1"]
            .iter()
            .map(|id| ctx.load_deferred(EntityKind::Post, *id)),
    )
    .await;

    for node in nodes {
        assert!(matches!(node, Ok(Some(Node::Post(post))) if post.id == 1));
    }
    assert_eq!(
        store.batches(),
        vec![(EntityKind::Post, vec!["1".to_string()])]
    );
}

#[tokio::test]
async fn test_loads_are_deferred_until_awaited() {
    let store = Arc::new(CountingStore::new(memory_store()));
    let ctx = context(store.clone(), Viewer::anonymous());

    let pending = ctx.load_deferred(EntityKind::User, "2");
    assert!(store.batches().is_empty());
    drop(pending);
    assert!(store.batches().is_empty());
}

#[tokio::test]
async fn test_absent_and_denied_ids_resolve_to_none_and_are_cached() {
    let store = Arc::new(CountingStore::new(memory_store()));
    let ctx = context(store.clone(), Viewer::anonymous());

    // 999 does not exist, 2 is private
    assert!(matches!(ctx.load_deferred(EntityKind::Post, "999").await, Ok(None)));
    assert!(matches!(ctx.load_deferred(EntityKind::Post, "2").await, Ok(None)));
    let batches = store.batches().len();

    assert!(matches!(ctx.load_deferred(EntityKind::Post, "999").await, Ok(None)));
    assert!(matches!(ctx.load_deferred(EntityKind::Post, "2").await, Ok(None)));
    assert_eq!(store.batches().len(), batches);
}

#[tokio::test]
async fn test_denied_for_one_viewer_is_readable_for_another() {
    let store = Arc::new(memory_store());
    let anonymous = context(store.clone(), Viewer::anonymous());
    let admin = context(store, admin());

    assert!(matches!(anonymous.load_deferred(EntityKind::Post, "2").await, Ok(None)));
    assert!(matches!(
        admin.load_deferred(EntityKind::Post, "2").await,
        Ok(Some(Node::Post(post))) if post.id == 2
    ));
}

#[tokio::test]
async fn test_store_fault_rejects_every_pending_load() {
    let ctx = context(Arc::new(FailingStore::new()), Viewer::anonymous());

    let results = join_all(vec![
        ctx.load_deferred(EntityKind::Post, "1"),
        ctx.load_deferred(EntityKind::Post, "3"),
    ])
    .await;

    for result in results {
        assert!(matches!(result, Err(ResolveError::StoreFault(_))));
    }
}

#[tokio::test]
async fn test_guest_comment_authors_are_loaded_by_comment_id() {
    let ctx = anonymous_context();

    assert!(matches!(
        ctx.load_deferred(EntityKind::CommentAuthor, "501").await,
        Ok(Some(Node::CommentAuthor(author))) if author.name == "A Visitor"
    ));
    // comment 500 was written by a registered user
    assert!(matches!(
        ctx.load_deferred(EntityKind::CommentAuthor, "500").await,
        Ok(None)
    ));
}
