use std::sync::Arc;

use super::fixtures::*;
use crate::{
    fallible::ResolveError,
    graphql::id,
    node::{resolve_node, EntityKind, Node},
    store::Viewer,
};

#[tokio::test]
async fn test_missing_id_is_an_error() {
    let ctx = anonymous_context();
    assert!(matches!(
        resolve_node(&ctx, "").await,
        Err(ResolveError::MissingIdentifier)
    ));
}

#[tokio::test]
async fn test_malformed_ids_are_rejected() {
    let ctx = anonymous_context();
    for token in ["not a global id", &id::encode("post", "")[..], "cG9zdA"] {
        assert!(
            matches!(
                resolve_node(&ctx, token).await,
                Err(ResolveError::InvalidIdentifier(_))
            ),
            "{} should be rejected",
            token
        );
    }
}

#[tokio::test]
async fn test_unknown_type_resolves_to_none() {
    let store = Arc::new(CountingStore::new(memory_store()));
    let ctx = context(store.clone(), Viewer::anonymous());

    let token = id::encode("widget", "1");
    assert!(matches!(resolve_node(&ctx, &token).await, Ok(None)));
    assert!(store.batches().is_empty());
}

#[tokio::test]
async fn test_resolves_every_kind_through_its_loader() {
    let ctx = admin_context();
    let cases = [
        (EntityKind::Post, "1"),
        (EntityKind::Term, "101"),
        (EntityKind::User, "2"),
        (EntityKind::Comment, "500"),
        (EntityKind::CommentAuthor, "501"),
        (EntityKind::Taxonomy, "category"),
        (EntityKind::ContentType, "page"),
        (EntityKind::UserRole, "author"),
    ];

    for (kind, key) in cases {
        let token = id::encode(kind.tag(), key);
        match resolve_node(&ctx, &token).await {
            Ok(Some(node)) => {
                assert_eq!(node.kind(), kind);
                assert_eq!(node.key(), key);
                assert_eq!(node.global_id(), token);
            }
            other => panic!("{} did not resolve: {:?}", token, other),
        }
    }
}

#[tokio::test]
async fn test_private_node_resolves_to_none_for_anonymous() {
    let token = id::encode("post", "2");

    assert!(matches!(
        resolve_node(&anonymous_context(), &token).await,
        Ok(None)
    ));
    assert!(matches!(
        resolve_node(&admin_context(), &token).await,
        Ok(Some(Node::Post(post))) if post.id == 2
    ));
}

#[tokio::test]
async fn test_user_without_published_posts_is_hidden() {
    let token = id::encode("user", "3");
    assert!(matches!(
        resolve_node(&anonymous_context(), &token).await,
        Ok(None)
    ));
}

#[tokio::test]
async fn test_zero_padded_ids_resolve() {
    let token = id::encode("post", "01");
    assert!(matches!(
        resolve_node(&anonymous_context(), &token).await,
        Ok(Some(Node::Post(post))) if post.id == 1
    ));
}
