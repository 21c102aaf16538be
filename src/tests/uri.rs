use std::sync::Arc;

use serde_json::json;

use super::fixtures::*;
use crate::{
    context::RequestContext,
    node::{EntityKind, Node},
    store::{MemoryStore, Viewer},
    uri::resolve_uri,
};

async fn resolve(uri: &str) -> Option<(EntityKind, String)> {
    resolve_with(&anonymous_context(), uri).await
}

async fn resolve_with(ctx: &RequestContext, uri: &str) -> Option<(EntityKind, String)> {
    resolve_uri(ctx, uri)
        .await
        .unwrap()
        .map(|node| (node.kind(), node.key()))
}

fn page(id: i64, slug: &str, parent_id: Option<i64>) -> serde_json::Value {
    json!({
        "id": id,
        "post_type": "page",
        "title": slug,
        "slug": slug,
        "status": "publish",
        "author_id": 1,
        "parent_id": parent_id,
        "date": "2020-12-03T10:00:00",
    })
}

/// Posts live at ``/%postname%/`` and several slugs collide with other routes
fn colliding_context() -> RequestContext {
    let mut seed = seed();
    seed["registry"]["settings"]["permalink_structure"] = json!("/%postname%/");
    let posts = seed["posts"].as_array_mut().expect("posts are a list");
    posts.extend(vec![
        json!({
            "id": 50,
            "post_type": "post",
            "title": "About this blog",
            "slug": "about",
            "status": "publish",
            "author_id": 2,
            "date": "2021-02-01T10:00:00",
        }),
        page(22, "books", None),
        page(23, "tag", None),
        page(24, "welcome", Some(23)),
        page(25, "2021", None),
    ]);
    let store = MemoryStore::from_json(&seed.to_string()).expect("the seed is malformed");
    context(Arc::new(store), Viewer::anonymous())
}

fn found(kind: EntityKind, key: &str) -> Option<(EntityKind, String)> {
    Some((kind, key.to_string()))
}

#[tokio::test]
async fn test_front_page_lists_posts() {
    assert_eq!(resolve("/").await, found(EntityKind::ContentType, "post"));
    assert_eq!(resolve("").await, found(EntityKind::ContentType, "post"));
    assert_eq!(
        resolve("https://example.com/").await,
        found(EntityKind::ContentType, "post")
    );
}

#[tokio::test]
async fn test_static_front_page() {
    let mut seed = seed();
    seed["registry"]["settings"]["show_on_front"] = json!("page");
    seed["registry"]["settings"]["page_on_front"] = json!(20);
    let store = MemoryStore::from_json(&seed.to_string()).unwrap();
    let ctx = context(Arc::new(store), Viewer::anonymous());

    assert!(matches!(
        resolve_uri(&ctx, "/").await,
        Ok(Some(Node::Post(page))) if page.id == 20
    ));
    // the page keeps its own path as well
    assert!(matches!(
        resolve_uri(&ctx, "/about/").await,
        Ok(Some(Node::Post(page))) if page.id == 20
    ));
}

#[tokio::test]
async fn test_query_vars_win() {
    assert_eq!(resolve("/?p=3").await, found(EntityKind::Post, "3"));
    assert_eq!(resolve("/?page_id=20").await, found(EntityKind::Post, "20"));
    assert_eq!(resolve("/?cat=100").await, found(EntityKind::Term, "100"));
    assert_eq!(resolve("/?author=2").await, found(EntityKind::User, "2"));
    assert_eq!(
        resolve("/category/news/?p=1").await,
        found(EntityKind::Post, "1")
    );
}

#[tokio::test]
async fn test_posts_by_permalink() {
    assert_eq!(
        resolve("/2021/01/hello-world/").await,
        found(EntityKind::Post, "1")
    );
    assert_eq!(
        resolve("https://example.com/2021/01/post-3").await,
        found(EntityKind::Post, "3")
    );
    // the date does not agree with the post
    assert_eq!(resolve("/2020/01/hello-world/").await, None);
    // private to anonymous viewers
    assert_eq!(resolve("/2021/01/post-2/").await, None);
}

#[tokio::test]
async fn test_hierarchical_pages() {
    assert_eq!(resolve("/about/").await, found(EntityKind::Post, "20"));
    assert_eq!(resolve("/about/team/").await, found(EntityKind::Post, "21"));
    // a child page needs its ancestors in the path
    assert_eq!(resolve("/team/").await, None);
    assert_eq!(resolve("/contact/team/").await, None);
}

#[tokio::test]
async fn test_content_type_prefix_and_archive() {
    assert_eq!(resolve("/book/dune/").await, found(EntityKind::Post, "30"));
    assert_eq!(resolve("/books/").await, found(EntityKind::ContentType, "book"));
    assert_eq!(
        resolve("/books/page/2/").await,
        found(EntityKind::ContentType, "book")
    );
}

#[tokio::test]
async fn test_term_archives() {
    assert_eq!(resolve("/category/news/").await, found(EntityKind::Term, "100"));
    assert_eq!(
        resolve("/category/news/local/").await,
        found(EntityKind::Term, "101")
    );
    assert_eq!(resolve("/category/local/").await, found(EntityKind::Term, "101"));
    assert_eq!(
        resolve("/category/news/page/3").await,
        found(EntityKind::Term, "100")
    );
    assert_eq!(resolve("/tag/welcome/").await, found(EntityKind::Term, "200"));
    assert_eq!(resolve("/tag/news/").await, None);
}

#[tokio::test]
async fn test_author_archives() {
    assert_eq!(resolve("/author/jane/").await, found(EntityKind::User, "2"));
    // bob is not visible to anonymous viewers
    assert_eq!(resolve("/author/bob/").await, None);
    assert_eq!(resolve("/author/nobody/").await, None);
}

#[tokio::test]
async fn test_date_archives() {
    assert_eq!(resolve("/2021/").await, found(EntityKind::ContentType, "post"));
    assert_eq!(resolve("/2021/01/").await, found(EntityKind::ContentType, "post"));
    assert_eq!(
        resolve("/2021/01/31/").await,
        found(EntityKind::ContentType, "post")
    );
    assert_eq!(resolve("/2021/13/").await, None);
    assert_eq!(resolve("/2021/01/32/").await, None);
}

#[tokio::test]
async fn test_unknown_paths() {
    assert_eq!(resolve("/does/not/exist/").await, None);
    assert_eq!(resolve("/hello-world/").await, None);
}

#[tokio::test]
async fn test_admin_reaches_private_posts() {
    let ctx = admin_context();
    assert!(matches!(
        resolve_uri(&ctx, "/2021/01/post-2/").await,
        Ok(Some(Node::Post(post))) if post.id == 2
    ));
}

#[tokio::test]
async fn test_page_wins_over_post_with_the_same_slug() {
    let ctx = colliding_context();
    assert_eq!(
        resolve_with(&ctx, "/about/").await,
        found(EntityKind::Post, "20")
    );
    // posts without a competing page resolve by their name alone
    assert_eq!(
        resolve_with(&ctx, "/hello-world/").await,
        found(EntityKind::Post, "1")
    );
}

#[tokio::test]
async fn test_archive_wins_over_page_with_the_same_slug() {
    let ctx = colliding_context();
    assert_eq!(
        resolve_with(&ctx, "/books/").await,
        found(EntityKind::ContentType, "book")
    );
}

#[tokio::test]
async fn test_post_wins_over_term_archive() {
    let ctx = colliding_context();
    assert_eq!(
        resolve_with(&ctx, "/tag/welcome/").await,
        found(EntityKind::Post, "24")
    );
    assert_eq!(
        resolve_with(&ctx, "/category/news/").await,
        found(EntityKind::Term, "100")
    );
}

#[tokio::test]
async fn test_date_archive_comes_last() {
    let ctx = colliding_context();
    assert_eq!(
        resolve_with(&ctx, "/2021/").await,
        found(EntityKind::Post, "25")
    );
    assert_eq!(
        resolve_with(&ctx, "/2021/01/").await,
        found(EntityKind::ContentType, "post")
    );
}
