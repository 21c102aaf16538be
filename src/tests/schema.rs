use std::sync::Arc;

use async_graphql::Request;
use serde_json::{json, Value};

use super::fixtures::*;
use crate::{
    context::RequestContext,
    graphql::{build_schema, id},
    store::{ContentStore, Viewer},
};

async fn execute(ctx: RequestContext, query: &str) -> (Value, Vec<async_graphql::ServerError>) {
    let schema = build_schema(ctx.registry()).expect("the schema is invalid");
    let response = schema.execute(Request::new(query).data(ctx)).await;
    (response.data.into_json().unwrap(), response.errors)
}

#[test]
fn test_schema_has_a_type_per_content_type_and_taxonomy() {
    let store = memory_store();
    let schema = build_schema(store.registry()).unwrap();
    let sdl = schema.sdl();

    for definition in [
        "type Post implements Node & ContentNode",
        "type Page implements Node & ContentNode",
        "type Book implements Node & ContentNode",
        "type Category implements Node & TermNode",
        "type Tag implements Node & TermNode",
        "type PostConnection",
        "type CategoryConnection",
        "type ContentNodeToEditLockConnectionEdge",
        "input ContentNodeConnectionWhereArgs",
    ] {
        assert!(sdl.contains(definition), "{} is missing", definition);
    }
    assert!(!sdl.contains("type Revision "));
}

#[tokio::test]
async fn test_node_query() {
    let query = format!(
        r#"{{
            node(id: "{}") {{
                id
                ... on Post {{
                    title
                    databaseId
                    author {{ node {{ name }} }}
                    terms {{ nodes {{ name }} }}
                }}
            }}
        }}"#,
        id::encode("post", "3")
    );
    let (data, errors) = execute(anonymous_context(), &query).await;

    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        data,
        json!({
            "node": {
                "id": id::encode("post", "3"),
                "title": "Post 3",
                "databaseId": 3,
                "author": { "node": { "name": "Jane Doe" } },
                "terms": { "nodes": [{ "name": "Local" }, { "name": "Welcome" }] }
            }
        })
    );
}

#[tokio::test]
async fn test_failing_field_keeps_its_siblings() {
    let query = format!(
        r#"{{
            broken: node(id: "not a global id") {{ id }}
            missing: node(id: "{}") {{ id }}
            found: node(id: "{}") {{ id }}
        }}"#,
        id::encode("post", "999"),
        id::encode("post", "1")
    );
    let (data, errors) = execute(anonymous_context(), &query).await;

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path.len(), 1);
    assert_eq!(data["broken"], Value::Null);
    assert_eq!(data["missing"], Value::Null);
    assert_eq!(data["found"]["id"], json!(id::encode("post", "1")));

    let error = serde_json::to_value(&errors[0]).unwrap();
    assert_eq!(error["extensions"]["code"], json!("INVALID_IDENTIFIER"));
    assert_eq!(error["extensions"]["category"], json!("user"));
}

#[tokio::test]
async fn test_connection_query() {
    let query = r#"{
        posts(first: 2, where: { search: "Post" }) {
            edges { cursor node { databaseId } }
            nodes { ... on Post { slug } }
            pageInfo { hasNextPage hasPreviousPage }
        }
    }"#;
    let (data, errors) = execute(anonymous_context(), query).await;

    assert!(errors.is_empty(), "{:?}", errors);
    let ids: Vec<i64> = data["posts"]["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|edge| edge["node"]["databaseId"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![7, 5]);
    assert_eq!(
        data["posts"]["nodes"],
        json!([{ "slug": "post-7" }, { "slug": "post-5" }])
    );
    assert_eq!(
        data["posts"]["pageInfo"],
        json!({ "hasNextPage": true, "hasPreviousPage": false })
    );
}

#[tokio::test]
async fn test_connection_argument_errors() {
    let query = r#"{
        users(first: 1, last: 1) { nodes { id } }
        contentNodes(orderby: { field: TITLE, order: ASC }, first: 1) {
            nodes { ... on Page { title } }
        }
    }"#;
    let (data, errors) = execute(anonymous_context(), query).await;

    assert_eq!(errors.len(), 1);
    assert_eq!(data["users"], Value::Null);
    assert_eq!(data["contentNodes"]["nodes"], json!([{ "title": "About" }]));
}

#[tokio::test]
async fn test_users_orderby_list_and_search_columns() {
    let query = r#"{
        users(
            orderby: [{ field: REGISTERED, order: DESC }, { field: LOGIN }]
            where: { search: "a", searchColumns: [LOGIN] }
        ) {
            nodes { username }
        }
        single: users(orderby: { field: DISPLAY_NAME }, first: 1) { nodes { username } }
    }"#;
    let (data, errors) = execute(admin_context(), query).await;

    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        data["users"]["nodes"],
        json!([{ "username": "jane" }, { "username": "admin" }])
    );
    assert_eq!(data["single"]["nodes"], json!([{ "username": "bob" }]));
}

#[tokio::test]
async fn test_node_by_uri_query() {
    let query = r#"{
        page: nodeByUri(uri: "/about/team/") { ... on Page { title parent { ... on Page { slug } } } }
        nothing: nodeByUri(uri: "/team/") { id }
    }"#;
    let (data, errors) = execute(anonymous_context(), query).await;

    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(
        data,
        json!({
            "page": { "title": "Team", "parent": { "slug": "about" } },
            "nothing": null
        })
    );
}

#[tokio::test]
async fn test_viewer_and_comments() {
    let store: Arc<dyn ContentStore> = Arc::new(memory_store());
    let query = format!(
        r#"{{
            viewer {{ username }}
            node(id: "{}") {{
                ... on Post {{
                    comments {{
                        nodes {{ content author {{ ... on User {{ username }} ... on CommentAuthor {{ name }} }} }}
                    }}
                }}
            }}
        }}"#,
        id::encode("post", "1")
    );

    let (data, errors) = execute(context(store.clone(), Viewer::anonymous()), &query).await;
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(data["viewer"], Value::Null);
    assert_eq!(
        data["node"]["comments"]["nodes"],
        json!([
            { "content": "Nice post.", "author": { "name": "A Visitor" } },
            { "content": "First!", "author": { "username": "admin" } }
        ])
    );

    let (data, errors) = execute(context(store, admin()), &query).await;
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(data["viewer"], json!({ "username": "admin" }));
}
