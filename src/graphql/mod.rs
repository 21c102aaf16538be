//! The graphql schema
//!
//! The object types depend on the content types and taxonomies of the
//! [`Registry`], so the schema is assembled at runtime with the dynamic api
//! of async-graphql.
use std::collections::BTreeSet;

use async_graphql::{
    dynamic::{Field, FieldFuture, InputValue, Object, Schema, SchemaBuilder, SchemaError, TypeRef},
    ErrorExtensions,
};
use log::{info, warn};

pub mod id;

mod connection;
mod fields;
mod node;

use self::{
    connection::{
        connection_field, connection_types, edge_type, edit_lock_edge_type, register_kind,
        register_shared, GraphKind,
    },
    fields::typed_owned,
};
use crate::{
    connection::{Comments, Plugins, Posts, Terms, Themes, UserRoles, Users},
    context::RequestContext,
    node::{resolve_node, ucfirst, EntityKind},
    store::Registry,
    uri::resolve_uri,
};

pub const QUERY: &str = "RootQuery";

pub type GraphQLSchema = Schema;

fn lcfirst(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds the schema for the content types and taxonomies of ``registry``
pub fn build_schema(registry: &Registry) -> Result<GraphQLSchema, SchemaError> {
    let mut builder = Schema::build(QUERY, None, None);
    builder = register_shared(builder);
    builder = register_kind::<Users>(builder);
    builder = register_kind::<Posts>(builder);
    builder = register_kind::<Terms>(builder);
    builder = register_kind::<Comments>(builder);
    builder = register_kind::<Plugins>(builder);
    builder = register_kind::<Themes>(builder);
    builder = register_kind::<UserRoles>(builder);

    builder = builder
        .register(node::node_interface())
        .register(node::content_node_interface())
        .register(node::term_node_interface())
        .register(node::commenter_interface())
        .register(node::enqueued_asset_interface())
        .register(node::user_object())
        .register(node::comment_object())
        .register(node::comment_author_object())
        .register(node::plugin_object())
        .register(node::theme_object())
        .register(node::menu_object())
        .register(node::taxonomy_type_object())
        .register(node::content_type_type_object())
        .register(node::user_role_object())
        .register(node::dependency_object("EnqueuedScript"))
        .register(node::dependency_object("EnqueuedStylesheet"))
        .register(edge_type(node::USER_EDGE, "User"))
        .register(edit_lock_edge_type(node::EDIT_LOCK_EDGE, "User"));

    for (name, node_type) in [
        ("User", "User"),
        ("ContentNode", node::CONTENT_NODE),
        ("TermNode", node::TERM_NODE),
        ("Comment", "Comment"),
        ("Plugin", "Plugin"),
        ("Theme", "Theme"),
        ("UserRole", "UserRole"),
    ] {
        builder = register_connection(builder, name, node_type);
    }

    for content_type in registry.content_types.iter().filter(|t| !t.name.eq("revision")) {
        let single = ucfirst(&content_type.graphql_single_name);
        builder = builder.register(node::content_type_object(content_type));
        builder = register_connection(builder, &single, &single);
    }
    for taxonomy in &registry.taxonomies {
        let single = ucfirst(&taxonomy.graphql_single_name);
        builder = builder.register(node::taxonomy_object(taxonomy));
        builder = register_connection(builder, &single, &single);
    }

    builder = builder.register(root_query(registry));
    info!(
        "Built the schema for {} content types and {} taxonomies",
        registry.content_types.len(),
        registry.taxonomies.len()
    );
    builder.finish()
}

fn register_connection(builder: SchemaBuilder, name: &str, node_type: &str) -> SchemaBuilder {
    let [connection, edge] = connection_types(name, node_type);
    builder.register(connection).register(edge)
}

/// Root fields, skipping plural names a content type or taxonomy would
/// register twice
#[derive(Default)]
struct RootFields {
    fields: Vec<Field>,
    names: BTreeSet<String>,
}

impl RootFields {
    fn add(&mut self, name: &str, build: impl FnOnce(&str) -> Field) {
        if self.names.insert(name.to_string()) {
            self.fields.push(build(name));
        } else {
            warn!("The root field {} is registered twice, skipping it", name);
        }
    }

    fn add_connection<K: GraphKind>(&mut self, name: &str) {
        self.add(name, |name| {
            connection_field::<K, _>(name, &format!("{}Connection", K::PREFIX), |_, _| {})
        });
    }

    fn into_object(self) -> Object {
        self.fields.into_iter().fold(
            Object::new(QUERY).description("The root entry point into the Graph"),
            |query, field| query.field(field),
        )
    }
}

fn root_query(registry: &Registry) -> Object {
    let mut root = RootFields::default();

    root.add("node", node_field);
    root.add("nodeByUri", node_by_uri_field);
    root.add("viewer", viewer_field);

    root.add_connection::<Users>("users");
    root.add_connection::<Posts>("contentNodes");
    for content_type in registry.content_types.iter().filter(|t| !t.name.eq("revision")) {
        let content_types = vec![content_type.name.clone()];
        let connection = format!("{}Connection", ucfirst(&content_type.graphql_single_name));
        root.add(&lcfirst(&content_type.graphql_plural_name), |name| {
            connection_field::<Posts, _>(name, &connection, move |_, filter| {
                filter.content_types = content_types.clone()
            })
        });
    }

    root.add_connection::<Terms>("terms");
    for taxonomy in &registry.taxonomies {
        let taxonomies = vec![taxonomy.name.clone()];
        let connection = format!("{}Connection", ucfirst(&taxonomy.graphql_single_name));
        root.add(&lcfirst(&taxonomy.graphql_plural_name), |name| {
            connection_field::<Terms, _>(name, &connection, move |_, filter| {
                filter.taxonomies = taxonomies.clone()
            })
        });
    }

    root.add_connection::<Comments>("comments");
    root.add_connection::<Plugins>("plugins");
    root.add_connection::<Themes>("themes");
    root.add_connection::<UserRoles>("userRoles");
    root.into_object()
}

fn node_field(name: &str) -> Field {
    Field::new(name, TypeRef::named(node::NODE), |ctx| {
        let token = ctx
            .args
            .get("id")
            .filter(|id| !id.is_null())
            .map(|id| id.string().map(str::to_string))
            .transpose();
        FieldFuture::new(async move {
            let token = token?.unwrap_or_default();
            let request = ctx.data::<RequestContext>()?;
            match resolve_node(request, &token).await.map_err(|e| e.extend())? {
                Some(node) => Ok(Some(typed_owned(request, node).await?)),
                None => Ok(None),
            }
        })
    })
    .description("Fetches an object given its ID")
    .argument(
        InputValue::new("id", TypeRef::named(TypeRef::ID))
            .description("The unique identifier of the node"),
    )
}

fn node_by_uri_field(name: &str) -> Field {
    Field::new(name, TypeRef::named(node::NODE), |ctx| {
        let uri = ctx
            .args
            .try_get("uri")
            .and_then(|uri| uri.string().map(str::to_string));
        FieldFuture::new(async move {
            let uri = uri?;
            let request = ctx.data::<RequestContext>()?;
            match resolve_uri(request, &uri).await.map_err(|e| e.extend())? {
                Some(node) => Ok(Some(typed_owned(request, node).await?)),
                None => Ok(None),
            }
        })
    })
    .description("Fetches an object given its Unique Resource Identifier")
    .argument(
        InputValue::new("uri", TypeRef::named_nn(TypeRef::STRING)).description(
            "Unique Resource Identifier in the form of a path or permalink for a node. Ex: \"/hello-world\"",
        ),
    )
}

fn viewer_field(name: &str) -> Field {
    Field::new(name, TypeRef::named("User"), |ctx| {
        FieldFuture::new(async move {
            let request = ctx.data::<RequestContext>()?;
            let user_id = match request.viewer().user_id {
                Some(user_id) => user_id,
                None => return Ok(None),
            };
            match request
                .load_deferred(EntityKind::User, user_id.to_string())
                .await
                .map_err(|e| e.extend())?
            {
                Some(node) => Ok(Some(typed_owned(request, node).await?)),
                None => Ok(None),
            }
        })
    })
    .description("Returns the current user")
}

#[cfg(test)]
mod tests {
    use super::lcfirst;

    #[test]
    fn test_lcfirst() {
        assert_eq!(lcfirst("Posts"), "posts");
        assert_eq!(lcfirst("userRoles"), "userRoles");
        assert_eq!(lcfirst(""), "");
    }
}
