//! Field builders shared by the object types
//!
//! Every object of the schema is backed by a [`Node`] as its parent value.
//! The builders here downcast it to the variant a field belongs to.
use async_graphql::{
    dynamic::{Field, FieldFuture, FieldValue, TypeRef},
    ErrorExtensions, Value,
};

use crate::{
    context::RequestContext,
    node::{
        Comment, CommentAuthor, ContentType, Dependency, EntityKind, Menu, Node, Plugin, Post,
        Taxonomy, Term, Theme, User, UserRole,
    },
};

/// The format of every date field
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A model type that is one variant of [`Node`]
pub trait Variant: Sized + Send + Sync + 'static {
    fn of(node: &Node) -> Option<&Self>;
}

macro_rules! variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl Variant for $variant {
                fn of(node: &Node) -> Option<&Self> {
                    match node {
                        Node::$variant(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

variant!(
    Post,
    Term,
    User,
    Comment,
    CommentAuthor,
    Plugin,
    Theme,
    Menu,
    Taxonomy,
    ContentType,
    UserRole,
    Dependency,
);

impl Variant for Node {
    fn of(node: &Node) -> Option<&Self> {
        Some(node)
    }
}

/// A field computed from the parent alone
pub fn scalar<T, F>(name: &str, ty: TypeRef, get: F) -> Field
where
    T: Variant,
    F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
{
    Field::new(name, ty, move |ctx| {
        let value = ctx
            .parent_value
            .try_downcast_ref::<Node>()
            .map(|node| T::of(node).and_then(|parent| get(parent)));
        FieldFuture::new(async move { Ok(value?.map(FieldValue::value)) })
    })
}

pub fn id_field() -> Field {
    scalar::<Node, _>("id", TypeRef::named_nn(TypeRef::ID), |node| {
        Some(Value::from(node.global_id()))
    })
}

pub fn database_id_field() -> Field {
    scalar::<Node, _>("databaseId", TypeRef::named(TypeRef::INT), |node| {
        node.database_id().map(Value::from)
    })
}

/// A field pointing to another node, fetched through its loader
pub fn node_ref<T, F>(name: &str, ty: TypeRef, locate: F) -> Field
where
    T: Variant,
    F: Fn(&T) -> Option<(EntityKind, String)> + Send + Sync + 'static,
{
    Field::new(name, ty, move |ctx| {
        let target = ctx
            .parent_value
            .try_downcast_ref::<Node>()
            .map(|node| T::of(node).and_then(|parent| locate(parent)));
        FieldFuture::new(async move {
            let (kind, id) = match target? {
                Some(target) => target,
                None => return Ok(None),
            };
            let request = ctx.data::<RequestContext>()?;
            match request.load_deferred(kind, id).await.map_err(|e| e.extend())? {
                Some(node) => Ok(Some(typed_owned(request, node).await?)),
                None => Ok(None),
            }
        })
    })
}

/// Wraps ``node`` with its concrete object type so it can be returned from
/// interface typed fields
pub async fn typed<'a>(
    request: &RequestContext,
    node: &'a Node,
) -> async_graphql::Result<FieldValue<'a>> {
    let type_name = request
        .node_types()
        .resolve_type(request, node)
        .await
        .map_err(|e| e.extend())?;
    Ok(FieldValue::borrowed_any(node).with_type(type_name))
}

pub async fn typed_owned(
    request: &RequestContext,
    node: Node,
) -> async_graphql::Result<FieldValue<'static>> {
    let type_name = request
        .node_types()
        .resolve_type(request, &node)
        .await
        .map_err(|e| e.extend())?;
    Ok(FieldValue::owned_any(node).with_type(type_name))
}

pub fn string_list(values: &[String]) -> Value {
    Value::List(values.iter().cloned().map(Value::from).collect())
}
