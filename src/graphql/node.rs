//! The ``Node`` interface and every object type implementing it
use async_graphql::{
    dynamic::{Field, FieldFuture, FieldValue, Interface, InterfaceField, Object, TypeRef},
    ErrorExtensions, Value,
};
use chrono::Utc;

use super::{
    connection::{connection_field, EditLockEdge},
    fields::{database_id_field, id_field, node_ref, scalar, string_list, DATE_FORMAT},
};
use crate::{
    connection::{self, Comments, Posts, Terms},
    context::RequestContext,
    node::{
        ucfirst, Comment, CommentAuthor, ContentType, Dependency, EntityKind, Menu, Node, Plugin,
        Post, Taxonomy, Term, Theme, User, UserRole,
    },
};

pub const NODE: &str = "Node";
pub const CONTENT_NODE: &str = "ContentNode";
pub const TERM_NODE: &str = "TermNode";
pub const COMMENTER: &str = "Commenter";
pub const ENQUEUED_ASSET: &str = "EnqueuedAsset";

pub const USER_EDGE: &str = "ContentNodeToUserConnectionEdge";
pub const EDIT_LOCK_EDGE: &str = "ContentNodeToEditLockConnectionEdge";

fn string(value: &str) -> Option<Value> {
    Some(Value::from(value))
}

fn optional(value: &Option<String>) -> Option<Value> {
    value.as_deref().map(Value::from)
}

/// Node
///
/// A node is an interface that all objects with an ID implement.
/// It is used for [global object identification][1].
///
/// [1]: https://graphql.org/learn/global-object-identification/
pub fn node_interface() -> Interface {
    Interface::new(NODE)
        .description("An object with a globally unique ID")
        .field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)))
}

pub fn content_node_interface() -> Interface {
    Interface::new(CONTENT_NODE)
        .description("Nodes used to manage content")
        .implement(NODE)
        .field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)))
        .field(InterfaceField::new("databaseId", TypeRef::named(TypeRef::INT)))
        .field(InterfaceField::new("title", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("slug", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("status", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("date", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("modified", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("content", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new(
            "contentTypeName",
            TypeRef::named_nn(TypeRef::STRING),
        ))
        .field(InterfaceField::new(
            "isRevision",
            TypeRef::named_nn(TypeRef::BOOLEAN),
        ))
        .field(InterfaceField::new("author", TypeRef::named(USER_EDGE)))
        .field(InterfaceField::new("lastEditedBy", TypeRef::named(USER_EDGE)))
        .field(InterfaceField::new(
            "editingLockedBy",
            TypeRef::named(EDIT_LOCK_EDGE),
        ))
}

pub fn term_node_interface() -> Interface {
    Interface::new(TERM_NODE)
        .description("Terms are nodes within a Taxonomy, used to group and relate other nodes.")
        .implement(NODE)
        .field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)))
        .field(InterfaceField::new("databaseId", TypeRef::named(TypeRef::INT)))
        .field(InterfaceField::new("name", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("slug", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("count", TypeRef::named(TypeRef::INT)))
        .field(InterfaceField::new("description", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new(
            "taxonomyName",
            TypeRef::named_nn(TypeRef::STRING),
        ))
}

pub fn commenter_interface() -> Interface {
    Interface::new(COMMENTER)
        .description("The author of a comment")
        .implement(NODE)
        .field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)))
        .field(InterfaceField::new("databaseId", TypeRef::named(TypeRef::INT)))
        .field(InterfaceField::new("name", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("email", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("url", TypeRef::named(TypeRef::STRING)))
}

pub fn enqueued_asset_interface() -> Interface {
    Interface::new(ENQUEUED_ASSET)
        .description("Asset enqueued by the CMS")
        .implement(NODE)
        .field(InterfaceField::new("id", TypeRef::named_nn(TypeRef::ID)))
        .field(InterfaceField::new("handle", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("src", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new("version", TypeRef::named(TypeRef::STRING)))
        .field(InterfaceField::new(
            "dependencies",
            TypeRef::named_nn_list_nn(TypeRef::STRING),
        ))
}

#[derive(Clone, Copy)]
enum UserEdge {
    Author,
    LastEditor,
}

fn user_edge_field(name: &str, which: UserEdge) -> Field {
    Field::new(name, TypeRef::named(USER_EDGE), move |ctx| {
        FieldFuture::new(async move {
            let post = match ctx.parent_value.try_downcast_ref::<Node>()? {
                Node::Post(post) => post,
                _ => return Ok(None),
            };
            let request = ctx.data::<RequestContext>()?;
            let edge = match which {
                UserEdge::Author => connection::author(request, post).await,
                UserEdge::LastEditor => connection::last_edited_by(request, post).await,
            }
            .map_err(|e| e.extend())?;
            Ok(edge.map(FieldValue::owned_any))
        })
    })
}

fn edit_lock_field() -> Field {
    Field::new("editingLockedBy", TypeRef::named(EDIT_LOCK_EDGE), |ctx| {
        FieldFuture::new(async move {
            let post = match ctx.parent_value.try_downcast_ref::<Node>()? {
                Node::Post(post) => post,
                _ => return Ok(None),
            };
            let request = ctx.data::<RequestContext>()?;
            let lock = connection::editing_locked_by(request, post, Utc::now().timestamp())
                .await
                .map_err(|e| e.extend())?;
            Ok(lock.map(|(edge, locked_at)| FieldValue::owned_any(EditLockEdge { edge, locked_at })))
        })
    })
    .description(
        "If a user has edited the node within the past 15 seconds, this will return the user that last edited.",
    )
}

/// The object of one content type, e.g. ``Post`` or ``Page``
pub fn content_type_object(content_type: &ContentType) -> Object {
    let mut object = Object::new(ucfirst(&content_type.graphql_single_name))
        .implement(NODE)
        .implement(CONTENT_NODE)
        .field(id_field())
        .field(database_id_field())
        .field(scalar::<Post, _>("title", TypeRef::named(TypeRef::STRING), |p| {
            string(&p.title)
        }))
        .field(scalar::<Post, _>("slug", TypeRef::named(TypeRef::STRING), |p| {
            string(&p.slug)
        }))
        .field(scalar::<Post, _>("status", TypeRef::named(TypeRef::STRING), |p| {
            string(p.status.as_str())
        }))
        .field(scalar::<Post, _>("date", TypeRef::named(TypeRef::STRING), |p| {
            Some(Value::from(p.date.format(DATE_FORMAT).to_string()))
        }))
        .field(scalar::<Post, _>("modified", TypeRef::named(TypeRef::STRING), |p| {
            p.modified
                .map(|modified| Value::from(modified.format(DATE_FORMAT).to_string()))
        }))
        .field(scalar::<Post, _>("content", TypeRef::named(TypeRef::STRING), |p| {
            string(&p.content)
        }))
        .field(scalar::<Post, _>(
            "contentTypeName",
            TypeRef::named_nn(TypeRef::STRING),
            |p| string(&p.post_type),
        ))
        .field(scalar::<Post, _>(
            "isRevision",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |p| Some(Value::from(p.is_revision())),
        ))
        .field(scalar::<Post, _>("menuOrder", TypeRef::named(TypeRef::INT), |p| {
            Some(Value::from(p.menu_order))
        }))
        .field(user_edge_field("author", UserEdge::Author))
        .field(user_edge_field("lastEditedBy", UserEdge::LastEditor))
        .field(edit_lock_field())
        .field(node_ref::<Post, _>(
            "parent",
            TypeRef::named(CONTENT_NODE),
            |p| p.parent_id.map(|id| (EntityKind::Post, id.to_string())),
        ))
        .field(connection_field::<Terms, _>(
            "terms",
            "TermNodeConnection",
            |parent, filter| {
                if let Some(Node::Post(post)) = parent {
                    filter.object_id = Some(post.id);
                }
            },
        ))
        .field(connection_field::<Comments, _>(
            "comments",
            "CommentConnection",
            |parent, filter| {
                if let Some(Node::Post(post)) = parent {
                    filter.content_id = Some(post.id);
                }
            },
        ));

    if content_type.hierarchical {
        let name = content_type.name.clone();
        object = object.field(connection_field::<Posts, _>(
            "children",
            &format!("{}Connection", ucfirst(&content_type.graphql_single_name)),
            move |parent, filter| {
                if let Some(Node::Post(post)) = parent {
                    filter.parent = Some(post.id);
                    filter.content_types = vec![name.clone()];
                }
            },
        ));
    }
    object
}

/// The object of one taxonomy, e.g. ``Category``
pub fn taxonomy_object(taxonomy: &Taxonomy) -> Object {
    Object::new(ucfirst(&taxonomy.graphql_single_name))
        .implement(NODE)
        .implement(TERM_NODE)
        .field(id_field())
        .field(database_id_field())
        .field(scalar::<Term, _>("name", TypeRef::named(TypeRef::STRING), |t| {
            string(&t.name)
        }))
        .field(scalar::<Term, _>("slug", TypeRef::named(TypeRef::STRING), |t| {
            string(&t.slug)
        }))
        .field(scalar::<Term, _>("count", TypeRef::named(TypeRef::INT), |t| {
            Some(Value::from(t.count))
        }))
        .field(scalar::<Term, _>(
            "description",
            TypeRef::named(TypeRef::STRING),
            |t| string(&t.description),
        ))
        .field(scalar::<Term, _>(
            "taxonomyName",
            TypeRef::named_nn(TypeRef::STRING),
            |t| string(&t.taxonomy),
        ))
        .field(node_ref::<Term, _>(
            "parent",
            TypeRef::named(TERM_NODE),
            |t| t.parent_id.map(|id| (EntityKind::Term, id.to_string())),
        ))
        .field(connection_field::<Posts, _>(
            "contentNodes",
            "ContentNodeConnection",
            |parent, filter| {
                if let Some(Node::Term(term)) = parent {
                    filter.term_id = Some(term.id);
                }
            },
        ))
}

pub fn user_object() -> Object {
    Object::new("User")
        .description("A User object")
        .implement(NODE)
        .implement(COMMENTER)
        .field(id_field())
        .field(database_id_field())
        .field(scalar::<User, _>("name", TypeRef::named(TypeRef::STRING), |u| {
            string(&u.display_name)
        }))
        .field(scalar::<User, _>("username", TypeRef::named(TypeRef::STRING), |u| {
            string(&u.login)
        }))
        .field(scalar::<User, _>("nicename", TypeRef::named(TypeRef::STRING), |u| {
            string(&u.nicename)
        }))
        .field(scalar::<User, _>("email", TypeRef::named(TypeRef::STRING), |u| {
            string(&u.email)
        }))
        .field(scalar::<User, _>("url", TypeRef::named(TypeRef::STRING), |u| {
            Some(u.url.as_str())
                .filter(|url| !url.is_empty())
                .map(Value::from)
        }))
        .field(scalar::<User, _>(
            "registeredDate",
            TypeRef::named(TypeRef::STRING),
            |u| Some(Value::from(u.registered.format(DATE_FORMAT).to_string())),
        ))
        .field(scalar::<User, _>(
            "roles",
            TypeRef::named_nn_list_nn(TypeRef::STRING),
            |u| Some(string_list(&u.roles)),
        ))
        .field(connection_field::<Posts, _>(
            "contentNodes",
            "ContentNodeConnection",
            |parent, filter| {
                if let Some(Node::User(user)) = parent {
                    filter.author = Some(user.id);
                }
            },
        ))
        .field(connection_field::<Comments, _>(
            "comments",
            "CommentConnection",
            |parent, filter| {
                if let Some(Node::User(user)) = parent {
                    filter.author_id = Some(user.id);
                }
            },
        ))
}

pub fn comment_object() -> Object {
    Object::new("Comment")
        .description("A Comment object")
        .implement(NODE)
        .field(id_field())
        .field(database_id_field())
        .field(scalar::<Comment, _>("content", TypeRef::named(TypeRef::STRING), |c| {
            string(&c.content)
        }))
        .field(scalar::<Comment, _>("date", TypeRef::named(TypeRef::STRING), |c| {
            Some(Value::from(c.date.format(DATE_FORMAT).to_string()))
        }))
        .field(scalar::<Comment, _>("status", TypeRef::named(TypeRef::STRING), |c| {
            string(c.status.as_str())
        }))
        .field(node_ref::<Comment, _>(
            "author",
            TypeRef::named(COMMENTER),
            |c| match c.author_id {
                Some(user_id) => Some((EntityKind::User, user_id.to_string())),
                None => Some((EntityKind::CommentAuthor, c.id.to_string())),
            },
        ))
        .field(node_ref::<Comment, _>(
            "commentedOn",
            TypeRef::named(CONTENT_NODE),
            |c| Some((EntityKind::Post, c.post_id.to_string())),
        ))
        .field(node_ref::<Comment, _>(
            "parent",
            TypeRef::named("Comment"),
            |c| c.parent_id.map(|id| (EntityKind::Comment, id.to_string())),
        ))
        .field(connection_field::<Comments, _>(
            "replies",
            "CommentConnection",
            |parent, filter| {
                if let Some(Node::Comment(comment)) = parent {
                    filter.parent = Some(comment.id);
                    filter.content_id = Some(comment.post_id);
                }
            },
        ))
}

pub fn comment_author_object() -> Object {
    Object::new("CommentAuthor")
        .description("A Comment Author object")
        .implement(NODE)
        .implement(COMMENTER)
        .field(id_field())
        .field(database_id_field())
        .field(scalar::<CommentAuthor, _>(
            "name",
            TypeRef::named(TypeRef::STRING),
            |a| string(&a.name),
        ))
        .field(scalar::<CommentAuthor, _>(
            "email",
            TypeRef::named(TypeRef::STRING),
            |a| string(&a.email),
        ))
        .field(scalar::<CommentAuthor, _>(
            "url",
            TypeRef::named(TypeRef::STRING),
            |a| optional(&a.url),
        ))
}

pub fn plugin_object() -> Object {
    Object::new("Plugin")
        .description("An plugin object")
        .implement(NODE)
        .field(id_field())
        .field(scalar::<Plugin, _>("name", TypeRef::named(TypeRef::STRING), |p| {
            string(&p.name)
        }))
        .field(scalar::<Plugin, _>("path", TypeRef::named(TypeRef::STRING), |p| {
            string(&p.path)
        }))
        .field(scalar::<Plugin, _>("version", TypeRef::named(TypeRef::STRING), |p| {
            optional(&p.version)
        }))
        .field(scalar::<Plugin, _>(
            "description",
            TypeRef::named(TypeRef::STRING),
            |p| string(&p.description),
        ))
        .field(scalar::<Plugin, _>(
            "isActive",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |p| Some(Value::from(p.active)),
        ))
}

pub fn theme_object() -> Object {
    Object::new("Theme")
        .description("A theme object")
        .implement(NODE)
        .field(id_field())
        .field(scalar::<Theme, _>("name", TypeRef::named(TypeRef::STRING), |t| {
            string(&t.name)
        }))
        .field(scalar::<Theme, _>("slug", TypeRef::named(TypeRef::STRING), |t| {
            string(&t.stylesheet)
        }))
        .field(scalar::<Theme, _>("version", TypeRef::named(TypeRef::STRING), |t| {
            optional(&t.version)
        }))
        .field(scalar::<Theme, _>(
            "description",
            TypeRef::named(TypeRef::STRING),
            |t| string(&t.description),
        ))
}

pub fn menu_object() -> Object {
    Object::new("Menu")
        .description("Menus are the containers for navigation items.")
        .implement(NODE)
        .field(id_field())
        .field(database_id_field())
        .field(scalar::<Menu, _>("name", TypeRef::named(TypeRef::STRING), |m| {
            string(&m.name)
        }))
        .field(scalar::<Menu, _>("slug", TypeRef::named(TypeRef::STRING), |m| {
            string(&m.slug)
        }))
        .field(scalar::<Menu, _>(
            "locations",
            TypeRef::named_nn_list_nn(TypeRef::STRING),
            |m| Some(string_list(&m.locations)),
        ))
}

pub fn taxonomy_type_object() -> Object {
    Object::new("Taxonomy")
        .description("A taxonomy object")
        .implement(NODE)
        .field(id_field())
        .field(scalar::<Taxonomy, _>("name", TypeRef::named(TypeRef::STRING), |t| {
            string(&t.name)
        }))
        .field(scalar::<Taxonomy, _>(
            "graphqlSingleName",
            TypeRef::named(TypeRef::STRING),
            |t| string(&t.graphql_single_name),
        ))
        .field(scalar::<Taxonomy, _>(
            "graphqlPluralName",
            TypeRef::named(TypeRef::STRING),
            |t| string(&t.graphql_plural_name),
        ))
        .field(scalar::<Taxonomy, _>(
            "hierarchical",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |t| Some(Value::from(t.hierarchical)),
        ))
        .field(scalar::<Taxonomy, _>(
            "public",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |t| Some(Value::from(t.public)),
        ))
        .field(scalar::<Taxonomy, _>(
            "connectedContentTypes",
            TypeRef::named_nn_list_nn(TypeRef::STRING),
            |t| Some(string_list(&t.object_types)),
        ))
        .field(connection_field::<Terms, _>(
            "terms",
            "TermNodeConnection",
            |parent, filter| {
                if let Some(Node::Taxonomy(taxonomy)) = parent {
                    filter.taxonomies = vec![taxonomy.name.clone()];
                }
            },
        ))
}

pub fn content_type_type_object() -> Object {
    Object::new("ContentType")
        .description("An Post Type object")
        .implement(NODE)
        .field(id_field())
        .field(scalar::<ContentType, _>(
            "name",
            TypeRef::named(TypeRef::STRING),
            |t| string(&t.name),
        ))
        .field(scalar::<ContentType, _>(
            "graphqlSingleName",
            TypeRef::named(TypeRef::STRING),
            |t| string(&t.graphql_single_name),
        ))
        .field(scalar::<ContentType, _>(
            "graphqlPluralName",
            TypeRef::named(TypeRef::STRING),
            |t| string(&t.graphql_plural_name),
        ))
        .field(scalar::<ContentType, _>(
            "hierarchical",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |t| Some(Value::from(t.hierarchical)),
        ))
        .field(scalar::<ContentType, _>(
            "public",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |t| Some(Value::from(t.public)),
        ))
        .field(scalar::<ContentType, _>(
            "hasArchive",
            TypeRef::named_nn(TypeRef::BOOLEAN),
            |t| Some(Value::from(t.has_archive.is_some())),
        ))
        .field(scalar::<ContentType, _>(
            "archivePath",
            TypeRef::named(TypeRef::STRING),
            |t| {
                t.has_archive
                    .as_deref()
                    .map(|slug| Value::from(format!("/{}/", slug.trim_matches('/'))))
            },
        ))
        .field(connection_field::<Posts, _>(
            "contentNodes",
            "ContentNodeConnection",
            |parent, filter| {
                if let Some(Node::ContentType(content_type)) = parent {
                    filter.content_types = vec![content_type.name.clone()];
                }
            },
        ))
}

pub fn user_role_object() -> Object {
    Object::new("UserRole")
        .description("A user role object")
        .implement(NODE)
        .field(id_field())
        .field(scalar::<UserRole, _>("name", TypeRef::named(TypeRef::STRING), |r| {
            string(&r.name)
        }))
        .field(scalar::<UserRole, _>(
            "displayName",
            TypeRef::named(TypeRef::STRING),
            |r| string(&r.display_name),
        ))
        .field(scalar::<UserRole, _>(
            "capabilities",
            TypeRef::named_nn_list_nn(TypeRef::STRING),
            |r| Some(string_list(&r.capabilities)),
        ))
}

/// ``EnqueuedScript`` or ``EnqueuedStylesheet``
pub fn dependency_object(name: &str) -> Object {
    Object::new(name)
        .implement(NODE)
        .implement(ENQUEUED_ASSET)
        .field(id_field())
        .field(scalar::<Dependency, _>(
            "handle",
            TypeRef::named(TypeRef::STRING),
            |d| string(&d.handle),
        ))
        .field(scalar::<Dependency, _>(
            "src",
            TypeRef::named(TypeRef::STRING),
            |d| optional(&d.src),
        ))
        .field(scalar::<Dependency, _>(
            "version",
            TypeRef::named(TypeRef::STRING),
            |d| optional(&d.version),
        ))
        .field(scalar::<Dependency, _>(
            "dependencies",
            TypeRef::named_nn_list_nn(TypeRef::STRING),
            |d| Some(string_list(&d.dependencies)),
        ))
}
