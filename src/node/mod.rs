//! Nodes
//!
//! A [`Node`] is everything that can be fetched by a global ID. The enum is
//! closed; external types only take part through the hooks of the
//! [`NodeTypeResolver`].
use std::{fmt, str::FromStr};

use futures::future::{self, FutureExt};
use log::debug;

use crate::{
    connection::cursor::SortKey,
    context::RequestContext,
    fallible::ResolveError,
    graphql::id::{self, GlobalId},
    loader::Deferred,
    store::OrderField,
};

pub mod model;
mod type_resolver;

pub use model::*;
pub use type_resolver::{NodeTypeHook, NodeTypeResolver};
pub(crate) use type_resolver::ucfirst;

/// The kind of an entity. It doubles as the loader key and as the ``type``
/// part of a global ID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
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
    EnqueuedScript,
    EnqueuedStylesheet,
}

impl EntityKind {
    pub const ALL: [EntityKind; 13] = [
        Self::Post,
        Self::Term,
        Self::User,
        Self::Comment,
        Self::CommentAuthor,
        Self::Plugin,
        Self::Theme,
        Self::Menu,
        Self::Taxonomy,
        Self::ContentType,
        Self::UserRole,
        Self::EnqueuedScript,
        Self::EnqueuedStylesheet,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Term => "term",
            Self::User => "user",
            Self::Comment => "comment",
            Self::CommentAuthor => "comment_author",
            Self::Plugin => "plugin",
            Self::Theme => "theme",
            Self::Menu => "nav_menu",
            Self::Taxonomy => "taxonomy",
            Self::ContentType => "post_type",
            Self::UserRole => "user_role",
            Self::EnqueuedScript => "enqueued_script",
            Self::EnqueuedStylesheet => "enqueued_stylesheet",
        }
    }
}

impl EntityKind {
    /// Whether the native ids of the kind are database integers
    pub fn has_numeric_ids(&self) -> bool {
        matches!(
            self,
            Self::Post | Self::Term | Self::User | Self::Comment | Self::CommentAuthor | Self::Menu
        )
    }

    /// The form [`Node::key`] gives ``id``, so ``01`` and ``1`` share a
    /// loader entry
    pub fn canonical_id(&self, id: &str) -> String {
        match id.parse::<i64>() {
            Ok(number) if self.has_numeric_ids() => number.to_string(),
            _ => id.to_string(),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown entity kind `{0}`")]
pub struct UnknownKind(pub String);

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| UnknownKind(tag.to_string()))
    }
}

#[derive(Clone, Debug)]
pub enum Node {
    Post(Post),
    Term(Term),
    User(User),
    Comment(Comment),
    CommentAuthor(CommentAuthor),
    Plugin(Plugin),
    Theme(Theme),
    Menu(Menu),
    Taxonomy(Taxonomy),
    ContentType(ContentType),
    UserRole(UserRole),
    Dependency(Dependency),
}

impl Node {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Post(_) => EntityKind::Post,
            Self::Term(_) => EntityKind::Term,
            Self::User(_) => EntityKind::User,
            Self::Comment(_) => EntityKind::Comment,
            Self::CommentAuthor(_) => EntityKind::CommentAuthor,
            Self::Plugin(_) => EntityKind::Plugin,
            Self::Theme(_) => EntityKind::Theme,
            Self::Menu(_) => EntityKind::Menu,
            Self::Taxonomy(_) => EntityKind::Taxonomy,
            Self::ContentType(_) => EntityKind::ContentType,
            Self::UserRole(_) => EntityKind::UserRole,
            Self::Dependency(d) => match d.kind {
                DependencyKind::Script => EntityKind::EnqueuedScript,
                DependencyKind::Stylesheet => EntityKind::EnqueuedStylesheet,
            },
        }
    }

    /// The native id, as the loader of [`Node::kind`] expects it
    pub fn key(&self) -> String {
        match self {
            Self::Post(p) => p.id.to_string(),
            Self::Term(t) => t.id.to_string(),
            Self::User(u) => u.id.to_string(),
            Self::Comment(c) => c.id.to_string(),
            Self::CommentAuthor(a) => a.comment_id.to_string(),
            Self::Plugin(p) => p.path.clone(),
            Self::Theme(t) => t.stylesheet.clone(),
            Self::Menu(m) => m.id.to_string(),
            Self::Taxonomy(t) => t.name.clone(),
            Self::ContentType(t) => t.name.clone(),
            Self::UserRole(r) => r.name.clone(),
            Self::Dependency(d) => d.handle.clone(),
        }
    }

    pub fn global_id(&self) -> String {
        id::encode(self.kind().tag(), &self.key())
    }

    pub fn database_id(&self) -> Option<i64> {
        match self {
            Self::Post(p) => Some(p.id),
            Self::Term(t) => Some(t.id),
            Self::User(u) => Some(u.id),
            Self::Comment(c) => Some(c.id),
            Self::CommentAuthor(a) => Some(a.comment_id),
            Self::Menu(m) => Some(m.id),
            _ => None,
        }
    }

    /// Tie breaker of every ordering: numeric ids compare as numbers
    pub fn sort_id(&self) -> SortKey {
        match self.database_id() {
            Some(id) => SortKey::Int(id),
            None => SortKey::Text(self.key()),
        }
    }

    pub fn sort_key(&self, field: OrderField) -> SortKey {
        let date = |d: &chrono::NaiveDateTime| SortKey::Text(d.format("%Y-%m-%dT%H:%M:%S").to_string());
        match (self, field) {
            (Self::Post(p), OrderField::Date) => date(&p.date),
            (Self::Post(p), OrderField::Modified) => date(p.modified.as_ref().unwrap_or(&p.date)),
            (Self::Post(p), OrderField::Title) => SortKey::Text(p.title.to_lowercase()),
            (Self::Post(p), OrderField::MenuOrder) => SortKey::Int(p.menu_order),
            (Self::Post(p), OrderField::Slug) => SortKey::Text(p.slug.clone()),
            (Self::Comment(c), OrderField::Date) => date(&c.date),
            (Self::Term(t), OrderField::Name) => SortKey::Text(t.name.to_lowercase()),
            (Self::Term(t), OrderField::Slug) => SortKey::Text(t.slug.clone()),
            (Self::Term(t), OrderField::Count) => SortKey::Int(t.count),
            (Self::User(u), OrderField::Login) => SortKey::Text(u.login.to_lowercase()),
            (Self::User(u), OrderField::Nicename) => SortKey::Text(u.nicename.clone()),
            (Self::User(u), OrderField::DisplayName | OrderField::Name) => {
                SortKey::Text(u.display_name.to_lowercase())
            }
            (Self::User(u), OrderField::Registered) => date(&u.registered),
            (Self::User(u), OrderField::Email) => SortKey::Text(u.email.to_lowercase()),
            (Self::User(u), OrderField::Url) => SortKey::Text(u.url.clone()),
            (Self::Plugin(p), OrderField::Name) => SortKey::Text(p.name.to_lowercase()),
            (Self::Theme(t), OrderField::Name) => SortKey::Text(t.name.to_lowercase()),
            (Self::UserRole(r), OrderField::Name) => SortKey::Text(r.name.clone()),
            (Self::Menu(m), OrderField::Name) => SortKey::Text(m.name.to_lowercase()),
            _ => self.sort_id(),
        }
    }
}

/// Resolves a global ID to the node it identifies
///
/// Ids of a type without a loader resolve to ``null`` rather than failing,
/// so clients holding ids of types added later keep working.
pub fn resolve_node<'a>(ctx: &'a RequestContext, token: &str) -> Deferred<'a> {
    if token.is_empty() {
        return future::ready(Err(ResolveError::MissingIdentifier)).boxed();
    }

    let GlobalId { type_name, id } = match GlobalId::decode(token) {
        Ok(global_id) => global_id,
        Err(e) => return future::ready(Err(e)).boxed(),
    };

    match type_name.parse::<EntityKind>() {
        Ok(kind) => ctx.load_deferred(kind, id),
        Err(e) => {
            debug!("{}, resolving {} to null", e, token);
            future::ready(Ok(None)).boxed()
        }
    }
}
