//! Snapshots of the entities the content store hands out.
//!
//! These are plain data. Nothing here writes back to the store.
use chrono::NaiveDateTime;
use serde::Deserialize;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    Trash,
    #[serde(rename = "auto-draft")]
    AutoDraft,
    Inherit,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Future => "future",
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Private => "private",
            Self::Trash => "trash",
            Self::AutoDraft => "auto-draft",
            Self::Inherit => "inherit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.to_ascii_lowercase().replace('_', "-").as_str() {
            "publish" => Self::Publish,
            "future" => Self::Future,
            "draft" => Self::Draft,
            "pending" => Self::Pending,
            "private" => Self::Private,
            "trash" => Self::Trash,
            "auto-draft" => Self::AutoDraft,
            "inherit" => Self::Inherit,
            _ => return None,
        })
    }
}

/// The user currently holding the edit lock and when they took it
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct EditLock {
    pub timestamp: i64,
    pub user_id: i64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Post {
    pub id: i64,
    pub post_type: String,
    #[serde(default)]
    pub title: String,
    pub slug: String,
    pub status: PostStatus,
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub date: NaiveDateTime,
    #[serde(default)]
    pub modified: Option<NaiveDateTime>,
    #[serde(default)]
    pub menu_order: i64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub last_editor_id: Option<i64>,
    #[serde(default)]
    pub edit_lock: Option<EditLock>,
    #[serde(default)]
    pub term_ids: Vec<i64>,
}

impl Post {
    pub fn is_revision(&self) -> bool {
        self.post_type == "revision"
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Term {
    pub id: i64,
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub count: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub nicename: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub url: String,
    pub registered: NaiveDateTime,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    Approve,
    Hold,
    Spam,
    Trash,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Hold => "HOLD",
            Self::Spam => "SPAM",
            Self::Trash => "TRASH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value.to_ascii_uppercase().as_str() {
            "APPROVE" => Self::Approve,
            "HOLD" => Self::Hold,
            "SPAM" => Self::Spam,
            "TRASH" => Self::Trash,
            _ => return None,
        })
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    /// ``None`` for guest comments, see [`CommentAuthor`]
    #[serde(default)]
    pub author_id: Option<i64>,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub author_url: Option<String>,
    pub content: String,
    pub date: NaiveDateTime,
    pub status: CommentStatus,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// The author of a guest comment. Its id is the id of the comment.
#[derive(Clone, Debug)]
pub struct CommentAuthor {
    pub comment_id: i64,
    pub name: String,
    pub email: String,
    pub url: Option<String>,
}

impl From<&Comment> for CommentAuthor {
    fn from(comment: &Comment) -> Self {
        Self {
            comment_id: comment.id,
            name: comment.author_name.clone(),
            email: comment.author_email.clone(),
            url: comment.author_url.clone(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Plugin {
    /// Path of the plugin file relative to the plugin directory
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Theme {
    pub stylesheet: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ContentType {
    pub name: String,
    pub graphql_single_name: String,
    pub graphql_plural_name: String,
    #[serde(default)]
    pub hierarchical: bool,
    #[serde(default = "default_true")]
    pub public: bool,
    /// The archive slug, if the type has an archive
    #[serde(default)]
    pub has_archive: Option<String>,
    /// Path prefix of single items, e.g. ``book`` for ``/book/dune``
    #[serde(default)]
    pub rewrite_slug: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Taxonomy {
    pub name: String,
    pub graphql_single_name: String,
    pub graphql_plural_name: String,
    #[serde(default)]
    pub hierarchical: bool,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub rewrite_slug: Option<String>,
    #[serde(default)]
    pub object_types: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct UserRole {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Script,
    Stylesheet,
}

/// An enqueued script or stylesheet
#[derive(Deserialize, Clone, Debug)]
pub struct Dependency {
    pub handle: String,
    pub kind: DependencyKind,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

fn default_true() -> bool {
    true
}
