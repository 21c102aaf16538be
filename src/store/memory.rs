//! An in-memory [`ContentStore`] seeded from JSON
//!
//! It backs the binary and the tests. The read policy follows the usual
//! content platform rules: published content is public, anything else needs
//! either ownership or a capability.
use std::{collections::BTreeMap, fs, path::Path};

use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;

use super::{
    CommentCriteria, ContentStore, Criteria, PageDirection, PluginCriteria, PluginStatus,
    PostCriteria, Registry, StoreError, StoreQuery, StoreResult, TermCriteria, UserCriteria,
    UserSearchColumn, Viewer,
};
use crate::node::*;

/// The JSON document a [`MemoryStore`] is built from
#[derive(Deserialize, Default)]
pub struct Seed {
    #[serde(default)]
    pub registry: Registry,
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub themes: Vec<Theme>,
    #[serde(default)]
    pub menus: Vec<Menu>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub active_theme: Option<String>,
}

pub struct MemoryStore {
    registry: Registry,
    posts: BTreeMap<i64, Post>,
    terms: BTreeMap<i64, Term>,
    users: BTreeMap<i64, User>,
    comments: BTreeMap<i64, Comment>,
    plugins: BTreeMap<String, Plugin>,
    themes: BTreeMap<String, Theme>,
    menus: BTreeMap<i64, Menu>,
    dependencies: Vec<Dependency>,
    active_theme: Option<String>,
}

impl MemoryStore {
    pub fn new(seed: Seed) -> Self {
        Self {
            registry: seed.registry,
            posts: seed.posts.into_iter().map(|p| (p.id, p)).collect(),
            terms: seed.terms.into_iter().map(|t| (t.id, t)).collect(),
            users: seed.users.into_iter().map(|u| (u.id, u)).collect(),
            comments: seed.comments.into_iter().map(|c| (c.id, c)).collect(),
            plugins: seed.plugins.into_iter().map(|p| (p.path.clone(), p)).collect(),
            themes: seed
                .themes
                .into_iter()
                .map(|t| (t.stylesheet.clone(), t))
                .collect(),
            menus: seed.menus.into_iter().map(|m| (m.id, m)).collect(),
            dependencies: seed.dependencies,
            active_theme: seed.active_theme,
        }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        info!("Reading content from {}", path.display());
        Self::from_json(&fs::read_to_string(path)?)
    }

    fn lookup(&self, kind: EntityKind, id: &str) -> Option<Node> {
        let int_id = || id.parse::<i64>().ok();
        match kind {
            EntityKind::Post => int_id()
                .and_then(|id| self.posts.get(&id))
                .cloned()
                .map(Node::Post),
            EntityKind::Term => int_id()
                .and_then(|id| self.terms.get(&id))
                .cloned()
                .map(Node::Term),
            EntityKind::User => int_id()
                .and_then(|id| self.users.get(&id))
                .cloned()
                .map(Node::User),
            EntityKind::Comment => int_id()
                .and_then(|id| self.comments.get(&id))
                .cloned()
                .map(Node::Comment),
            EntityKind::CommentAuthor => int_id()
                .and_then(|id| self.comments.get(&id))
                .filter(|c| c.author_id.is_none())
                .map(|c| Node::CommentAuthor(c.into())),
            EntityKind::Plugin => self.plugins.get(id).cloned().map(Node::Plugin),
            EntityKind::Theme => self.themes.get(id).cloned().map(Node::Theme),
            EntityKind::Menu => int_id()
                .and_then(|id| self.menus.get(&id))
                .cloned()
                .map(Node::Menu),
            EntityKind::Taxonomy => self.registry.taxonomy(id).cloned().map(Node::Taxonomy),
            EntityKind::ContentType => self
                .registry
                .content_type(id)
                .cloned()
                .map(Node::ContentType),
            EntityKind::UserRole => self.registry.role(id).cloned().map(Node::UserRole),
            EntityKind::EnqueuedScript => self.dependency(DependencyKind::Script, id),
            EntityKind::EnqueuedStylesheet => self.dependency(DependencyKind::Stylesheet, id),
        }
    }

    fn dependency(&self, kind: DependencyKind, handle: &str) -> Option<Node> {
        self.dependencies
            .iter()
            .find(|d| d.kind == kind && d.handle == handle)
            .cloned()
            .map(Node::Dependency)
    }

    fn candidates(&self, kind: EntityKind, criteria: &Criteria) -> StoreResult<Vec<Node>> {
        Ok(match (kind, criteria) {
            (EntityKind::Post, Criteria::Posts(c)) => self
                .posts
                .values()
                .filter(|p| self.post_matches(c, p))
                .cloned()
                .map(Node::Post)
                .collect(),
            (EntityKind::Term, Criteria::Terms(c)) => self
                .terms
                .values()
                .filter(|t| self.term_matches(c, t))
                .cloned()
                .map(Node::Term)
                .collect(),
            (EntityKind::User, Criteria::Users(c)) => self
                .users
                .values()
                .filter(|u| self.user_matches(c, u))
                .cloned()
                .map(Node::User)
                .collect(),
            (EntityKind::Comment, Criteria::Comments(c)) => self
                .comments
                .values()
                .filter(|comment| comment_matches(c, comment))
                .cloned()
                .map(Node::Comment)
                .collect(),
            (EntityKind::Plugin, Criteria::Plugins(c)) => self
                .plugins
                .values()
                .filter(|p| plugin_matches(c, p))
                .cloned()
                .map(Node::Plugin)
                .collect(),
            (EntityKind::Theme, Criteria::Themes) => {
                self.themes.values().cloned().map(Node::Theme).collect()
            }
            (EntityKind::UserRole, Criteria::UserRoles) => self
                .registry
                .roles
                .iter()
                .cloned()
                .map(Node::UserRole)
                .collect(),
            (kind, criteria) => return Err(StoreError::MismatchedCriteria(kind, criteria.name())),
        })
    }

    fn post_matches(&self, c: &PostCriteria, post: &Post) -> bool {
        let type_matches = if c.content_types.is_empty() {
            self.registry
                .public_content_types()
                .any(|t| t.name == post.post_type)
        } else {
            c.content_types.contains(&post.post_type)
        };
        let status_matches = if c.statuses.is_empty() {
            post.status == PostStatus::Publish
        } else {
            c.statuses.contains(&post.status)
        };

        type_matches
            && status_matches
            && c.author.map_or(true, |a| post.author_id == Some(a))
            && parent_matches(c.parent, post.parent_id)
            && (c.include.is_empty() || c.include.contains(&post.id))
            && !c.exclude.contains(&post.id)
            && c.search.as_deref().map_or(true, |s| {
                contains_ignore_case(&post.title, s) || contains_ignore_case(&post.content, s)
            })
            && c.name.as_deref().map_or(true, |name| post.slug == name)
            && c.term_id.map_or(true, |term| post.term_ids.contains(&term))
    }

    fn term_matches(&self, c: &TermCriteria, term: &Term) -> bool {
        (c.taxonomies.is_empty() || c.taxonomies.contains(&term.taxonomy))
            && (c.include.is_empty() || c.include.contains(&term.id))
            && !c.exclude.contains(&term.id)
            && parent_matches(c.parent, term.parent_id)
            && (c.slug.is_empty() || c.slug.contains(&term.slug))
            && c.search
                .as_deref()
                .map_or(true, |s| contains_ignore_case(&term.name, s))
            && (!c.hide_empty || term.count > 0)
            && c.object_id.map_or(true, |post_id| {
                self.posts
                    .get(&post_id)
                    .map_or(false, |p| p.term_ids.contains(&term.id))
            })
    }

    fn user_matches(&self, c: &UserCriteria, user: &User) -> bool {
        let has_role = |role: &String| user.roles.contains(role);
        c.role.as_ref().map_or(true, has_role)
            && (c.role_in.is_empty() || c.role_in.iter().any(has_role))
            && !c.role_not_in.iter().any(has_role)
            && (c.include.is_empty() || c.include.contains(&user.id))
            && !c.exclude.contains(&user.id)
            && c.search.as_deref().map_or(true, |s| {
                // leading and trailing wildcards are implied
                let s = s.trim_matches('*');
                let columns = if c.search_columns.is_empty() {
                    UserSearchColumn::guess(s)
                } else {
                    &c.search_columns[..]
                };
                columns.iter().any(|column| match column {
                    UserSearchColumn::Id => user.id.to_string() == s,
                    UserSearchColumn::Login => contains_ignore_case(&user.login, s),
                    UserSearchColumn::Nicename => contains_ignore_case(&user.nicename, s),
                    UserSearchColumn::DisplayName => contains_ignore_case(&user.display_name, s),
                    UserSearchColumn::Email => contains_ignore_case(&user.email, s),
                    UserSearchColumn::Url => contains_ignore_case(&user.url, s),
                })
            })
            && c.nicename.as_ref().map_or(true, |n| &user.nicename == n)
            && (c.nicename_in.is_empty() || c.nicename_in.contains(&user.nicename))
            && !c.nicename_not_in.contains(&user.nicename)
            && c.login.as_ref().map_or(true, |l| &user.login == l)
            && (c.login_in.is_empty() || c.login_in.contains(&user.login))
            && !c.login_not_in.contains(&user.login)
            && (c.has_published_posts.is_empty()
                || self.has_published_posts(user.id, &c.has_published_posts))
    }

    /// Empty ``content_types`` means any public content type
    fn has_published_posts(&self, user_id: i64, content_types: &[String]) -> bool {
        self.posts.values().any(|p| {
            p.author_id == Some(user_id)
                && p.status == PostStatus::Publish
                && if content_types.is_empty() {
                    self.registry
                        .content_type(&p.post_type)
                        .map_or(false, |t| t.public)
                } else {
                    content_types.contains(&p.post_type)
                }
        })
    }

    fn can_read_post(&self, viewer: &Viewer, post: &Post) -> bool {
        if post.is_revision() {
            let parent_author = post
                .parent_id
                .and_then(|id| self.posts.get(&id))
                .and_then(|p| p.author_id);
            return viewer.can("edit_others_posts") || viewer.is(parent_author);
        }

        match post.status {
            PostStatus::Publish | PostStatus::Inherit => true,
            PostStatus::Private => {
                viewer.is(post.author_id) || viewer.can("read_private_posts")
            }
            PostStatus::Trash => viewer.can("edit_others_posts"),
            PostStatus::Future | PostStatus::Draft | PostStatus::Pending | PostStatus::AutoDraft => {
                viewer.is(post.author_id) || viewer.can("edit_others_posts")
            }
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    fn registry(&self) -> &Registry {
        &self.registry
    }

    async fn get_many(&self, kind: EntityKind, ids: &[String]) -> StoreResult<Vec<Node>> {
        Ok(ids.iter().filter_map(|id| self.lookup(kind, id)).collect())
    }

    async fn query(&self, query: &StoreQuery) -> StoreResult<Vec<Node>> {
        let order = &query.order;
        let mut rows: Vec<_> = self
            .candidates(query.kind, &query.criteria)?
            .into_iter()
            .map(|node| (order.position(&node), node))
            .collect();
        rows.sort_by(|(a, _), (b, _)| order.compare(a, b));

        let backward = query.direction == PageDirection::Backward;
        if backward {
            rows.reverse();
        }

        let rows: Vec<Node> = rows
            .into_iter()
            .filter(|(position, _)| match &query.position {
                None => true,
                Some(at) if backward => order.compare(position, at).is_lt(),
                Some(at) => order.compare(position, at).is_gt(),
            })
            .take(query.limit)
            .map(|(_, node)| node)
            .collect();

        debug!("{} query returned {} row(s)", query.kind, rows.len());
        Ok(rows)
    }

    fn can_read(&self, viewer: &Viewer, node: &Node) -> bool {
        match node {
            Node::Post(post) => self.can_read_post(viewer, post),
            Node::Term(term) => {
                self.registry
                    .taxonomy(&term.taxonomy)
                    .map_or(true, |t| t.public)
                    || viewer.can("manage_categories")
            }
            Node::User(user) => {
                viewer.is(Some(user.id))
                    || viewer.can("list_users")
                    || self.has_published_posts(user.id, &[])
            }
            Node::Comment(comment) => {
                comment.status == CommentStatus::Approve
                    || viewer.can("moderate_comments")
                    || viewer.is(comment.author_id)
            }
            Node::CommentAuthor(author) => {
                viewer.can("moderate_comments")
                    || self
                        .comments
                        .get(&author.comment_id)
                        .map_or(false, |c| c.status == CommentStatus::Approve)
            }
            Node::Plugin(_) => viewer.can("activate_plugins"),
            Node::Theme(theme) => {
                self.active_theme.as_deref() == Some(theme.stylesheet.as_str())
                    || viewer.can("edit_themes")
            }
            Node::Menu(menu) => !menu.locations.is_empty() || viewer.can("edit_theme_options"),
            Node::Taxonomy(taxonomy) => taxonomy.public || viewer.can("manage_options"),
            Node::ContentType(content_type) => {
                content_type.public || viewer.can("manage_options")
            }
            Node::UserRole(_) => viewer.can("list_users"),
            Node::Dependency(_) => true,
        }
    }
}

/// ``Some(0)`` asks for top level entries
fn parent_matches(wanted: Option<i64>, parent_id: Option<i64>) -> bool {
    match wanted {
        None => true,
        Some(0) => parent_id.is_none(),
        Some(id) => parent_id == Some(id),
    }
}

fn comment_matches(c: &CommentCriteria, comment: &Comment) -> bool {
    c.content_id.map_or(true, |id| comment.post_id == id)
        && c.author_id.map_or(true, |id| comment.author_id == Some(id))
        && parent_matches(c.parent, comment.parent_id)
        && comment.status == c.status.unwrap_or(CommentStatus::Approve)
        && (c.include.is_empty() || c.include.contains(&comment.id))
        && !c.exclude.contains(&comment.id)
        && c.search
            .as_deref()
            .map_or(true, |s| contains_ignore_case(&comment.content, s))
}

fn plugin_matches(c: &PluginCriteria, plugin: &Plugin) -> bool {
    c.search.as_deref().map_or(true, |s| {
        contains_ignore_case(&plugin.name, s) || contains_ignore_case(&plugin.description, s)
    }) && c.status.map_or(true, |status| match status {
        PluginStatus::Active => plugin.active,
        PluginStatus::Inactive => !plugin.active,
    })
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
