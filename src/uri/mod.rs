//! Resolves a URI of the site to the node it shows
//!
//! Candidates are tried in a fixed order and the first one the viewer may
//! read wins: query variables, the front page, content type archives,
//! single posts, term archives, author archives and finally date archives.
use futures::future::FutureExt;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use url::Url;

use crate::{
    context::RequestContext,
    fallible::ResolveResult,
    loader::Deferred,
    node::{EntityKind, Node, Post, PostStatus, Term, User},
    store::{
        Criteria, FrontPage, Order, OrderBy, OrderField, PageDirection, PostCriteria,
        SortDirection, StoreQuery, TermCriteria, UserCriteria,
    },
};

mod permalink;

pub use permalink::{Permalink, PermalinkMatch};

lazy_static! {
    static ref PAGINATION: Regex = Regex::new(r"^(?:(.*)/)?page/\d+$").unwrap();
    static ref DATE_ARCHIVE: Regex =
        Regex::new(r"^(\d{4})(?:/(\d{1,2})(?:/(\d{1,2}))?)?$").unwrap();
}

/// The type whose date archives and post listing the site front page shows
const POST_TYPE: &str = "post";

/// Statuses a post reached by its path may have. Whether the viewer may
/// actually see it is left to the loader.
const ROUTABLE_STATUSES: [PostStatus; 5] = [
    PostStatus::Publish,
    PostStatus::Private,
    PostStatus::Future,
    PostStatus::Draft,
    PostStatus::Pending,
];

/// A URI split into its path and query
struct Route {
    /// Without leading and trailing slashes
    path: String,
    /// [`Route::path`] without a ``page/N`` suffix
    archive_path: String,
    query: Vec<(String, String)>,
}

impl Route {
    fn parse(uri: &str) -> Option<Self> {
        let url = match Url::parse(uri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Url::parse("http://localhost/").ok()?.join(uri).ok()?
            }
            Err(e) => {
                debug!("{} is not a valid uri: {}", uri, e);
                return None;
            }
        };

        let path = url.path().trim_matches('/').to_string();
        let archive_path = match PAGINATION.captures(&path) {
            Some(captures) => captures
                .get(1)
                .map_or("", |m| m.as_str())
                .trim_matches('/')
                .to_string(),
            None => path.clone(),
        };

        Some(Self {
            path,
            archive_path,
            query: url.query_pairs().into_owned().collect(),
        })
    }

    fn query_id(&self, names: &[&str]) -> Option<i64> {
        self.query
            .iter()
            .find(|(name, _)| names.contains(&name.as_str()))
            .and_then(|(_, value)| value.parse().ok())
    }
}

/// Resolves ``uri`` to the node it shows, or ``None`` when nothing matches
/// or the viewer may not see what matched.
pub fn resolve_uri<'a>(ctx: &'a RequestContext, uri: &str) -> Deferred<'a> {
    let uri = uri.to_string();
    async move {
        let route = match Route::parse(&uri) {
            Some(route) => route,
            None => return Ok(None),
        };
        UriResolver { ctx }.resolve(&route).await
    }
    .boxed()
}

struct UriResolver<'a> {
    ctx: &'a RequestContext,
}

impl UriResolver<'_> {
    async fn resolve(&self, route: &Route) -> ResolveResult<Option<Node>> {
        if let Some(node) = self.by_query(route).await? {
            return Ok(Some(node));
        }

        if route.archive_path.is_empty() {
            return self.front_page().await;
        }

        if let Some(node) = self.content_type_archive(route).await? {
            return Ok(Some(node));
        }
        if let Some(node) = self.post_by_path(&route.path).await? {
            return Ok(Some(node));
        }
        if let Some(node) = self.term_by_path(&route.archive_path).await? {
            return Ok(Some(node));
        }
        if let Some(node) = self.author(&route.archive_path).await? {
            return Ok(Some(node));
        }
        self.date_archive(&route.archive_path).await
    }

    async fn by_query(&self, route: &Route) -> ResolveResult<Option<Node>> {
        let lookups = [
            (EntityKind::Post, &["p", "page_id"][..]),
            (EntityKind::Term, &["cat", "tag_id"][..]),
            (EntityKind::User, &["author"][..]),
        ];
        for (kind, names) in lookups {
            if let Some(id) = route.query_id(names) {
                debug!("Resolving uri through query var to {} {}", kind, id);
                return self.ctx.load_deferred(kind, id.to_string()).await;
            }
        }
        Ok(None)
    }

    async fn front_page(&self) -> ResolveResult<Option<Node>> {
        let settings = &self.ctx.registry().settings;
        match (settings.show_on_front, settings.page_on_front) {
            (FrontPage::Page, Some(page_id)) => {
                self.ctx
                    .load_deferred(EntityKind::Post, page_id.to_string())
                    .await
            }
            _ => {
                self.ctx
                    .load_deferred(EntityKind::ContentType, POST_TYPE)
                    .await
            }
        }
    }

    async fn content_type_archive(&self, route: &Route) -> ResolveResult<Option<Node>> {
        let archive = self.ctx.registry().content_types.iter().find(|t| {
            t.has_archive
                .as_deref()
                .map(|slug| slug.trim_matches('/'))
                == Some(route.archive_path.as_str())
        });
        match archive {
            Some(content_type) => {
                self.ctx
                    .load_deferred(EntityKind::ContentType, content_type.name.clone())
                    .await
            }
            None => Ok(None),
        }
    }

    async fn post_by_path(&self, path: &str) -> ResolveResult<Option<Node>> {
        let registry = self.ctx.registry();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        // types living under their own prefix, e.g. /book/dune
        for content_type in &registry.content_types {
            let prefix = match &content_type.rewrite_slug {
                Some(prefix) if content_type.name != POST_TYPE => prefix.trim_matches('/'),
                _ => continue,
            };
            let rest = match strip_segments(&segments, prefix) {
                Some(rest) if !rest.is_empty() => rest,
                _ => continue,
            };
            if !content_type.hierarchical && rest.len() > 1 {
                continue;
            }
            if let Some(post) = self.post_by_ancestry(&content_type.name, rest).await? {
                if let Some(node) = self.readable_post(post.id).await? {
                    return Ok(Some(node));
                }
            }
        }

        // hierarchical types without a prefix, i.e. pages
        for content_type in registry
            .content_types
            .iter()
            .filter(|t| t.hierarchical && t.rewrite_slug.is_none())
        {
            if let Some(post) = self.post_by_ancestry(&content_type.name, &segments).await? {
                if let Some(node) = self.readable_post(post.id).await? {
                    return Ok(Some(node));
                }
            }
        }

        let permalink = match Permalink::compile(&registry.settings.permalink_structure) {
            Some(permalink) => permalink,
            None => return Ok(None),
        };
        let found = match permalink.captures(path) {
            Some(found) => found,
            None => return Ok(None),
        };

        let criteria = PostCriteria {
            content_types: vec![POST_TYPE.to_string()],
            statuses: ROUTABLE_STATUSES.to_vec(),
            name: found.post_name.clone(),
            include: found.post_id.into_iter().collect(),
            ..PostCriteria::default()
        };
        for post in self.posts(criteria, 10).await? {
            if self.permalink_agrees(&found, &post).await? {
                if let Some(node) = self.readable_post(post.id).await? {
                    return Ok(Some(node));
                }
            }
        }
        Ok(None)
    }

    /// Checks the parts of a permalink that do not select the post itself
    async fn permalink_agrees(&self, found: &PermalinkMatch, post: &Post) -> ResolveResult<bool> {
        if !found.matches_date(&post.date) {
            return Ok(false);
        }

        if let Some(slug) = found.category_slug() {
            let criteria = TermCriteria {
                taxonomies: vec!["category".to_string()],
                slug: vec![slug.to_string()],
                ..TermCriteria::default()
            };
            let categories = self.terms(criteria, 10).await?;
            if !categories.iter().any(|t| post.term_ids.contains(&t.id)) {
                return Ok(false);
            }
        }

        if let Some(nicename) = &found.author {
            let author = self.user_by_nicename(nicename).await?;
            if post.author_id.is_none() || author.map(|u| u.id) != post.author_id {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Finds the post of ``content_type`` at ``segments``, the slugs of its
    /// ancestors followed by its own
    async fn post_by_ancestry(
        &self,
        content_type: &str,
        segments: &[&str],
    ) -> ResolveResult<Option<Post>> {
        let (slug, ancestors) = match segments.split_last() {
            Some(split) => split,
            None => return Ok(None),
        };

        let candidates = self
            .posts(
                PostCriteria {
                    content_types: vec![content_type.to_string()],
                    statuses: ROUTABLE_STATUSES.to_vec(),
                    name: Some(slug.to_string()),
                    ..PostCriteria::default()
                },
                100,
            )
            .await?;

        'candidates: for candidate in candidates {
            let mut parent_id = candidate.parent_id;
            for ancestor in ancestors.iter().rev() {
                let parent = match parent_id {
                    Some(id) => self.post_by_id(content_type, id).await?,
                    None => None,
                };
                match parent {
                    Some(parent) if parent.slug == *ancestor => parent_id = parent.parent_id,
                    _ => continue 'candidates,
                }
            }
            if parent_id.is_none() {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    async fn post_by_id(&self, content_type: &str, id: i64) -> ResolveResult<Option<Post>> {
        let criteria = PostCriteria {
            content_types: vec![content_type.to_string()],
            statuses: ROUTABLE_STATUSES.to_vec(),
            include: vec![id],
            ..PostCriteria::default()
        };
        Ok(self.posts(criteria, 1).await?.into_iter().next())
    }

    async fn readable_post(&self, id: i64) -> ResolveResult<Option<Node>> {
        self.ctx.load_deferred(EntityKind::Post, id.to_string()).await
    }

    async fn term_by_path(&self, path: &str) -> ResolveResult<Option<Node>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        for taxonomy in self.ctx.registry().taxonomies.iter().filter(|t| t.public) {
            let base = match &taxonomy.rewrite_slug {
                Some(base) => base.trim_matches('/'),
                None => continue,
            };
            let rest = match strip_segments(&segments, base) {
                Some(rest) if !rest.is_empty() => rest,
                _ => continue,
            };
            if !taxonomy.hierarchical && rest.len() > 1 {
                continue;
            }
            let (slug, ancestors) = match rest.split_last() {
                Some(split) => split,
                None => continue,
            };

            let candidates = self
                .terms(
                    TermCriteria {
                        taxonomies: vec![taxonomy.name.clone()],
                        slug: vec![slug.to_string()],
                        ..TermCriteria::default()
                    },
                    100,
                )
                .await?;

            'candidates: for candidate in candidates {
                let mut parent_id = candidate.parent_id;
                for ancestor in ancestors.iter().rev() {
                    let parent = match parent_id {
                        Some(id) => self.term_by_id(&taxonomy.name, id).await?,
                        None => None,
                    };
                    match parent {
                        Some(parent) if parent.slug == *ancestor => parent_id = parent.parent_id,
                        _ => continue 'candidates,
                    }
                }
                // a child term may also be reached by its own slug alone
                if ancestors.is_empty() || parent_id.is_none() {
                    if let Some(node) = self
                        .ctx
                        .load_deferred(EntityKind::Term, candidate.id.to_string())
                        .await?
                    {
                        return Ok(Some(node));
                    }
                }
            }
        }
        Ok(None)
    }

    async fn term_by_id(&self, taxonomy: &str, id: i64) -> ResolveResult<Option<Term>> {
        let criteria = TermCriteria {
            taxonomies: vec![taxonomy.to_string()],
            include: vec![id],
            ..TermCriteria::default()
        };
        Ok(self.terms(criteria, 1).await?.into_iter().next())
    }

    async fn author(&self, path: &str) -> ResolveResult<Option<Node>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let base = self.ctx.registry().settings.author_base.trim_matches('/');

        let nicename = match strip_segments(&segments, base) {
            Some([nicename]) => *nicename,
            _ => return Ok(None),
        };
        match self.user_by_nicename(nicename).await? {
            Some(user) => {
                self.ctx
                    .load_deferred(EntityKind::User, user.id.to_string())
                    .await
            }
            None => Ok(None),
        }
    }

    async fn date_archive(&self, path: &str) -> ResolveResult<Option<Node>> {
        let captures = match DATE_ARCHIVE.captures(path) {
            Some(captures) => captures,
            None => return Ok(None),
        };
        let in_range = |index: usize, max: u32| match captures.get(index) {
            Some(m) => matches!(m.as_str().parse::<u32>(), Ok(n) if (1..=max).contains(&n)),
            None => true,
        };
        if !in_range(2, 12) || !in_range(3, 31) {
            return Ok(None);
        }

        self.ctx
            .load_deferred(EntityKind::ContentType, POST_TYPE)
            .await
    }

    async fn user_by_nicename(&self, nicename: &str) -> ResolveResult<Option<User>> {
        let query = lookup_query(
            EntityKind::User,
            Criteria::Users(UserCriteria {
                nicename: Some(nicename.to_string()),
                ..UserCriteria::default()
            }),
            1,
        );
        Ok(self
            .ctx
            .query(&query)
            .await?
            .into_iter()
            .find_map(|node| match node {
                Node::User(user) => Some(user),
                _ => None,
            }))
    }

    async fn posts(&self, criteria: PostCriteria, limit: usize) -> ResolveResult<Vec<Post>> {
        let query = lookup_query(EntityKind::Post, Criteria::Posts(criteria), limit);
        Ok(self
            .ctx
            .query(&query)
            .await?
            .into_iter()
            .filter_map(|node| match node {
                Node::Post(post) => Some(post),
                _ => None,
            })
            .collect())
    }

    async fn terms(&self, criteria: TermCriteria, limit: usize) -> ResolveResult<Vec<Term>> {
        let query = lookup_query(EntityKind::Term, Criteria::Terms(criteria), limit);
        Ok(self
            .ctx
            .query(&query)
            .await?
            .into_iter()
            .filter_map(|node| match node {
                Node::Term(term) => Some(term),
                _ => None,
            })
            .collect())
    }
}

/// Lookups by slug prefer the oldest entry
fn lookup_query(kind: EntityKind, criteria: Criteria, limit: usize) -> StoreQuery {
    StoreQuery {
        kind,
        criteria,
        order: OrderBy::new(Order::new(OrderField::Id, SortDirection::Asc)),
        position: None,
        direction: PageDirection::Forward,
        limit,
    }
}

/// Strips the segments of ``prefix`` from the front of ``segments``
fn strip_segments<'s, 'p>(segments: &'s [&'p str], prefix: &str) -> Option<&'s [&'p str]> {
    let prefix: Vec<&str> = prefix.split('/').filter(|s| !s.is_empty()).collect();
    if prefix.is_empty() || segments.len() < prefix.len() {
        return None;
    }
    let (head, rest) = segments.split_at(prefix.len());
    if head == prefix.as_slice() {
        Some(rest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_strips_host_and_pagination() {
        let route = Route::parse("https://example.com/category/news/page/2/").unwrap();
        assert_eq!(route.path, "category/news/page/2");
        assert_eq!(route.archive_path, "category/news");

        let route = Route::parse("/?p=42").unwrap();
        assert_eq!(route.path, "");
        assert_eq!(route.query_id(&["p", "page_id"]), Some(42));

        let route = Route::parse("about/team").unwrap();
        assert_eq!(route.path, "about/team");
    }

    #[test]
    fn test_front_page_pagination() {
        let route = Route::parse("/page/3/").unwrap();
        assert_eq!(route.archive_path, "");

        // only a whole ``page`` segment counts
        let route = Route::parse("/homepage/2/").unwrap();
        assert_eq!(route.archive_path, "homepage/2");
    }

    #[test]
    fn test_strip_segments() {
        let segments = ["book", "dune"];
        assert_eq!(strip_segments(&segments, "book"), Some(&["dune"][..]));
        assert_eq!(strip_segments(&segments, "/book/"), Some(&["dune"][..]));
        assert_eq!(strip_segments(&segments, "movie"), None);
        assert_eq!(strip_segments(&segments, ""), None);
    }
}
