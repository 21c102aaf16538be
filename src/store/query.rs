use std::{cmp::Ordering, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    connection::cursor::Position,
    node::{CommentStatus, EntityKind, Node, PostStatus},
};

/// An ordered, bounded query against the store
///
/// Rows are ordered as [`OrderBy::compare`] orders their positions. A
/// [`PageDirection::Backward`] query walks that ordering in reverse. Only
/// rows strictly beyond ``position`` in the walked direction are returned,
/// closest first, at most ``limit`` of them.
#[derive(Clone, Debug)]
pub struct StoreQuery {
    pub kind: EntityKind,
    pub criteria: Criteria,
    pub order: OrderBy,
    pub position: Option<Position>,
    pub direction: PageDirection,
    pub limit: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageDirection {
    Forward,
    Backward,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Turns an ascending comparison into one in this direction
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            other => Err(format!("unknown order `{}`, expected ASC or DESC", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderField {
    Id,
    Date,
    Modified,
    Title,
    MenuOrder,
    Name,
    Slug,
    Count,
    Login,
    Nicename,
    DisplayName,
    Email,
    Url,
    Registered,
}

impl FromStr for OrderField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "ID" => Self::Id,
            "DATE" => Self::Date,
            "MODIFIED" => Self::Modified,
            "TITLE" => Self::Title,
            "MENU_ORDER" => Self::MenuOrder,
            "NAME" => Self::Name,
            "SLUG" => Self::Slug,
            "COUNT" => Self::Count,
            "LOGIN" => Self::Login,
            "NICE_NAME" | "NICENAME" => Self::Nicename,
            "DISPLAY_NAME" => Self::DisplayName,
            "EMAIL" => Self::Email,
            "URL" => Self::Url,
            "REGISTERED" => Self::Registered,
            other => return Err(format!("unknown orderby field `{}`", other)),
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Order {
    pub field: OrderField,
    pub direction: SortDirection,
}

impl Order {
    pub const fn new(field: OrderField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// A primary [`Order`] followed by the orders that break its ties
///
/// Rows equal on every field fall back to their id, compared in the
/// direction of the primary order.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    primary: Order,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    then: Vec<Order>,
}

impl OrderBy {
    pub fn new(primary: Order) -> Self {
        Self {
            primary,
            then: Vec::new(),
        }
    }

    /// Adds a tie breaker. Fields that are already ordered by are skipped.
    pub fn then(mut self, order: Order) -> Self {
        if self.orders().all(|o| o.field != order.field) {
            self.then.push(order);
        }
        self
    }

    pub fn primary(&self) -> Order {
        self.primary
    }

    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        std::iter::once(&self.primary).chain(self.then.iter())
    }

    /// Where ``node`` sits in this ordering
    pub fn position(&self, node: &Node) -> Position {
        Position::new(
            self.clone(),
            self.orders().map(|o| node.sort_key(o.field)).collect(),
            node.sort_id(),
        )
    }

    pub fn compare(&self, a: &Position, b: &Position) -> Ordering {
        self.orders()
            .enumerate()
            .map(|(i, order)| order.direction.apply(a.keys.get(i).cmp(&b.keys.get(i))))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| self.primary.direction.apply(a.id.cmp(&b.id)))
    }
}

/// Kind specific filters
#[derive(Clone, Debug)]
pub enum Criteria {
    Posts(PostCriteria),
    Terms(TermCriteria),
    Users(UserCriteria),
    Comments(CommentCriteria),
    Plugins(PluginCriteria),
    Themes,
    UserRoles,
}

impl Criteria {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Posts(_) => "post",
            Self::Terms(_) => "term",
            Self::Users(_) => "user",
            Self::Comments(_) => "comment",
            Self::Plugins(_) => "plugin",
            Self::Themes => "theme",
            Self::UserRoles => "user role",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PostCriteria {
    /// Empty means every public content type
    pub content_types: Vec<String>,
    /// Empty means published only
    pub statuses: Vec<PostStatus>,
    pub author: Option<i64>,
    pub parent: Option<i64>,
    pub include: Vec<i64>,
    pub exclude: Vec<i64>,
    pub search: Option<String>,
    /// The slug
    pub name: Option<String>,
    pub term_id: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct TermCriteria {
    /// Empty means every taxonomy
    pub taxonomies: Vec<String>,
    pub include: Vec<i64>,
    pub exclude: Vec<i64>,
    pub parent: Option<i64>,
    pub slug: Vec<String>,
    pub search: Option<String>,
    pub hide_empty: bool,
    /// Only terms assigned to this post
    pub object_id: Option<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct UserCriteria {
    /// Users must have this role
    pub role: Option<String>,
    /// Users must have at least one of these roles
    pub role_in: Vec<String>,
    pub role_not_in: Vec<String>,
    pub include: Vec<i64>,
    pub exclude: Vec<i64>,
    pub search: Option<String>,
    /// Columns ``search`` looks at. Empty picks them from the search term.
    pub search_columns: Vec<UserSearchColumn>,
    pub nicename: Option<String>,
    pub nicename_in: Vec<String>,
    pub nicename_not_in: Vec<String>,
    pub login: Option<String>,
    pub login_in: Vec<String>,
    pub login_not_in: Vec<String>,
    /// Only users with published posts of these content types
    pub has_published_posts: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserSearchColumn {
    Id,
    Login,
    Nicename,
    DisplayName,
    Email,
    Url,
}

impl UserSearchColumn {
    /// The columns searched when none are given: an address is looked up by
    /// email, a number by id and login, a link by url.
    pub fn guess(term: &str) -> &'static [UserSearchColumn] {
        if term.contains('@') {
            &[Self::Email]
        } else if !term.is_empty() && term.chars().all(|c| c.is_ascii_digit()) {
            &[Self::Login, Self::Id]
        } else if term.starts_with("http://") || term.starts_with("https://") {
            &[Self::Url]
        } else {
            &[
                Self::Login,
                Self::Url,
                Self::Email,
                Self::Nicename,
                Self::DisplayName,
            ]
        }
    }
}

impl FromStr for UserSearchColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "ID" => Self::Id,
            "LOGIN" => Self::Login,
            "NICENAME" => Self::Nicename,
            "DISPLAY_NAME" => Self::DisplayName,
            "EMAIL" => Self::Email,
            "URL" => Self::Url,
            other => return Err(format!("unknown search column `{}`", other)),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct CommentCriteria {
    pub content_id: Option<i64>,
    pub author_id: Option<i64>,
    pub parent: Option<i64>,
    /// ``None`` means approved only
    pub status: Option<CommentStatus>,
    pub include: Vec<i64>,
    pub exclude: Vec<i64>,
    pub search: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluginStatus {
    Active,
    Inactive,
}

#[derive(Clone, Debug, Default)]
pub struct PluginCriteria {
    pub search: Option<String>,
    pub status: Option<PluginStatus>,
}
