//! The entity kinds a connection can page over
//!
//! A kind contributes what differs between connections: the entity it
//! returns, its default ordering, the order fields it supports and how its
//! ``where`` filters become store criteria.
use crate::{
    fallible::{ResolveError, ResolveResult},
    node::{EntityKind, PostStatus},
    store::{
        CommentCriteria, Criteria, Order, OrderField, PluginCriteria, PostCriteria, Registry,
        SortDirection, TermCriteria, UserCriteria,
    },
};

pub trait ConnectionKind: Send + Sync + 'static {
    const ENTITY: EntityKind;

    /// The kind specific filters
    type Where: Default + Clone + Send + Sync;

    fn default_order() -> Order;

    fn supports(field: OrderField) -> bool;

    fn criteria(registry: &Registry, filter: &Self::Where) -> ResolveResult<Criteria>;
}

pub struct Users;

impl ConnectionKind for Users {
    const ENTITY: EntityKind = EntityKind::User;
    type Where = UserCriteria;

    fn default_order() -> Order {
        Order::new(OrderField::Login, SortDirection::Asc)
    }

    fn supports(field: OrderField) -> bool {
        matches!(
            field,
            OrderField::Login
                | OrderField::Nicename
                | OrderField::DisplayName
                | OrderField::Email
                | OrderField::Url
                | OrderField::Registered
                | OrderField::Id
        )
    }

    fn criteria(registry: &Registry, filter: &UserCriteria) -> ResolveResult<Criteria> {
        for role in filter
            .role
            .iter()
            .chain(&filter.role_in)
            .chain(&filter.role_not_in)
        {
            if registry.role(role).is_none() {
                return Err(ResolveError::invalid_argument(format!(
                    "{} is not a valid user role.",
                    role
                )));
            }
        }
        for content_type in &filter.has_published_posts {
            known_content_type(registry, content_type)?;
        }
        Ok(Criteria::Users(filter.clone()))
    }
}

pub struct Posts;

impl ConnectionKind for Posts {
    const ENTITY: EntityKind = EntityKind::Post;
    type Where = PostCriteria;

    fn default_order() -> Order {
        Order::new(OrderField::Date, SortDirection::Desc)
    }

    fn supports(field: OrderField) -> bool {
        matches!(
            field,
            OrderField::Date
                | OrderField::Modified
                | OrderField::Title
                | OrderField::MenuOrder
                | OrderField::Slug
                | OrderField::Id
        )
    }

    fn criteria(registry: &Registry, filter: &PostCriteria) -> ResolveResult<Criteria> {
        let mut criteria = filter.clone();
        for content_type in &criteria.content_types {
            known_content_type(registry, content_type)?;
        }
        if criteria.content_types.is_empty() {
            criteria.content_types = registry
                .public_content_types()
                .map(|t| t.name.clone())
                .collect();
        }
        if criteria.statuses.is_empty() {
            criteria.statuses.push(PostStatus::Publish);
        }
        Ok(Criteria::Posts(criteria))
    }
}

pub struct Terms;

impl ConnectionKind for Terms {
    const ENTITY: EntityKind = EntityKind::Term;
    type Where = TermCriteria;

    fn default_order() -> Order {
        Order::new(OrderField::Name, SortDirection::Asc)
    }

    fn supports(field: OrderField) -> bool {
        matches!(
            field,
            OrderField::Name | OrderField::Slug | OrderField::Count | OrderField::Id
        )
    }

    fn criteria(registry: &Registry, filter: &TermCriteria) -> ResolveResult<Criteria> {
        for taxonomy in &filter.taxonomies {
            if registry.taxonomy(taxonomy).is_none() {
                return Err(ResolveError::invalid_argument(format!(
                    "{} is not a registered taxonomy.",
                    taxonomy
                )));
            }
        }
        Ok(Criteria::Terms(filter.clone()))
    }
}

pub struct Comments;

impl ConnectionKind for Comments {
    const ENTITY: EntityKind = EntityKind::Comment;
    type Where = CommentCriteria;

    fn default_order() -> Order {
        Order::new(OrderField::Date, SortDirection::Desc)
    }

    fn supports(field: OrderField) -> bool {
        matches!(field, OrderField::Date | OrderField::Id)
    }

    fn criteria(_: &Registry, filter: &CommentCriteria) -> ResolveResult<Criteria> {
        Ok(Criteria::Comments(filter.clone()))
    }
}

pub struct Plugins;

impl ConnectionKind for Plugins {
    const ENTITY: EntityKind = EntityKind::Plugin;
    type Where = PluginCriteria;

    fn default_order() -> Order {
        Order::new(OrderField::Name, SortDirection::Asc)
    }

    fn supports(field: OrderField) -> bool {
        field == OrderField::Name
    }

    fn criteria(_: &Registry, filter: &PluginCriteria) -> ResolveResult<Criteria> {
        Ok(Criteria::Plugins(filter.clone()))
    }
}

pub struct Themes;

impl ConnectionKind for Themes {
    const ENTITY: EntityKind = EntityKind::Theme;
    type Where = ();

    fn default_order() -> Order {
        Order::new(OrderField::Name, SortDirection::Asc)
    }

    fn supports(field: OrderField) -> bool {
        field == OrderField::Name
    }

    fn criteria(_: &Registry, _: &()) -> ResolveResult<Criteria> {
        Ok(Criteria::Themes)
    }
}

pub struct UserRoles;

impl ConnectionKind for UserRoles {
    const ENTITY: EntityKind = EntityKind::UserRole;
    type Where = ();

    fn default_order() -> Order {
        Order::new(OrderField::Name, SortDirection::Asc)
    }

    fn supports(field: OrderField) -> bool {
        field == OrderField::Name
    }

    fn criteria(_: &Registry, _: &()) -> ResolveResult<Criteria> {
        Ok(Criteria::UserRoles)
    }
}

fn known_content_type(registry: &Registry, name: &str) -> ResolveResult<()> {
    match registry.content_type(name) {
        Some(_) => Ok(()),
        None => Err(ResolveError::invalid_argument(format!(
            "{} is not a registered content type.",
            name
        ))),
    }
}
