//! Cursor based connections
//!
//! [`ConnectionResolver`] implements relay pagination once for every
//! [`ConnectionKind`]. Rows the viewer may not read are dropped before the
//! page is counted, so a page is never short because of them while the
//! store still has readable rows.
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::trace;

use crate::{
    context::RequestContext,
    fallible::{ResolveError, ResolveResult},
    node::{Node, Post},
    store::{Order, OrderBy, OrderField, PageDirection, SortDirection, StoreQuery, UserCriteria},
};

mod args;
pub mod cursor;
mod kinds;

pub use args::{ConnectionArgs, PageRequest};
pub use cursor::{Position, SortKey};
pub use kinds::*;

/// How long an edit lock keeps a post locked
pub const EDIT_LOCK_WINDOW_SECS: i64 = 15;

#[derive(Clone, Debug)]
pub struct Edge {
    pub cursor: String,
    pub node: Node,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Connection {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

impl Connection {
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

pub struct ConnectionResolver<'a, K: ConnectionKind> {
    ctx: &'a RequestContext,
    args: ConnectionArgs,
    filter: K::Where,
    order: Vec<(OrderField, Option<SortDirection>)>,
    kind: PhantomData<K>,
}

impl<'a, K: ConnectionKind> ConnectionResolver<'a, K> {
    pub fn new(ctx: &'a RequestContext, args: ConnectionArgs) -> Self {
        Self {
            ctx,
            args,
            filter: K::Where::default(),
            order: Vec::new(),
            kind: PhantomData,
        }
    }

    pub fn with_where(mut self, filter: K::Where) -> Self {
        self.filter = filter;
        self
    }

    pub fn where_mut(&mut self) -> &mut K::Where {
        &mut self.filter
    }

    /// Orders by ``field`` instead of the kind's default. Later calls add
    /// tie breakers to the first one. Without a direction the default
    /// direction of the kind is kept.
    pub fn order_by(mut self, field: OrderField, direction: Option<SortDirection>) -> Self {
        self.order.push((field, direction));
        self
    }

    fn order(&self) -> ResolveResult<OrderBy> {
        let default = K::default_order();
        let supported = |&(field, direction): &(OrderField, Option<SortDirection>)| {
            if K::supports(field) {
                Ok(Order::new(field, direction.unwrap_or(default.direction)))
            } else {
                Err(ResolveError::invalid_argument(format!(
                    "{:?} is not a supported orderby field for {} connections.",
                    field,
                    K::ENTITY
                )))
            }
        };

        let mut orders = self.order.iter();
        let primary = match orders.next() {
            Some(order) => supported(order)?,
            None => return Ok(OrderBy::new(default)),
        };
        orders.try_fold(OrderBy::new(primary), |order_by, order| {
            Ok::<_, ResolveError>(order_by.then(supported(order)?))
        })
    }

    pub async fn get_connection(self) -> ResolveResult<Connection> {
        let page = self.args.validate(self.ctx.limits())?;
        let order = self.order()?;
        if let Some(position) = page.cursor() {
            // a cursor only points into the ordering it was issued for
            if position.order != order {
                let cursor = match page.direction {
                    PageDirection::Forward => self.args.after.clone(),
                    PageDirection::Backward => self.args.before.clone(),
                };
                return Err(ResolveError::InvalidCursor(cursor.unwrap_or_default()));
            }
        }

        let query = StoreQuery {
            kind: K::ENTITY,
            criteria: K::criteria(self.ctx.registry(), &self.filter)?,
            order: order.clone(),
            position: page.cursor().cloned(),
            direction: page.direction,
            limit: page.count + 1,
        };

        let mut rows = self.fetch(query).await?;
        let has_more = rows.len() > page.count;
        rows.truncate(page.count);
        if page.direction == PageDirection::Backward {
            rows.reverse();
        }

        self.ctx.prime(K::ENTITY, &rows).await;

        let edges: Vec<Edge> = rows
            .into_iter()
            .map(|node| Edge {
                cursor: order.position(&node).encode(),
                node,
            })
            .collect();

        let page_info = PageInfo {
            has_next_page: match page.direction {
                PageDirection::Forward => has_more,
                PageDirection::Backward => page.before.is_some(),
            },
            has_previous_page: match page.direction {
                PageDirection::Forward => page.after.is_some(),
                PageDirection::Backward => has_more,
            },
            start_cursor: edges.first().map(|edge| edge.cursor.clone()),
            end_cursor: edges.last().map(|edge| edge.cursor.clone()),
        };

        trace!(
            "{} connection page with {} edge(s), {:?}",
            K::ENTITY,
            edges.len(),
            page_info
        );
        Ok(Connection { edges, page_info })
    }

    /// Resolves a one-to-one connection: pagination arguments are ignored
    /// and at most one edge comes back.
    pub async fn get_one(self) -> ResolveResult<Option<Edge>> {
        let order = self.order()?;
        let query = StoreQuery {
            kind: K::ENTITY,
            criteria: K::criteria(self.ctx.registry(), &self.filter)?,
            order: order.clone(),
            position: None,
            direction: PageDirection::Forward,
            limit: 1,
        };

        let rows = self.fetch(query).await?;
        self.ctx.prime(K::ENTITY, &rows).await;
        Ok(rows.into_iter().next().map(|node| Edge {
            cursor: order.position(&node).encode(),
            node,
        }))
    }

    /// Collects up to ``query.limit`` readable rows, querying again from the
    /// last seen row whenever denied rows were dropped.
    async fn fetch(&self, mut query: StoreQuery) -> ResolveResult<Vec<Node>> {
        let wanted = query.limit;
        let mut rows = Vec::with_capacity(wanted);

        while rows.len() < wanted {
            query.limit = wanted - rows.len();
            let batch = self.ctx.query(&query).await?;
            let exhausted = batch.len() < query.limit;

            if let Some(last) = batch.last() {
                query.position = Some(query.order.position(last));
            }

            let fetched = batch.len();
            rows.extend(batch.into_iter().filter(|node| self.ctx.can_read(node)));
            trace!(
                "{} query fetched {} row(s), {} readable so far",
                K::ENTITY,
                fetched,
                rows.len()
            );

            if exhausted {
                break;
            }
        }
        Ok(rows)
    }
}

fn user_by_id(ctx: &RequestContext, user_id: i64) -> ConnectionResolver<'_, Users> {
    ConnectionResolver::new(ctx, ConnectionArgs::default()).with_where(UserCriteria {
        include: vec![user_id],
        ..UserCriteria::default()
    })
}

/// The ``author`` of a post
pub async fn author(ctx: &RequestContext, post: &Post) -> ResolveResult<Option<Edge>> {
    match post.author_id {
        Some(id) if id > 0 => user_by_id(ctx, id).get_one().await,
        _ => Ok(None),
    }
}

/// The user who edited a post last
pub async fn last_edited_by(ctx: &RequestContext, post: &Post) -> ResolveResult<Option<Edge>> {
    match post.last_editor_id {
        Some(id) if id > 0 => user_by_id(ctx, id).get_one().await,
        _ => Ok(None),
    }
}

/// The user holding the edit lock of a post, with the time the lock was
/// taken. Locks older than [`EDIT_LOCK_WINDOW_SECS`] at ``now`` have expired.
pub async fn editing_locked_by(
    ctx: &RequestContext,
    post: &Post,
    now: i64,
) -> ResolveResult<Option<(Edge, NaiveDateTime)>> {
    let lock = match &post.edit_lock {
        Some(lock) if lock.user_id > 0 && now - lock.timestamp <= EDIT_LOCK_WINDOW_SECS => lock,
        _ => return Ok(None),
    };
    let locked_at = match DateTime::<Utc>::from_timestamp(lock.timestamp, 0) {
        Some(at) => at.naive_utc(),
        None => return Ok(None),
    };

    Ok(user_by_id(ctx, lock.user_id)
        .get_one()
        .await?
        .map(|edge| (edge, locked_at)))
}
