use super::cursor::Position;
use crate::{
    config::ConnectionSettings,
    fallible::{ResolveError, ResolveResult},
    store::PageDirection,
};

/// The relay pagination arguments as the client sent them
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    pub first: Option<i64>,
    pub last: Option<i64>,
    pub after: Option<String>,
    pub before: Option<String>,
}

/// Validated [`ConnectionArgs`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub direction: PageDirection,
    pub count: usize,
    pub after: Option<Position>,
    pub before: Option<Position>,
}

impl PageRequest {
    /// The cursor the page starts from, in walking direction
    pub fn cursor(&self) -> Option<&Position> {
        match self.direction {
            PageDirection::Forward => self.after.as_ref(),
            PageDirection::Backward => self.before.as_ref(),
        }
    }
}

impl ConnectionArgs {
    pub fn forward(first: i64) -> Self {
        Self {
            first: Some(first),
            ..Self::default()
        }
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn backward(last: i64) -> Self {
        Self {
            last: Some(last),
            ..Self::default()
        }
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }

    pub fn validate(&self, limits: &ConnectionSettings) -> ResolveResult<PageRequest> {
        for (name, count) in [("first", self.first), ("last", self.last)] {
            if matches!(count, Some(n) if n < 0) {
                return Err(ResolveError::invalid_argument(format!(
                    "{} must be a positive integer.",
                    name
                )));
            }
        }

        if self.first.is_some() && self.last.is_some() {
            return Err(ResolveError::invalid_argument(
                "first and last cannot be used together. For forward pagination, use first & after. For backward pagination, use last & before.",
            ));
        }
        if self.after.is_some() && self.before.is_some() {
            return Err(ResolveError::invalid_argument(
                "after and before cannot be used together.",
            ));
        }
        if self.first.is_some() && self.before.is_some() {
            return Err(ResolveError::invalid_argument(
                "before is for backward pagination. Use last instead of first.",
            ));
        }
        if self.last.is_some() && self.after.is_some() {
            return Err(ResolveError::invalid_argument(
                "after is for forward pagination. Use first instead of last.",
            ));
        }

        let direction = if self.last.is_some() || self.before.is_some() {
            PageDirection::Backward
        } else {
            PageDirection::Forward
        };

        let count = self
            .first
            .or(self.last)
            .map(|n| n as usize)
            .unwrap_or(limits.default_page_size)
            .min(limits.max_page_size);

        Ok(PageRequest {
            direction,
            count,
            after: self.after.as_deref().map(Position::decode).transpose()?,
            before: self.before.as_deref().map(Position::decode).transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connection::cursor::SortKey,
        store::{Order, OrderBy, OrderField, SortDirection},
    };

    fn at(id: i64) -> Position {
        let order = OrderBy::new(Order::new(OrderField::Id, SortDirection::Asc));
        Position::new(order, vec![SortKey::Int(id)], SortKey::Int(id))
    }

    fn limits() -> ConnectionSettings {
        ConnectionSettings {
            default_page_size: 10,
            max_page_size: 100,
        }
    }

    fn assert_invalid(args: ConnectionArgs) {
        assert!(
            matches!(args.validate(&limits()), Err(ResolveError::InvalidArgument(_))),
            "{:?} should be rejected",
            args
        );
    }

    #[test]
    fn test_negative_counts_are_rejected() {
        assert_invalid(ConnectionArgs::forward(-1));
        assert_invalid(ConnectionArgs::backward(-5));
    }

    #[test]
    fn test_conflicting_arguments_are_rejected() {
        let cursor = at(1).encode();
        assert_invalid(ConnectionArgs::forward(2).before(cursor.clone()));
        assert_invalid(ConnectionArgs::backward(2).after(cursor.clone()));
        assert_invalid(ConnectionArgs {
            first: Some(1),
            last: Some(1),
            ..ConnectionArgs::default()
        });
        assert_invalid(ConnectionArgs::default().after(cursor.clone()).before(cursor));
    }

    #[test]
    fn test_counts_default_and_clamp() {
        let page = ConnectionArgs::default().validate(&limits()).unwrap();
        assert_eq!(page.count, 10);
        assert_eq!(page.direction, PageDirection::Forward);

        let page = ConnectionArgs::forward(1000).validate(&limits()).unwrap();
        assert_eq!(page.count, 100);

        let page = ConnectionArgs::forward(0).validate(&limits()).unwrap();
        assert_eq!(page.count, 0);
    }

    #[test]
    fn test_before_alone_pages_backward() {
        let position = at(3);
        let page = ConnectionArgs::default()
            .before(position.encode())
            .validate(&limits())
            .unwrap();
        assert_eq!(page.direction, PageDirection::Backward);
        assert_eq!(page.cursor(), Some(&position));
    }

    #[test]
    fn test_bad_cursor_is_reported() {
        assert!(matches!(
            ConnectionArgs::forward(1).after("nope").validate(&limits()),
            Err(ResolveError::InvalidCursor(_))
        ));
    }
}
