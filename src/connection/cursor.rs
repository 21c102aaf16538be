//! Cursors
//!
//! A cursor is the position of a row in its ordering: the ordering itself,
//! the row's key for each ordered field and its id as the last tie breaker.
//! It never encodes an offset, so a cursor stays valid when rows are
//! inserted before or after it.
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{fallible::ResolveError, graphql::id::ENGINE, store::OrderBy};

const PREFIX: &str = "cursor:";

/// ``Int`` keys sort before ``Text`` keys
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(untagged)]
pub enum SortKey {
    Int(i64),
    Text(String),
}

/// Positions only compare through the [`OrderBy`] they were taken in
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub order: OrderBy,
    /// One key per field of ``order``
    pub keys: Vec<SortKey>,
    pub id: SortKey,
}

impl Position {
    pub fn new(order: OrderBy, keys: Vec<SortKey>, id: SortKey) -> Self {
        Self { order, keys, id }
    }

    pub fn encode(&self) -> String {
        // serializing a struct of plain enums cannot fail
        let json = serde_json::to_string(self).unwrap_or_default();
        ENGINE.encode(format!("{}{}", PREFIX, json))
    }

    pub fn decode(cursor: &str) -> Result<Self, ResolveError> {
        let invalid = || ResolveError::InvalidCursor(cursor.to_string());

        let bytes = ENGINE.decode(cursor).map_err(|_| invalid())?;
        let payload = String::from_utf8(bytes).map_err(|_| invalid())?;
        let json = payload.strip_prefix(PREFIX).ok_or_else(invalid)?;
        serde_json::from_str(json).map_err(|_| invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        graphql::id,
        store::{Order, OrderField, SortDirection},
    };

    fn by_date() -> OrderBy {
        OrderBy::new(Order::new(OrderField::Date, SortDirection::Desc))
    }

    #[test]
    fn test_cursor_keeps_its_ordering() {
        let order = by_date().then(Order::new(OrderField::Title, SortDirection::Asc));
        let position = Position::new(
            order.clone(),
            vec![
                SortKey::Text("2021-04-01T10:00:00".to_string()),
                SortKey::Text("hello".to_string()),
            ],
            SortKey::Int(42),
        );
        let decoded = Position::decode(&position.encode()).unwrap();
        assert_eq!(decoded, position);
        assert_eq!(decoded.order, order);
        assert_ne!(decoded.order, by_date());
    }

    #[test]
    fn test_padded_cursor_is_rejected() {
        let cursor = Position::new(by_date(), vec![SortKey::Int(1)], SortKey::Int(1)).encode();
        assert!(matches!(
            Position::decode(&format!(" {} ", cursor)),
            Err(ResolveError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_global_ids_are_not_cursors() {
        let token = id::encode("post", "42");
        assert!(matches!(
            Position::decode(&token),
            Err(ResolveError::InvalidCursor(_))
        ));
        assert!(matches!(
            Position::decode("definitely not a cursor"),
            Err(ResolveError::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_numeric_keys_sort_before_text() {
        assert!(SortKey::Int(1000) < SortKey::Text("0".to_string()));
    }

    #[test]
    fn test_ties_fall_back_to_the_id() {
        let order = OrderBy::new(Order::new(OrderField::MenuOrder, SortDirection::Asc));
        let at = |key, id| Position::new(order.clone(), vec![SortKey::Int(key)], SortKey::Int(id));

        assert!(order.compare(&at(1, 9), &at(1, 10)).is_lt());
        assert!(order.compare(&at(2, 1), &at(1, 10)).is_gt());

        let newest_first = by_date();
        let at = |id| Position::new(newest_first.clone(), vec![SortKey::Int(0)], SortKey::Int(id));
        assert!(newest_first.compare(&at(9), &at(10)).is_gt());
    }
}
