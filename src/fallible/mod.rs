//! This module keeps the error taxonomy of the resolution layer.
//!
//! Every error here is attached to the field that produced it. A failing
//! ``node`` lookup does not abort its siblings in the same query, because
//! async-graphql only nulls the failing field (and its nullable parent).
//!
//! There is no variant for authorization denial: a node the viewer may not
//! read resolves to ``null``, exactly like a node that does not exist.
use std::sync::Arc;

use async_graphql::ErrorExtensions;

use crate::store::StoreError;

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(thiserror::Error, Debug, Clone)]
pub enum ResolveError {
    #[error("An ID needs to be provided to resolve a node.")]
    MissingIdentifier,
    #[error("The global ID isn't recognized ID: {0}")]
    InvalidIdentifier(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("The cursor `{0}` is not valid")]
    InvalidCursor(String),
    #[error("No type was found matching the {0} node")]
    UnresolvedNodeType(String),
    #[error("the content store failed: {0}")]
    StoreFault(Arc<StoreError>),
}

impl ResolveError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Errors the client caused and can fix by changing the query
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::StoreFault(_) | Self::UnresolvedNodeType(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => "MISSING_IDENTIFIER",
            Self::InvalidIdentifier(_) => "INVALID_IDENTIFIER",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InvalidCursor(_) => "INVALID_CURSOR",
            Self::UnresolvedNodeType(_) => "UNRESOLVED_NODE_TYPE",
            Self::StoreFault(_) => "STORE_FAULT",
        }
    }
}

impl From<Arc<StoreError>> for ResolveError {
    fn from(error: Arc<StoreError>) -> Self {
        Self::StoreFault(error)
    }
}

impl From<StoreError> for ResolveError {
    fn from(error: StoreError) -> Self {
        Self::StoreFault(Arc::new(error))
    }
}

impl ErrorExtensions for ResolveError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            e.set(
                "category",
                if self.is_user_error() { "user" } else { "internal" },
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_fault_is_not_a_user_error() {
        let error: ResolveError = StoreError::Unavailable("down".to_string()).into();
        assert!(!error.is_user_error());
        assert_eq!(error.code(), "STORE_FAULT");
        assert!(ResolveError::InvalidCursor("x".to_string()).is_user_error());
    }

    #[test]
    fn test_extension_carries_code() {
        let error = ResolveError::MissingIdentifier.extend();
        let extensions = serde_json::to_value(error.extensions.expect("extensions are set"))
            .expect("extensions serialize");
        assert_eq!(extensions["code"], "MISSING_IDENTIFIER");
        assert_eq!(extensions["category"], "user");
    }
}
