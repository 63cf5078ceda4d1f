//! Failure taxonomy for the booking engine.
//!
//! Four families, matching how each one is handled:
//!
//! - [`Error::Validation`]: caught locally before any network call, fully
//!   recoverable by correcting input
//! - [`Error::Service`]: the backend rejected the operation; its message is
//!   carried verbatim for the user
//! - [`Error::Conflict`]: another actor moved the booking first; the backend
//!   is authoritative and callers refetch instead of retrying blindly
//! - [`Error::Persistence`]: cart write/read failures; logged at the store,
//!   never surfaced to callers

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input rejected before contacting the backend.
    #[error("{0}")]
    Validation(String),

    /// Remote rejection or transport failure, message surfaced verbatim.
    #[error("{0}")]
    Service(String),

    /// A status or assignment change lost a race against another actor.
    /// `latest` carries the refreshed status when a refetch succeeded.
    #[error("{message}")]
    Conflict {
        message: String,
        latest: Option<BookingStatus>,
    },

    /// Durable cart store failure. Swallowed (logged) by the cart layer.
    #[error("cart persistence failed: {0}")]
    Persistence(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            latest: None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Service(err.to_string())
    }
}
