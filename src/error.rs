use std::time::Duration;

use thiserror::Error;

use crate::types::UserId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("store did not respond within {0:?}")]
    Timeout(Duration),

    #[error("user {user} may not manage group {group}")]
    NotAuthorized { user: UserId, group: String },

    #[error("user {user} may not run {command}")]
    CommandDenied { user: UserId, command: String },

    #[error("membership of user {user} in group {group} is protected")]
    ProtectedMembership { user: UserId, group: String },

    #[error("user {user} is already a member of group {group}")]
    AlreadyMember { user: UserId, group: String },

    #[error("user {user} is not a member of group {group}")]
    NotMember { user: UserId, group: String },

    #[error("an identical autolabel rule already exists")]
    DuplicateRule,

    #[error("autolabel rule not found: {0}")]
    UnknownRule(String),

    #[error("group not found: {0}")]
    UnknownGroup(String),

    #[error("group already exists: {0}")]
    GroupExists(String),

    #[error("invalid name: {0}")]
    InvalidName(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Coarse grouping used by outer surfaces to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Denied,
    Conflict,
    NotFound,
    Invalid,
    Persistence,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotAuthorized { .. }
            | Error::CommandDenied { .. }
            | Error::ProtectedMembership { .. } => ErrorKind::Denied,
            Error::AlreadyMember { .. } | Error::DuplicateRule | Error::GroupExists(_) => {
                ErrorKind::Conflict
            }
            Error::NotMember { .. } | Error::UnknownGroup(_) | Error::UnknownRule(_) => {
                ErrorKind::NotFound
            }
            Error::InvalidName(_) | Error::InvalidPattern(_) | Error::Config(_) => {
                ErrorKind::Invalid
            }
            Error::Database(_) | Error::Timeout(_) | Error::Io(_) => ErrorKind::Persistence,
        }
    }

    /// Only persistence failures are worth retrying, and only by the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Timeout(_))
    }

    /// Message suitable for showing to the chat user who triggered the request.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Persistence => "Something went wrong, please try again.".to_string(),
            _ => {
                let mut message = self.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                message.push('.');
                message
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
