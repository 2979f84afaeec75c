//! Error type for `walkbuddy-store-sqlite`.

use thiserror::Error;
use walkbuddy_core::{AuthError, StoreError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("password hash error: {0}")]
  PasswordHash(String),

  /// A profile document that exists but does not decode.
  #[error("malformed profile document at {key:?}: {reason}")]
  MalformedProfile { key: String, reason: String },

  #[error(transparent)]
  Auth(#[from] AuthError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for StoreError {
  fn from(err: Error) -> Self {
    match err {
      Error::MalformedProfile { key, reason } => StoreError::Malformed { key, reason },
      other => StoreError::Unavailable(Box::new(other)),
    }
  }
}

impl From<Error> for AuthError {
  fn from(err: Error) -> Self {
    match err {
      Error::Auth(auth) => auth,
      other => AuthError::Unavailable(Box::new(other)),
    }
  }
}
