//! Error types for `walkbuddy-core`.

use thiserror::Error;

/// Boxed backend error carried as the source of `Unavailable` variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A rejection from the identity provider.
#[derive(Debug, Error)]
pub enum AuthError {
  #[error("an account already exists for {0}")]
  EmailInUse(String),

  #[error("invalid email address: {0:?}")]
  InvalidEmail(String),

  #[error("password must be at least {min_length} characters")]
  WeakPassword { min_length: usize },

  #[error("invalid email or password")]
  InvalidCredentials,

  #[error("identity provider unavailable: {0}")]
  Unavailable(#[source] BoxError),
}

/// A profile store read or write failure.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("profile store unavailable: {0}")]
  Unavailable(#[source] BoxError),

  #[error("malformed profile document at {key:?}: {reason}")]
  Malformed { key: String, reason: String },
}

/// Error returned by the user-initiated session operations.
#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Auth(#[from] AuthError),

  #[error("could not save profile: {0}")]
  Store(#[from] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
