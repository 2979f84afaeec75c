//! [`SqliteIdentityProvider`] — email/password identities with argon2 hashes.
//!
//! Creating or verifying an identity signs it in: the identity is recorded in
//! the single-row `current_session` table and published to subscribers. The
//! session survives a restart, so a reopened provider replays it.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use chrono::Utc;
use rand_core::OsRng;
use rusqlite::OptionalExtension as _;
use walkbuddy_core::{
  AuthError,
  identity::{Identity, IdentityEvents, IdentityFeed, IdentityProvider},
};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawIdentity, encode_dt, new_identity_id},
};

/// Shortest password `create_identity` accepts unless configured otherwise.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

pub struct SqliteIdentityProvider {
  conn:                tokio_rusqlite::Connection,
  feed:                IdentityFeed,
  min_password_length: usize,
}

impl SqliteIdentityProvider {
  /// Build a provider over `store`, restoring any persisted session.
  pub async fn open(store: &SqliteStore, min_password_length: usize) -> Result<Self> {
    let conn = store.connection().clone();

    let raw: Option<RawIdentity> = conn
      .call(|conn| {
        Ok(conn
          .query_row(
            "SELECT i.identity_id, i.email, i.password_hash, i.created_at
             FROM current_session s
             JOIN identities i ON i.identity_id = s.identity_id
             WHERE s.slot = 0",
            [],
            RawIdentity::from_row,
          )
          .optional()?)
      })
      .await?;

    let current = raw.map(RawIdentity::into_identity).transpose()?;
    if let Some(identity) = &current {
      tracing::debug!(identity = %identity.id, "restored persisted session");
    }

    Ok(Self { conn, feed: IdentityFeed::new(current), min_password_length })
  }

  /// The identity that is signed in right now, if any.
  pub fn current(&self) -> Option<Identity> { self.feed.current() }

  async fn create(&self, email: &str, password: &str) -> Result<Identity> {
    check_email(email)?;
    if password.chars().count() < self.min_password_length {
      return Err(AuthError::WeakPassword { min_length: self.min_password_length }.into());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string();

    let identity = Identity {
      id:         new_identity_id(),
      email:      email.to_owned(),
      created_at: Utc::now(),
    };

    let id_str = identity.id.clone();
    let email_str = identity.email.clone();
    let at_str = encode_dt(identity.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let result = tx.execute(
          "INSERT INTO identities (identity_id, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_str, password_hash, at_str],
        );
        match result {
          Ok(_) => {}
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            return Ok(false);
          }
          Err(e) => return Err(e.into()),
        }
        write_session(&tx, &id_str, &at_str)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(AuthError::EmailInUse(email.to_owned()).into());
    }

    tracing::info!(identity = %identity.id, "created identity");
    self.feed.publish(Some(identity.clone()));
    Ok(identity)
  }

  async fn verify(&self, email: &str, password: &str) -> Result<()> {
    let email_str = email.to_owned();

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT identity_id, email, password_hash, created_at
             FROM identities WHERE email = ?1",
            rusqlite::params![email_str],
            RawIdentity::from_row,
          )
          .optional()?)
      })
      .await?;

    let raw = raw.ok_or(AuthError::InvalidCredentials)?;

    {
      let parsed_hash = PasswordHash::new(&raw.password_hash)
        .map_err(|e| Error::PasswordHash(e.to_string()))?;
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;
    }

    let identity = raw.into_identity()?;
    let id_str = identity.id.clone();
    let at_str = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        write_session(conn, &id_str, &at_str)?;
        Ok(())
      })
      .await?;

    tracing::info!(identity = %identity.id, "signed in");
    self.feed.publish(Some(identity));
    Ok(())
  }

  async fn end_session(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute("DELETE FROM current_session WHERE slot = 0", [])?;
        Ok(())
      })
      .await?;

    tracing::info!("signed out");
    self.feed.publish(None);
    Ok(())
  }
}

fn check_email(email: &str) -> Result<()> {
  match email.split_once('@') {
    Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
    _ => Err(AuthError::InvalidEmail(email.to_owned()).into()),
  }
}

fn write_session(conn: &rusqlite::Connection, identity_id: &str, at: &str) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO current_session (slot, identity_id, signed_in_at)
     VALUES (0, ?1, ?2)
     ON CONFLICT (slot) DO UPDATE SET
       identity_id  = excluded.identity_id,
       signed_in_at = excluded.signed_in_at",
    rusqlite::params![identity_id, at],
  )?;
  Ok(())
}

// ─── IdentityProvider impl ───────────────────────────────────────────────────

impl IdentityProvider for SqliteIdentityProvider {
  async fn create_identity(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
    Ok(self.create(email, password).await?)
  }

  async fn verify_identity(&self, email: &str, password: &str) -> Result<(), AuthError> {
    Ok(self.verify(email, password).await?)
  }

  async fn sign_out(&self) -> Result<(), AuthError> {
    Ok(self.end_session().await?)
  }

  fn subscribe(&self) -> IdentityEvents { self.feed.subscribe() }
}
