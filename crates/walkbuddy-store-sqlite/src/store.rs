//! [`SqliteStore`] — the SQLite implementation of [`ProfileStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use walkbuddy_core::{
  StoreError,
  profile::{Profile, ProfileStore},
};

use crate::{
  Result,
  encode::{decode_profile, encode_dt, encode_profile},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A WalkBuddy database backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The same
/// handle backs both the profile store and
/// [`SqliteIdentityProvider`](crate::SqliteIdentityProvider).
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  async fn read_profile(&self, key: &str) -> Result<Option<Profile>> {
    let key_owned = key.to_owned();

    let document: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT document FROM profiles WHERE profile_key = ?1",
            rusqlite::params![key_owned],
            |row| row.get(0),
          )
          .optional()?)
      })
      .await?;

    document.map(|doc| decode_profile(key, &doc)).transpose()
  }

  async fn write_profile(&self, key: &str, profile: &Profile) -> Result<()> {
    let key_owned = key.to_owned();
    let document  = encode_profile(profile)?;
    let at_str    = encode_dt(Utc::now());

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (profile_key, document, updated_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (profile_key) DO UPDATE SET
             document   = excluded.document,
             updated_at = excluded.updated_at",
          rusqlite::params![key_owned, document, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  async fn get(&self, key: &str) -> Result<Option<Profile>, StoreError> {
    Ok(self.read_profile(key).await?)
  }

  async fn put(&self, key: &str, profile: &Profile) -> Result<(), StoreError> {
    Ok(self.write_profile(key, profile).await?)
  }
}
