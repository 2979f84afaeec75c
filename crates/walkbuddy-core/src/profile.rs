//! The application's user record and the `ProfileStore` trait.

use std::{fmt, future::Future};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::StoreError;

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Preferred language for guidance and UI text.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
  #[default]
  English,
  Spanish,
  Mandarin,
  Punjabi,
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  Admin,
  #[default]
  User,
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// The application-level user record, keyed by identity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  /// Always equal to the id of the owning [`Identity`](crate::identity::Identity).
  pub id:         String,
  pub email:      String,
  pub first_name: String,
  pub age:        u32,
  pub language:   Language,
  pub role:       Role,
}

impl Profile {
  /// Avatar letter: the uppercased first character of the first name.
  pub fn initial(&self) -> char {
    self
      .first_name
      .chars()
      .next()
      .and_then(|c| c.to_uppercase().next())
      .unwrap_or('?')
  }
}

/// Everything `SessionController::register` needs to create an account.
///
/// Fields are taken as given; rejecting blank input is the caller's job.
#[derive(Clone)]
pub struct Registration {
  pub email:      String,
  pub password:   String,
  pub first_name: String,
  pub age:        u32,
  pub language:   Language,
  pub role:       Role,
}

impl fmt::Debug for Registration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registration")
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .field("first_name", &self.first_name)
      .field("age", &self.age)
      .field("language", &self.language)
      .field("role", &self.role)
      .finish()
  }
}

impl Registration {
  /// Build the profile document for the identity `id`. The password is not
  /// part of the record.
  pub fn into_profile(self, id: String) -> Profile {
    Profile {
      id,
      email: self.email,
      first_name: self.first_name,
      age: self.age,
      language: self.language,
      role: self.role,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// A remote key-value document store holding one profile per identity id.
pub trait ProfileStore: Send + Sync {
  /// Read the profile stored at `key`. Returns `None` if nothing was ever
  /// written there.
  fn get<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, StoreError>> + Send + 'a;

  /// Write (or overwrite) the profile stored at `key`.
  fn put<'a>(
    &'a self,
    key: &'a str,
    profile: &'a Profile,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a;
}
