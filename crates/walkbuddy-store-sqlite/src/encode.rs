//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Identity ids are hyphenated lowercase
//! UUIDs. Profiles are stored as their JSON document.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use walkbuddy_core::{identity::Identity, profile::Profile};

use crate::{Error, Result};

// ─── Ids ─────────────────────────────────────────────────────────────────────

pub fn new_identity_id() -> String { Uuid::new_v4().hyphenated().to_string() }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Profile documents ───────────────────────────────────────────────────────

pub fn encode_profile(profile: &Profile) -> Result<String> {
  Ok(serde_json::to_string(profile)?)
}

pub fn decode_profile(key: &str, document: &str) -> Result<Profile> {
  serde_json::from_str(document).map_err(|e| Error::MalformedProfile {
    key:    key.to_owned(),
    reason: e.to_string(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `identities` row.
pub struct RawIdentity {
  pub identity_id:   String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawIdentity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      identity_id:   row.get(0)?,
      email:         row.get(1)?,
      password_hash: row.get(2)?,
      created_at:    row.get(3)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      id:         self.identity_id,
      email:      self.email,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use walkbuddy_core::profile::{Language, Role};

  #[test]
  fn timestamps_round_trip_through_rfc3339() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn unparseable_document_is_malformed() {
    let err = decode_profile("uid-1", "{\"id\": 7}").unwrap_err();
    assert!(matches!(err, Error::MalformedProfile { ref key, .. } if key == "uid-1"));
  }

  #[test]
  fn document_is_plain_profile_json() {
    let profile = Profile {
      id:         "uid-1".into(),
      email:      "ada@example.com".into(),
      first_name: "Ada".into(),
      age:        0,
      language:   Language::English,
      role:       Role::User,
    };
    let doc = encode_profile(&profile).unwrap();
    assert!(doc.contains("\"firstName\":\"Ada\""));
    assert_eq!(decode_profile("uid-1", &doc).unwrap(), profile);
  }
}
