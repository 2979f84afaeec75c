//! Integration tests for the SQLite backend against in-memory databases.

use std::time::Duration;

use walkbuddy_core::{
  AuthError, StoreError,
  identity::IdentityProvider,
  profile::{Language, Profile, ProfileStore, Registration, Role},
  session::SessionController,
};

use crate::{DEFAULT_MIN_PASSWORD_LENGTH, SqliteIdentityProvider, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn provider(store: &SqliteStore) -> SqliteIdentityProvider {
  SqliteIdentityProvider::open(store, DEFAULT_MIN_PASSWORD_LENGTH)
    .await
    .expect("identity provider")
}

fn profile(id: &str) -> Profile {
  Profile {
    id:         id.into(),
    email:      "ada@example.com".into(),
    first_name: "Ada".into(),
    age:        36,
    language:   Language::English,
    role:       Role::User,
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn put_and_get_profile() {
  let s = store().await;
  s.put("uid-1", &profile("uid-1")).await.unwrap();

  let fetched = s.get("uid-1").await.unwrap();
  assert_eq!(fetched, Some(profile("uid-1")));
}

#[tokio::test]
async fn get_missing_profile_returns_none() {
  let s = store().await;
  assert!(s.get("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn put_overwrites_existing_document() {
  let s = store().await;
  s.put("uid-1", &profile("uid-1")).await.unwrap();

  let mut older = profile("uid-1");
  older.age = 37;
  older.language = Language::Punjabi;
  s.put("uid-1", &older).await.unwrap();

  assert_eq!(s.get("uid-1").await.unwrap(), Some(older));
}

#[tokio::test]
async fn corrupt_document_is_a_read_failure() {
  let s = store().await;
  s.connection()
    .call(|conn| {
      conn.execute(
        "INSERT INTO profiles (profile_key, document, updated_at)
         VALUES ('uid-1', 'not json', '2024-01-01T00:00:00Z')",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.get("uid-1").await.unwrap_err();
  assert!(matches!(err, StoreError::Malformed { ref key, .. } if key == "uid-1"));
}

// ─── Identities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_identity_signs_in_and_notifies() {
  let s = store().await;
  let p = provider(&s).await;
  let mut events = p.subscribe();
  assert_eq!(events.recv().await.unwrap(), None);

  let identity = p.create_identity("ada@example.com", "lovelace").await.unwrap();

  assert_eq!(identity.email, "ada@example.com");
  assert_eq!(events.recv().await.unwrap(), Some(identity.clone()));
  assert_eq!(p.current(), Some(identity));
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
  let s = store().await;
  let p = provider(&s).await;
  p.create_identity("ada@example.com", "lovelace").await.unwrap();

  let err = p.create_identity("ADA@example.com", "another1").await.unwrap_err();
  assert!(matches!(err, AuthError::EmailInUse(_)));
}

#[tokio::test]
async fn short_password_is_rejected() {
  let s = store().await;
  let p = provider(&s).await;

  let err = p.create_identity("ada@example.com", "abc").await.unwrap_err();
  assert!(matches!(err, AuthError::WeakPassword { min_length: 6 }));
  assert!(p.current().is_none());
}

#[tokio::test]
async fn malformed_email_is_rejected() {
  let s = store().await;
  let p = provider(&s).await;

  for email in ["", "ada", "@example.com", "ada@"] {
    let err = p.create_identity(email, "lovelace").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidEmail(_)), "{email:?}");
  }
}

#[tokio::test]
async fn verify_checks_password() {
  let s = store().await;
  let p = provider(&s).await;
  let identity = p.create_identity("ada@example.com", "lovelace").await.unwrap();
  p.sign_out().await.unwrap();

  let err = p.verify_identity("ada@example.com", "babbage").await.unwrap_err();
  assert!(matches!(err, AuthError::InvalidCredentials));
  assert!(p.current().is_none());

  let err = p.verify_identity("nobody@example.com", "lovelace").await.unwrap_err();
  assert!(matches!(err, AuthError::InvalidCredentials));

  p.verify_identity("ada@example.com", "lovelace").await.unwrap();
  assert_eq!(p.current(), Some(identity));
}

#[tokio::test]
async fn sign_out_publishes_absent_identity() {
  let s = store().await;
  let p = provider(&s).await;
  p.create_identity("ada@example.com", "lovelace").await.unwrap();

  let mut events = p.subscribe();
  assert!(events.recv().await.unwrap().is_some());

  p.sign_out().await.unwrap();
  assert_eq!(events.recv().await.unwrap(), None);
}

#[tokio::test]
async fn session_survives_reopen() {
  let s = store().await;
  let identity = provider(&s).await
    .create_identity("ada@example.com", "lovelace")
    .await
    .unwrap();

  let reopened = provider(&s).await;
  let mut events = reopened.subscribe();
  assert_eq!(events.recv().await.unwrap(), Some(identity));

  reopened.sign_out().await.unwrap();
  assert!(provider(&s).await.current().is_none());
}

// ─── Session controller end to end ───────────────────────────────────────────

#[tokio::test]
async fn registered_profile_resolves_after_restart() {
  let s = store().await;

  let registered = {
    let controller = SessionController::new(provider(&s).await, s.clone());
    let _subscription = controller.attach();
    controller.ready().await;

    controller
      .register(Registration {
        email:      "grace@example.com".into(),
        password:   "cobol-59".into(),
        first_name: "Grace".into(),
        age:        85,
        language:   Language::Spanish,
        role:       Role::Admin,
      })
      .await
      .unwrap()
  };

  // A fresh controller over the same database plays the part of a relaunch.
  let controller = SessionController::new(provider(&s).await, s.clone());
  let _subscription = controller.attach();
  let state = tokio::time::timeout(Duration::from_secs(5), controller.ready())
    .await
    .unwrap();

  assert_eq!(state.identity.as_ref().map(|i| i.id.as_str()), Some(registered.id.as_str()));
  assert_eq!(state.account(), Some(&registered));
}

#[tokio::test]
async fn login_and_logout_drive_session_state() {
  let s = store().await;
  let p = provider(&s).await;
  let identity = p.create_identity("ada@example.com", "lovelace").await.unwrap();
  s.put(&identity.id, &Profile { id: identity.id.clone(), ..profile("") }).await.unwrap();
  p.sign_out().await.unwrap();

  let controller = SessionController::new(p, s.clone());
  let _subscription = controller.attach();
  assert!(!controller.ready().await.is_signed_in());

  controller.login("ada@example.com", "lovelace").await.unwrap();
  let state = tokio::time::timeout(
    Duration::from_secs(5),
    controller.settled(|st| st.account().is_some()),
  )
  .await
  .unwrap();
  assert_eq!(state.account().map(|p| p.first_name.as_str()), Some("Ada"));

  controller.logout().await.unwrap();
  let state = tokio::time::timeout(
    Duration::from_secs(5),
    controller.settled(|st| !st.is_signed_in()),
  )
  .await
  .unwrap();
  assert!(state.profile.is_none());
}
