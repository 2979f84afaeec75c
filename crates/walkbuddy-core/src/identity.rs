//! Identities and the `IdentityProvider` trait.
//!
//! An identity is the provider's handle for an authenticated principal. The
//! session controller only ever caches identities it was handed through an
//! [`IdentityEvents`] stream; it never constructs one itself.

use std::{
  future::Future,
  sync::{Mutex, PoisonError},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AuthError;

// ─── Identity ────────────────────────────────────────────────────────────────

/// An authenticated principal issued by an [`IdentityProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  /// Stable unique id; also the key of the principal's profile document.
  pub id:         String,
  pub email:      String,
  pub created_at: DateTime<Utc>,
}

/// Stream of "current identity changed" notifications.
///
/// The first value is the provider's current identity (`None` when signed
/// out), delivered at subscription time. Dropping the receiver unsubscribes.
pub type IdentityEvents = mpsc::UnboundedReceiver<Option<Identity>>;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over an email/password identity provider.
///
/// Every successful `create_identity`, `verify_identity` and `sign_out` is
/// followed by a notification on each live [`IdentityEvents`] stream.
pub trait IdentityProvider: Send + Sync {
  /// Create a new principal and sign it in.
  fn create_identity<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Identity, AuthError>> + Send + 'a;

  /// Check credentials and sign the matching principal in.
  fn verify_identity<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<(), AuthError>> + Send + 'a;

  /// Sign the current principal out.
  fn sign_out(&self) -> impl Future<Output = Result<(), AuthError>> + Send + '_;

  /// Subscribe to identity changes.
  fn subscribe(&self) -> IdentityEvents;
}

// ─── Fan-out helper ──────────────────────────────────────────────────────────

/// Keeps the current identity and the live subscribers of a provider.
///
/// `subscribe` and `publish` share one lock, so a new subscriber sees either
/// the old value followed by the change, or only the new value.
#[derive(Debug, Default)]
pub struct IdentityFeed {
  inner: Mutex<FeedInner>,
}

#[derive(Debug, Default)]
struct FeedInner {
  current:     Option<Identity>,
  subscribers: Vec<mpsc::UnboundedSender<Option<Identity>>>,
}

impl IdentityFeed {
  /// A feed whose subscribers first see `current`.
  pub fn new(current: Option<Identity>) -> Self {
    Self {
      inner: Mutex::new(FeedInner { current, subscribers: Vec::new() }),
    }
  }

  pub fn current(&self) -> Option<Identity> {
    self.lock().current.clone()
  }

  pub fn subscribe(&self) -> IdentityEvents {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut inner = self.lock();
    // Cannot fail: `rx` is still alive.
    let _ = tx.send(inner.current.clone());
    inner.subscribers.push(tx);
    rx
  }

  /// Record `identity` as current and notify every subscriber, dropping the
  /// ones whose receiver has gone away.
  pub fn publish(&self, identity: Option<Identity>) {
    let mut inner = self.lock();
    inner.current = identity.clone();
    inner
      .subscribers
      .retain(|tx| tx.send(identity.clone()).is_ok());
  }

  /// Number of registered subscribers. Ones whose receiver was dropped are
  /// only pruned by the next publish.
  pub fn subscriber_count(&self) -> usize {
    self.lock().subscribers.len()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, FeedInner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn identity(id: &str) -> Identity {
    Identity {
      id:         id.to_string(),
      email:      format!("{id}@example.com"),
      created_at: Utc::now(),
    }
  }

  #[tokio::test]
  async fn subscribe_replays_current_value() {
    let feed = IdentityFeed::new(Some(identity("a")));
    let mut rx = feed.subscribe();
    assert_eq!(rx.recv().await.unwrap().unwrap().id, "a");
  }

  #[tokio::test]
  async fn publish_reaches_every_subscriber_in_order() {
    let feed = IdentityFeed::default();
    let mut first = feed.subscribe();
    let mut second = feed.subscribe();

    feed.publish(Some(identity("a")));
    feed.publish(None);

    for rx in [&mut first, &mut second] {
      assert_eq!(rx.recv().await.unwrap(), None);
      assert_eq!(rx.recv().await.unwrap().unwrap().id, "a");
      assert_eq!(rx.recv().await.unwrap(), None);
    }
  }

  #[test]
  fn dropped_subscribers_are_pruned() {
    let feed = IdentityFeed::default();
    let kept = feed.subscribe();
    drop(feed.subscribe());

    feed.publish(None);
    assert_eq!(feed.subscriber_count(), 1);
    drop(kept);
  }
}
