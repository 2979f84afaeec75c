//! [`SessionController`] — keeps `{identity, profile, loading}` in step with
//! the identity provider and the profile store.
//!
//! Identity and profile are resolved as two independently failing steps. The
//! provider's notification stream is the only source of identity changes; the
//! handler then reads the profile document for the new identity. A failed read
//! leaves the previous profile in place and is reported to the
//! [`SessionObserver`], never to the UI.
//!
//! `register` is the one other writer: it sets the freshly written profile
//! without waiting for the next notification, unless the session has moved on
//! (signed out or switched to some other principal) while the registration was
//! in flight.

use std::sync::{
  Arc,
  atomic::{AtomicU64, Ordering},
};

use tokio::{
  sync::{Mutex, watch},
  task::JoinHandle,
};

use crate::{
  Result,
  error::StoreError,
  identity::{Identity, IdentityProvider},
  profile::{Profile, ProfileStore, Registration},
};

// ─── State ───────────────────────────────────────────────────────────────────

/// Snapshot of the session as the UI sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
  pub identity: Option<Identity>,
  /// May be `None` while `identity` is present: the profile was never
  /// written, or could not be read yet.
  pub profile:  Option<Profile>,
  /// `true` until the first notification has been handled.
  pub loading:  bool,
}

impl Default for SessionState {
  fn default() -> Self {
    Self { identity: None, profile: None, loading: true }
  }
}

impl SessionState {
  pub fn is_signed_in(&self) -> bool { self.identity.is_some() }

  /// The profile, if it belongs to the current identity.
  pub fn account(&self) -> Option<&Profile> {
    match (&self.identity, &self.profile) {
      (Some(identity), Some(profile)) if identity.id == profile.id => Some(profile),
      _ => None,
    }
  }
}

// ─── Observability hook ──────────────────────────────────────────────────────

/// Receives the failures the controller deliberately keeps away from callers.
pub trait SessionObserver: Send + Sync {
  /// A profile read during notification handling failed; the previous profile
  /// was kept.
  fn profile_read_failed(&self, identity: &Identity, error: &StoreError);

  /// A `register` completed after the session had moved on, so its profile
  /// was written to the store but not applied to the session.
  fn stale_registration_discarded(&self, profile: &Profile) { let _ = profile; }
}

/// Default observer: logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
  fn profile_read_failed(&self, identity: &Identity, error: &StoreError) {
    tracing::warn!(identity = %identity.id, %error, "could not load profile; keeping previous value");
  }

  fn stale_registration_discarded(&self, profile: &Profile) {
    tracing::warn!(identity = %profile.id, "session changed during registration; profile not applied");
  }
}

// ─── Controller ──────────────────────────────────────────────────────────────

/// Session/profile synchronisation controller.
///
/// Cloning is cheap; all clones share one session.
pub struct SessionController<P, S> {
  inner: Arc<Inner<P, S>>,
}

struct Inner<P, S> {
  provider:   P,
  store:      S,
  state:      watch::Sender<SessionState>,
  /// Bumped whenever a notification ends or replaces a present identity.
  sign_outs:  AtomicU64,
  /// Serialises notification handling with `register`'s write-and-apply.
  resolution: Mutex<()>,
  observer:   Arc<dyn SessionObserver>,
}

impl<P, S> Clone for SessionController<P, S> {
  fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

impl<P, S> SessionController<P, S>
where
  P: IdentityProvider,
  S: ProfileStore,
{
  pub fn new(provider: P, store: S) -> Self {
    Self::with_observer(provider, store, Arc::new(TracingObserver))
  }

  pub fn with_observer(
    provider: P,
    store: S,
    observer: Arc<dyn SessionObserver>,
  ) -> Self {
    let (state, _) = watch::channel(SessionState::default());
    Self {
      inner: Arc::new(Inner {
        provider,
        store,
        state,
        sign_outs: AtomicU64::new(0),
        resolution: Mutex::new(()),
        observer,
      }),
    }
  }

  pub fn provider(&self) -> &P { &self.inner.provider }

  pub fn store(&self) -> &S { &self.inner.store }

  // ── State access ──────────────────────────────────────────────────────────

  /// Current snapshot.
  pub fn state(&self) -> SessionState { self.inner.state.borrow().clone() }

  /// A receiver that is notified on every state change.
  pub fn watch(&self) -> watch::Receiver<SessionState> {
    self.inner.state.subscribe()
  }

  /// Wait until the first notification has been handled and return the
  /// state at that point.
  pub async fn ready(&self) -> SessionState {
    self.settled(|state| !state.loading).await
  }

  /// Wait until `predicate` holds for the current state.
  pub async fn settled(
    &self,
    predicate: impl FnMut(&SessionState) -> bool,
  ) -> SessionState {
    let mut rx = self.watch();
    match rx.wait_for(predicate).await {
      Ok(state) => state.clone(),
      // The sender lives in `self`, so the channel cannot close here.
      Err(_) => self.state(),
    }
  }

  /// Wait for any in-flight notification handling or registration to
  /// finish, then return the state.
  pub async fn resolved(&self) -> SessionState {
    let _guard = self.inner.resolution.lock().await;
    self.state()
  }

  // ── Operations ────────────────────────────────────────────────────────────

  /// Create an account: identity first, then its profile document.
  ///
  /// The profile is applied to the session as soon as the write succeeds.
  /// If the write fails the error is returned and the session profile is
  /// left untouched; the next notification will look the profile up again.
  pub async fn register(&self, registration: Registration) -> Result<Profile> {
    let (before, generation) = {
      let _guard = self.inner.resolution.lock().await;
      (self.current_identity_id(), self.inner.sign_outs.load(Ordering::SeqCst))
    };

    tracing::debug!(email = %registration.email, "creating identity");
    let identity = self
      .inner
      .provider
      .create_identity(&registration.email, &registration.password)
      .await?;

    let profile = registration.into_profile(identity.id.clone());

    let _guard = self.inner.resolution.lock().await;
    tracing::debug!(identity = %identity.id, "writing profile document");
    self.inner.store.put(&identity.id, &profile).await?;

    // The provider's own switch to the new identity is not moving on. Any
    // other change since the call started is.
    let current = self.current_identity_id();
    let applies = current.as_deref() == Some(identity.id.as_str())
      || (current == before
        && self.inner.sign_outs.load(Ordering::SeqCst) == generation);

    if applies {
      let applied = profile.clone();
      self.inner.state.send_modify(|state| state.profile = Some(applied));
      tracing::debug!(identity = %identity.id, "registration complete");
    } else {
      self.inner.observer.stale_registration_discarded(&profile);
    }

    Ok(profile)
  }

  /// Verify credentials. The profile arrives through the notification that
  /// follows a successful sign-in.
  pub async fn login(&self, email: &str, password: &str) -> Result<()> {
    tracing::debug!(%email, "signing in");
    self.inner.provider.verify_identity(email, password).await?;
    Ok(())
  }

  /// Sign out. The profile is cleared by the resulting notification.
  pub async fn logout(&self) -> Result<()> {
    tracing::debug!("signing out");
    self.inner.provider.sign_out().await?;
    Ok(())
  }

  // ── Notification handling ─────────────────────────────────────────────────

  /// Subscribe to the provider and handle its notifications on a background
  /// task until the returned [`Subscription`] is dropped.
  pub fn attach(&self) -> Subscription
  where
    P: 'static,
    S: 'static,
  {
    let mut events = self.inner.provider.subscribe();
    let controller = self.clone();
    let task = tokio::spawn(async move {
      while let Some(identity) = events.recv().await {
        controller.handle_identity_change(identity).await;
      }
      tracing::debug!("identity provider closed the notification stream");
    });
    Subscription { task }
  }

  /// Apply one identity notification.
  pub async fn handle_identity_change(&self, identity: Option<Identity>) {
    let _guard = self.inner.resolution.lock().await;

    let previous = self.inner.state.borrow().identity.clone();
    let ended = match (&previous, &identity) {
      (Some(prev), Some(next)) => prev.id != next.id,
      (Some(_), None) => true,
      (None, _) => false,
    };
    if ended {
      self.inner.sign_outs.fetch_add(1, Ordering::SeqCst);
    }

    let current = identity.clone();
    self.inner.state.send_modify(|state| state.identity = current);

    // `None` keeps whatever profile the session already holds.
    let profile = match &identity {
      None => Some(None),
      Some(identity) => match self.resolve_profile(identity).await {
        Ok(profile) => Some(profile),
        Err(error) => {
          self.inner.observer.profile_read_failed(identity, &error);
          None
        }
      },
    };

    self.inner.state.send_modify(|state| {
      if let Some(profile) = profile {
        state.profile = profile;
      }
      state.loading = false;
    });
  }

  fn current_identity_id(&self) -> Option<String> {
    self.inner.state.borrow().identity.as_ref().map(|identity| identity.id.clone())
  }

  async fn resolve_profile(
    &self,
    identity: &Identity,
  ) -> Result<Option<Profile>, StoreError> {
    let profile = self.inner.store.get(&identity.id).await?;
    if profile.is_none() {
      tracing::debug!(identity = %identity.id, "no profile document for identity");
    }
    Ok(profile)
  }
}

// ─── Subscription guard ──────────────────────────────────────────────────────

/// Keeps the controller subscribed to its provider. Dropping it stops the
/// handler task and releases the provider's channel.
#[derive(Debug)]
#[must_use = "dropping the subscription stops session updates"]
pub struct Subscription {
  task: JoinHandle<()>,
}

impl Subscription {
  /// Stop handling notifications now; same as dropping the guard.
  pub fn unsubscribe(self) {}

  pub fn is_active(&self) -> bool { !self.task.is_finished() }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.task.abort(); }
}
