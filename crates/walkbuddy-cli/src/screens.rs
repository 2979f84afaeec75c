//! Text renderings of the home and account screens.

use std::fmt::Write as _;

use walkbuddy_core::session::SessionState;

pub const NOT_LOGGED_IN: &str = "You are not logged in. Please log in to view your account.";

/// Home header: greets the signed-in user.
pub fn home(state: &SessionState) -> String {
  if state.loading {
    return "Loading…".to_string();
  }
  match (state.account(), &state.identity) {
    (Some(profile), _) => format!("Welcome back, {}!", profile.first_name),
    // Signed in, but the profile has not loaded (or was never written).
    (None, Some(identity)) => format!("Signed in as {}", identity.email),
    (None, None) => "Nobody is signed in.".to_string(),
  }
}

/// My-account screen.
pub fn account(state: &SessionState) -> String {
  if state.loading {
    return "Loading account…".to_string();
  }
  let Some(profile) = state.account() else {
    return NOT_LOGGED_IN.to_string();
  };

  let mut out = String::new();
  let _ = writeln!(out, "MY ACCOUNT");
  let _ = writeln!(out, "[{}] {}", profile.initial(), profile.first_name);
  let _ = writeln!(out);
  for (label, value) in [
    ("First name", profile.first_name.clone()),
    ("Age", profile.age.to_string()),
    ("Email", profile.email.clone()),
    ("Language", profile.language.to_string()),
    ("Role", profile.role.to_string()),
  ] {
    let _ = writeln!(out, "{label:<12}{value}");
  }
  out
}
