//! Core types, collaborator traits and the session controller for WalkBuddy.
//!
//! This crate knows nothing about SQLite or any hosted auth service. Backends
//! implement [`identity::IdentityProvider`] and [`profile::ProfileStore`];
//! front ends drive a [`session::SessionController`] and render its state.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod profile;
pub mod session;

pub use error::{AuthError, Error, Result, StoreError};
