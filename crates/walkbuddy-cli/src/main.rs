//! `walkbuddy` — command-line front end for the WalkBuddy session.
//!
//! # Usage
//!
//! ```
//! walkbuddy register --email ada@example.com --password lovelace --first-name Ada
//! walkbuddy login --email ada@example.com --password lovelace
//! walkbuddy account
//! walkbuddy logout
//! ```

mod screens;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use walkbuddy_core::{
  identity::IdentityProvider,
  profile::{Language, ProfileStore, Registration, Role},
  session::{SessionController, SessionState},
};
use walkbuddy_store_sqlite::{SqliteIdentityProvider, SqliteStore};

use settings::ClientConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "walkbuddy", version, about = "WalkBuddy account client")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "walkbuddy.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create an account and its profile.
  Register {
    #[arg(long)]
    email:      String,
    #[arg(long, env = "WALKBUDDY_PASSWORD")]
    password:   String,
    #[arg(long)]
    first_name: String,
    #[arg(long, default_value_t = 0)]
    age:        u32,
    #[arg(long, default_value = "english", value_parser = parse_language)]
    language:   Language,
    #[arg(long, default_value = "user", value_parser = parse_role)]
    role:       Role,
  },
  /// Sign in with email and password.
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "WALKBUDDY_PASSWORD")]
    password: String,
  },
  /// Sign out.
  Logout,
  /// Show the signed-in user's account details.
  Account,
  /// Show the home screen greeting.
  Home,
}

fn parse_language(s: &str) -> Result<Language, String> {
  s.parse().map_err(|_| one_of::<Language>(s))
}

fn parse_role(s: &str) -> Result<Role, String> {
  s.parse().map_err(|_| one_of::<Role>(s))
}

fn one_of<E: IntoEnumIterator + std::fmt::Display>(got: &str) -> String {
  let options: Vec<String> = E::iter().map(|v| v.to_string()).collect();
  format!("{got:?} is not one of: {}", options.join(", "))
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let cfg = ClientConfig::load(&args.config)?;

  if let Some(parent) = cfg.database_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&cfg.database_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.database_path))?;
  let provider = SqliteIdentityProvider::open(&store, cfg.min_password_length)
    .await
    .context("failed to open identity provider")?;

  let controller = SessionController::new(provider, store);
  let _subscription = controller.attach();
  controller.ready().await;

  run(&controller, &cfg, args.command).await
}

async fn run<P, S>(
  controller: &SessionController<P, S>,
  cfg:        &ClientConfig,
  command:    Command,
) -> Result<()>
where
  P: IdentityProvider,
  S: ProfileStore,
{
  match command {
    Command::Register { email, password, first_name, age, language, role } => {
      if email.trim().is_empty() || password.is_empty() || first_name.trim().is_empty() {
        bail!("Please fill in at least name, email and password.");
      }
      let profile = controller
        .register(Registration {
          email: email.trim().to_string(),
          password,
          first_name: first_name.trim().to_string(),
          age,
          language,
          role,
        })
        .await
        .context("registration failed")?;

      let state = settle(controller, cfg, |s| s.account().is_some()).await?;
      tracing::debug!(identity = %profile.id, "registered");
      println!("{}", screens::home(&state));
    }
    Command::Login { email, password } => {
      let email = email.trim();
      controller
        .login(email, &password)
        .await
        .context("login failed")?;
      let state = settle(controller, cfg, |s| {
        s.identity
          .as_ref()
          .is_some_and(|identity| identity.email.eq_ignore_ascii_case(email))
      })
      .await?;
      println!("{}", screens::home(&state));
    }
    Command::Logout => {
      controller.logout().await.context("logout failed")?;
      let state = settle(controller, cfg, |s| !s.is_signed_in()).await?;
      println!("{}", screens::home(&state));
    }
    Command::Account => println!("{}", screens::account(&controller.state())),
    Command::Home => println!("{}", screens::home(&controller.state())),
  }
  Ok(())
}

/// Wait for the notification that follows an operation to land.
async fn settle<P, S>(
  controller: &SessionController<P, S>,
  cfg:        &ClientConfig,
  predicate:  impl FnMut(&SessionState) -> bool,
) -> Result<SessionState>
where
  P: IdentityProvider,
  S: ProfileStore,
{
  let wait = async {
    controller.settled(predicate).await;
    // The identity lands before its profile; let that lookup finish too.
    controller.resolved().await
  };
  tokio::time::timeout(cfg.settle_timeout(), wait)
    .await
    .context("timed out waiting for the session to update")
}
