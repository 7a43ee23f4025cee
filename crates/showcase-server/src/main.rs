//! Showcase API server.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the JSON API under `/api`.
//!
//! # Bootstrapping an operator account
//!
//! ```
//! cargo run -p showcase-server -- --create-super-admin root
//! ```
//!
//! prompts for a password on stdin, stores the user as a super-admin and
//! exits.

mod config;

use std::io::{self, BufRead, Write};

use anyhow::Context as _;
use axum::Router;
use chrono::Utc;
use clap::Parser;
use showcase_api::{AppState, Settings, auth::hash_password};
use showcase_core::{Role, store::UserStore, user::NewUser};
use showcase_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Showcase API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: std::path::PathBuf,

  /// Create a super-admin with this username (password read from stdin)
  /// and exit.
  #[arg(long, value_name = "USERNAME")]
  create_super_admin: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: seed an operator and exit.
  if let Some(username) = cli.create_super_admin {
    let password = read_password()?;
    anyhow::ensure!(!password.is_empty(), "password must not be empty");
    let user = store
      .add_user(
        NewUser {
          display_name:  username.clone(),
          username,
          bio:           None,
          password_hash: hash_password(&password)?,
          role:          Role::SuperAdmin,
        },
        Utc::now(),
      )
      .await
      .context("failed to create super-admin")?;
    println!("{}", user.user_id);
    return Ok(());
  }

  let state = AppState::new(store, Settings {
    session_ttl_hours: server_cfg.session_ttl_hours,
  });

  let app = Router::new()
    .nest("/api", showcase_api::api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = server_cfg.address();
  tracing::info!(store = ?store_path, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
