//! Quorum server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and the in-memory identity provider, starts the access controller,
//! and serves the JSON API over HTTP.
//!
//! The identity provider holds credentials in memory, so a fresh process has
//! no accounts; set `seed_admin_email` and `seed_admin_password` in the
//! config to create the first admin at startup.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use quorum_api::{AppState, ServerConfig};
use quorum_core::{
  identity::{Claims, IdentityProvider as _},
  profile::{MembershipStatus, NewProfile, Role},
  store::CommunityStore as _,
};
use quorum_identity::LocalIdentity;
use quorum_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Quorum community server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QUORUM"))
    .build()
    .context("failed to read config file")?;
  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let identity = LocalIdentity::new();
  if let (Some(email), Some(password)) = (
    server_cfg.seed_admin_email.as_deref(),
    server_cfg.seed_admin_password.as_deref(),
  ) {
    seed_admin(&identity, &store, email, password).await?;
  }

  // The controller owns the suspension kill switch; subscribe before
  // spawning so the loop has a live receiver.
  let controller =
    quorum_engine::AccessController::new(identity.clone(), store.clone());
  let _access_rx = controller.subscribe();
  tokio::spawn(controller.run());

  let state = AppState::new(identity, store);
  let app = quorum_api::router(state).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Create the configured admin account with an approved profile and the
/// admin claim. A no-op if the email is already registered.
async fn seed_admin(
  identity: &LocalIdentity,
  store: &SqliteStore,
  email: &str,
  password: &str,
) -> anyhow::Result<()> {
  let Some(principal) = identity
    .sign_up(email, password)
    .await
    .context("failed to seed admin account")?
  else {
    tracing::info!(email, "seed admin already registered");
    return Ok(());
  };

  store
    .create_profile(NewProfile {
      principal_id: principal.principal_id,
      name:         email.split('@').next().unwrap_or(email).to_string(),
      email:        principal.email.clone(),
      phone:        None,
      bio:          None,
    })
    .await
    .context("failed to create seed admin profile")?;
  store
    .set_status(principal.principal_id, MembershipStatus::Approved)
    .await?;
  store.set_role(principal.principal_id, Role::Admin).await?;
  identity
    .set_claims(principal.principal_id, Claims::admin())
    .await
    .context("failed to set seed admin claim")?;

  tracing::info!(email, principal_id = %principal.principal_id, "seeded admin");
  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
