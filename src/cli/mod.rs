mod admin;
mod check;
mod commands;
mod group;

use std::fs;
use std::path::Path;
use std::sync::Arc;

pub use admin::{run_info, run_init};
pub use check::run_check;
pub use commands::{AdminCommands, GroupCommands};
pub use group::run_group;

use crate::config::Config;
use crate::store::{SqliteStore, Store};
use crate::types::UserId;
use crate::warden::Warden;

/// Loads configuration and opens the store it names, creating the schema if needed.
pub fn open_warden(config_path: Option<&Path>) -> anyhow::Result<(Config, Arc<Warden>)> {
    let config = Config::load(config_path)?;

    if let Some(parent) = config.store.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let store = SqliteStore::new(&config.store.path)?;
    store.initialize()?;

    let warden = Warden::from_config(Arc::new(store), &config);
    Ok((config, Arc::new(warden)))
}

/// The acting user for a command: `--as` if given, else the override user.
fn resolve_actor(warden: &Warden, actor: Option<UserId>) -> anyhow::Result<UserId> {
    actor
        .or(warden.authority().override_user)
        .ok_or_else(|| anyhow::anyhow!("--as is required when no override user is configured"))
}
