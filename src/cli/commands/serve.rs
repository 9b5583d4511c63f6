//! cli::commands::serve
//!
//! Run the HTTP API until interrupted.

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::config::Overrides;
use crate::server::{self, AppState};
use crate::store::create_store;

pub fn serve(ctx: &Context, bind: Option<String>) -> Result<()> {
    let mut config = ctx.load_config()?;
    config.apply(Overrides {
        bind,
        ..Overrides::default()
    })?;

    let settings = config
        .store_settings()
        .context("content store is not configured")?;
    tracing::info!(
        owner = %settings.owner,
        repo = %settings.repo,
        branch = %settings.branch,
        config_file = ?config.file_path(),
        "starting server"
    );

    let state = AppState::new(create_store(&settings), config.branch_ttl());
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(server::serve(state, config.bind()))
}
