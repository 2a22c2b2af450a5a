pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod editor;
pub mod error;
pub mod progress;
pub mod render;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

use crate::datetime::SystemClock;
use crate::view::View;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args);
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting myday"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.rc_file.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let storage =
    storage::FileStorage::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open storage at {}",
        data_dir.display()
      )
    })?;

  let store = store::TaskStore::load(
    storage,
    cfg.storage_key(),
    &SystemClock
  )
  .context("failed to load tasks")?;

  let mut app =
    app::App::new(store, SystemClock);
  let mut renderer =
    render::Renderer::new(&cfg)?;

  let active = cli
    .view
    .as_deref()
    .map(View::from_key)
    .unwrap_or_else(|| {
      cfg.default_view()
    });

  commands::dispatch(
    &mut app,
    &mut renderer,
    active,
    cli.command
  )?;

  info!("done");
  Ok(())
}
