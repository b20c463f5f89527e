pub mod cli;
pub mod collection;
pub mod commands;
pub mod config;
pub mod controller;
pub mod datastore;
pub mod edit;
pub mod error;
pub mod filter;
pub mod label;
pub mod ports;
pub mod render;
pub mod task;
pub mod view_state;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

pub use collection::{
  ChangeSet,
  CollectionEvent,
  TaskCollection
};
pub use controller::{
  FieldAction,
  ItemRole,
  Key,
  TodoController
};
pub use error::ControllerError;
pub use filter::FilterToken;
pub use view_state::{
  ViewCounts,
  ViewState
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
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
    "starting tickbox"
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

  let filter = match cli.filter.as_deref()
  {
    | Some(raw) => raw.parse()?,
    | None => cfg.default_filter()?
  };

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let store =
    datastore::DataStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open datastore at \
         {}",
        data_dir.display()
      )
    })?;

  let mut renderer =
    render::Renderer::new(&cfg);

  commands::dispatch(
    store,
    &mut renderer,
    filter,
    cli.command.unwrap_or(
      cli::Command::List
    )
  )?;

  info!("done");
  Ok(())
}
