pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod error;
pub mod filter;
pub mod model;
pub mod persisted;
pub mod render;
pub mod state;
pub mod storage;
pub mod views;

use std::ffi::OsString;
use std::rc::Rc;

use anyhow::Context;
use clap::Parser;
use tracing::{
  debug,
  info
};

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
    "starting apptrack"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  )?;

  let data_dir = cfg
    .data_dir(cli.data.as_deref())
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
  let storage: Rc<dyn storage::LocalStorage> =
    Rc::new(storage);

  let mut ctx =
    state::ViewContext::builder()
      .app(state::AppState::open(
        Rc::clone(&storage)
      ))
      .theme(state::ThemeState::open(
        storage
      ))
      .build()?;

  let tz = datetime::resolve_timezone(
    cfg.timezone.as_deref()
  );
  let clock = datetime::Clock::system(tz);

  let mut renderer =
    render::Renderer::new(
      &cfg,
      ctx.theme.is_dark()
    );

  commands::dispatch(
    &mut ctx,
    &cfg,
    &mut renderer,
    &clock,
    cli.command
  )?;

  info!("done");
  Ok(())
}
