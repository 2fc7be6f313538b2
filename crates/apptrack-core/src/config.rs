//! `apptrackrc` settings.
//!
//! The rc file holds `key = value` lines, `#` comments and
//! `include PATH` lines. Every key is checked as it is read, so
//! a typo in a value fails at startup instead of mid-command.

use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::str::FromStr;

use anyhow::{
  Context,
  anyhow,
  bail
};
use tracing::{
  debug,
  info,
  warn
};

use crate::views::View;

pub const CONFIG_ENV_VAR: &str =
  "APPTRACKRC";

const RC_FILE_NAME: &str =
  ".apptrackrc";
const DATA_DIR_NAME: &str =
  ".apptrack";
const MAX_INCLUDE_DEPTH: usize = 8;

/// The settings apptrack reads.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum ConfigKey {
  DataLocation,
  DefaultView,
  Color,
  Timezone
}

impl ConfigKey {
  pub fn as_str(&self) -> &'static str {
    match self {
      | Self::DataLocation => {
        "data.location"
      }
      | Self::DefaultView => {
        "default.view"
      }
      | Self::Color => "color",
      | Self::Timezone => "timezone"
    }
  }
}

impl FromStr for ConfigKey {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let key = s.trim();
    let key = key
      .strip_prefix("rc.")
      .unwrap_or(key);
    match key {
      | "data.location" => {
        Ok(Self::DataLocation)
      }
      | "default.view" => {
        Ok(Self::DefaultView)
      }
      | "color" => Ok(Self::Color),
      | "timezone" => Ok(Self::Timezone),
      | other => {
        Err(anyhow!(
          "unknown setting '{other}'"
        ))
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
  /// `None` means `~/.apptrack`.
  pub data_location: Option<PathBuf>,
  pub default_view: View,
  pub color: bool,
  /// Checked later by
  /// `datetime::resolve_timezone`,
  /// which falls back to UTC.
  pub timezone: Option<String>,
  pub source: Option<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    Self {
      data_location: None,
      default_view: View::Dashboard,
      color: true,
      timezone: None,
      source: None
    }
  }
}

impl Config {
  /// Reads `--config`, else
  /// `$APPTRACKRC`, else
  /// `~/.apptrackrc` when it exists.
  #[tracing::instrument]
  pub fn load(
    explicit: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Self::default();
    let Some(path) =
      locate_rc(explicit)
    else {
      debug!(
        "no apptrackrc; using defaults"
      );
      return Ok(cfg);
    };

    info!(config = %path.display(), "reading apptrackrc");
    cfg.read_rc(&path, 0)?;
    cfg.source = Some(path);
    Ok(cfg)
  }

  /// Set one setting from text.
  pub fn set(
    &mut self,
    key: ConfigKey,
    value: &str
  ) -> anyhow::Result<()> {
    let value = value.trim();
    match key {
      | ConfigKey::DataLocation => {
        if value.is_empty() {
          bail!(
            "data.location cannot be \
             empty"
          );
        }
        self.data_location = Some(
          expand_home(Path::new(value))
        );
      }
      | ConfigKey::DefaultView => {
        let view =
          View::from_name(value);
        if !view.id().eq_ignore_ascii_case(value) {
          warn!(
            requested = value,
            "unknown default.view; \
             showing the dashboard"
          );
        }
        self.default_view = view;
      }
      | ConfigKey::Color => {
        self.color =
          parse_switch(value)
            .ok_or_else(|| {
              anyhow!(
                "invalid color \
                 setting: {value}"
              )
            })?;
      }
      | ConfigKey::Timezone => {
        self.timezone = (!value
          .is_empty())
        .then(|| value.to_string());
      }
    }
    Ok(())
  }

  /// `--rc key=value` pairs, with
  /// or without the `rc.` prefix.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (raw_key, value) in overrides {
      let key = raw_key
        .parse::<ConfigKey>()
        .with_context(|| {
          format!(
            "bad override \
             {raw_key}={value}"
          )
        })?;
      debug!(key = key.as_str(), %value, "override");
      self.set(key, &value)?;
    }
    Ok(())
  }

  /// The data directory, created if
  /// missing. `--data` wins over the
  /// rc setting.
  #[tracing::instrument(skip(self))]
  pub fn data_dir(
    &self,
    explicit: Option<&Path>
  ) -> anyhow::Result<PathBuf> {
    let dir = match (
      explicit,
      &self.data_location
    ) {
      | (Some(path), _) => {
        expand_home(path)
      }
      | (None, Some(path)) => {
        path.clone()
      }
      | (None, None) => {
        dirs::home_dir()
          .ok_or_else(|| {
            anyhow!(
              "cannot determine home \
               directory"
            )
          })?
          .join(DATA_DIR_NAME)
      }
    };

    if !dir.is_dir() {
      info!(dir = %dir.display(), "creating data directory");
      fs::create_dir_all(&dir)
        .with_context(|| {
          format!(
            "failed to create {}",
            dir.display()
          )
        })?;
    }
    Ok(dir)
  }

  fn read_rc(
    &mut self,
    path: &Path,
    depth: usize
  ) -> anyhow::Result<()> {
    if depth > MAX_INCLUDE_DEPTH {
      bail!(
        "includes nested too deeply \
         at {}",
        path.display()
      );
    }
    let text = fs::read_to_string(path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;

    for (idx, raw) in
      text.lines().enumerate()
    {
      let line = raw
        .split('#')
        .next()
        .unwrap_or_default()
        .trim();
      if line.is_empty() {
        continue;
      }
      let at = || {
        format!(
          "{}:{}",
          path.display(),
          idx + 1
        )
      };

      if let Some(target) =
        line.strip_prefix("include ")
      {
        let target =
          include_target(path, target);
        debug!(include = %target.display(), "following include");
        self
          .read_rc(&target, depth + 1)
          .with_context(|| {
            format!(
              "include at {}",
              at()
            )
          })?;
        continue;
      }

      let Some((key, value)) =
        line.split_once('=')
      else {
        bail!(
          "invalid config line {}: \
           {raw}",
          at()
        );
      };
      match key.parse::<ConfigKey>() {
        | Ok(key) => {
          self
            .set(key, value)
            .with_context(at)?;
        }
        | Err(err) => {
          warn!(location = %at(), error = %err, "ignoring setting");
        }
      }
    }
    Ok(())
  }
}

fn locate_rc(
  explicit: Option<&Path>
) -> Option<PathBuf> {
  if let Some(path) = explicit {
    return Some(expand_home(path));
  }
  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
    && !raw.trim().is_empty()
  {
    return Some(expand_home(
      Path::new(raw.trim())
    ));
  }
  dirs::home_dir()
    .map(|home| home.join(RC_FILE_NAME))
    .filter(|path| path.is_file())
}

fn include_target(
  from: &Path,
  target: &str
) -> PathBuf {
  let target =
    expand_home(Path::new(target.trim()));
  if target.is_absolute() {
    return target;
  }
  from
    .parent()
    .unwrap_or(Path::new("."))
    .join(target)
}

fn expand_home(path: &Path) -> PathBuf {
  match path.strip_prefix("~") {
    | Ok(rest) => {
      dirs::home_dir()
        .map(|home| home.join(rest))
        .unwrap_or_else(|| {
          path.to_path_buf()
        })
    }
    | Err(_) => path.to_path_buf()
  }
}

fn parse_switch(
  raw: &str
) -> Option<bool> {
  match raw
    .to_ascii_lowercase()
    .as_str()
  {
    | "on" | "yes" | "true" | "1" => {
      Some(true)
    }
    | "off" | "no" | "false" | "0" => {
      Some(false)
    }
    | _ => None
  }
}
