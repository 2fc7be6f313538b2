use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::model::{ApplicationKind, ApplicationStatus, DocumentStatus, Priority};
use crate::views::profile::{ProfileField, ProfileList};

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "apptrack",
    version,
    about = "Track college and scholarship applications, deadlines and documents",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Override a config key for this run, e.g. `--rc color=off`
    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Config file (defaults to $APPTRACKRC, then ~/.apptrackrc)
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory, overriding `data.location`
    #[arg(long = "data")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Stats, upcoming deadlines and recent activity
    Dashboard,

    /// Render a view by name (unknown names show the dashboard)
    View { name: String },

    /// Manage applications
    App {
        #[command(subcommand)]
        command: AppCommand,
    },

    /// Manage uploaded documents
    Doc {
        #[command(subcommand)]
        command: DocCommand,
    },

    /// Month grid of deadlines
    Calendar {
        /// Month to show, as YYYY-MM
        #[arg(long)]
        month: Option<String>,
    },

    /// Browse and adopt suggested colleges and scholarships
    Suggest {
        #[command(subcommand)]
        command: SuggestCommand,
    },

    /// Show or edit the student profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },

    /// Light or dark output theme
    Theme {
        #[command(subcommand)]
        command: ThemeCommand,
    },

    /// Dump every stored collection as JSON
    Export,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AppFields {
    #[arg(long = "type")]
    pub kind: Option<ApplicationKind>,

    /// Date expression: YYYY-MM-DD, today, tomorrow, friday, +2w ...
    #[arg(long)]
    pub deadline: Option<String>,

    #[arg(long)]
    pub status: Option<ApplicationStatus>,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AppCommand {
    Add {
        name: String,

        #[command(flatten)]
        fields: AppFields,

        /// Requirement line; repeatable
        #[arg(long = "require", action = ArgAction::Append)]
        requirements: Vec<String>,

        /// Checklist item; repeatable
        #[arg(long = "task", action = ArgAction::Append)]
        tasks: Vec<String>,
    },

    List {
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(long)]
        status: Option<ApplicationStatus>,

        #[arg(long = "type")]
        kind: Option<ApplicationKind>,
    },

    Show { id: String },

    Edit {
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: AppFields,
    },

    Delete { id: String },

    /// Add, toggle or remove checklist items
    Check {
        id: String,

        #[arg(long, action = ArgAction::Append)]
        add: Vec<String>,

        /// Checklist item id (or unique prefix)
        #[arg(long, action = ArgAction::Append)]
        toggle: Vec<String>,

        #[arg(long, action = ArgAction::Append)]
        remove: Vec<String>,
    },

    /// Add or remove requirement lines
    Require {
        id: String,

        #[arg(long, action = ArgAction::Append)]
        add: Vec<String>,

        /// 1-based position as shown by `app show`
        #[arg(long, action = ArgAction::Append)]
        remove: Vec<usize>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DocCommand {
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    List {
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(long = "type")]
        doc_type: Option<String>,

        #[arg(long)]
        status: Option<DocumentStatus>,
    },

    Delete { id: String },

    /// Mark a document completed (or pending again with --undo)
    Complete {
        id: String,

        #[arg(long)]
        undo: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Match,
    Deadline,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SuggestCommand {
    List {
        #[arg(long = "type")]
        kind: Option<ApplicationKind>,

        #[arg(long, value_enum, default_value_t = SortKey::Match)]
        sort: SortKey,
    },

    /// Copy a suggestion into the application list
    Adopt { id: String },

    /// Merge suggestions from a TOML or JSON catalog file
    Import { path: PathBuf },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    Show,

    Set { field: ProfileField, value: String },

    Add { list: ProfileList, value: String },

    Remove { list: ProfileList, value: String },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ThemeCommand {
    Show,
    Toggle,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pull bare `rc.key=value` / `rc.key:value` tokens out of the argument
/// list before clap sees them.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> PreprocessedArgs {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.")
            && let Some((k, v)) = rest.split_once('=').or_else(|| rest.split_once(':'))
        {
            debug!(key = %k, value = %v, "captured positional rc override");
            overrides.push((k.to_string(), v.to_string()));
            continue;
        }

        cleaned.push(arg);
    }

    PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    }
}
