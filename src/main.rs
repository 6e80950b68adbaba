mod decision;
mod git;
mod hook;
mod install;
mod logging;
mod notifier;
mod preferences;
mod settings;
mod transcript;
mod types;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use tracing::{debug, warn};

use git::Git;
use hook::{HookContext, Outcome};
use install::InstallOptions;
use notifier::{Disabled, Notifier, Platform};
use preferences::{Preferences, SanitizePolicy};
use transcript::Sanitizer;

#[derive(Parser)]
#[command(
    name = "autocommitter",
    version,
    about = "Auto-commit and notify when a Claude session stops"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ClaudeDirArg {
    /// Claude configuration directory [default: ~/.claude]
    #[arg(long, env = "CLAUDE_CONFIG_PATH", global = true)]
    claude_dir: Option<PathBuf>,
}

impl ClaudeDirArg {
    /// The configured directory, made absolute against the current directory.
    fn resolve(&self) -> Result<PathBuf> {
        let dir = match &self.claude_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .map(|home| home.join(".claude"))
                .context("cannot find home directory; pass --claude-dir")?,
        };
        std::path::absolute(&dir).with_context(|| format!("resolving {}", dir.display()))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Write the hook scripts and register them in settings.json
    Install {
        #[command(flatten)]
        dir: ClaudeDirArg,
        /// Back up an existing settings.json before rewriting it
        #[arg(long)]
        backup: bool,
    },
    /// Check that settings.json and the hook scripts are in place
    Validate {
        #[command(flatten)]
        dir: ClaudeDirArg,
    },
    /// Run a Stop hook; reads the event payload from stdin
    Hook {
        #[command(subcommand)]
        kind: HookKind,
        #[command(flatten)]
        dir: ClaudeDirArg,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum HookKind {
    /// Commit pending changes using the last assistant message
    Commit,
    /// Show a desktop notification with the last assistant message
    Notify,
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Run a hook end to end. Errors here are setup failures (stdin, cwd,
/// home directory); the hooks themselves never fail.
fn run_hook(kind: HookKind, dir: &ClaudeDirArg) -> Result<Outcome> {
    let input = read_stdin().context("reading hook payload from stdin")?;
    let hooks_dir = install::hooks_dir(&dir.resolve()?);

    let prefs = match Preferences::read(&hooks_dir) {
        Ok(prefs) => prefs.unwrap_or_default(),
        Err(e) => {
            warn!(error = %format!("{e:#}"), "falling back to default preferences");
            Preferences::default()
        }
    };
    let sanitizer = match Sanitizer::new(&prefs.sanitize) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %format!("{e:#}"), "falling back to default sanitize policy");
            Sanitizer::new(&SanitizePolicy::default())?
        }
    };
    let notifier: Box<dyn Notifier> = if prefs.notifications {
        notifier::for_platform(Platform::current())
    } else {
        Box::new(Disabled)
    };
    let ctx = HookContext {
        prefs: &prefs,
        hooks_dir: &hooks_dir,
        sanitizer: &sanitizer,
        notifier: notifier.as_ref(),
    };

    let outcome = match kind {
        HookKind::Commit => {
            let cwd = std::env::current_dir().context("reading current directory")?;
            hook::run_commit(&input, &ctx, &Git::discover(&cwd))
        }
        HookKind::Notify => hook::run_notify(&input, &ctx),
    };
    Ok(outcome)
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Install { dir, backup } => {
            logging::init("info");
            let result = dir
                .resolve()
                .and_then(|claude_dir| install::install(&claude_dir, &InstallOptions { backup }));
            match result {
                Ok(()) => println!("Setup completed successfully"),
                Err(err) => {
                    eprintln!("autocommitter: {err:#}");
                    process::exit(1);
                }
            }
        }
        Command::Validate { dir } => {
            logging::init("info");
            let claude_dir = match dir.resolve() {
                Ok(d) => d,
                Err(err) => {
                    eprintln!("autocommitter: {err:#}");
                    process::exit(1);
                }
            };
            let report = settings::validate(&claude_dir);
            if report.passed {
                println!("{}", report.message);
            } else {
                eprintln!("autocommitter: {}", report.message);
                process::exit(1);
            }
        }
        Command::Hook { kind, dir } => {
            logging::init("warn");
            match run_hook(kind, &dir) {
                Ok(outcome) => debug!(?outcome, "hook finished"),
                Err(err) => warn!(error = %format!("{err:#}"), "hook skipped"),
            }
        }
    }
}
