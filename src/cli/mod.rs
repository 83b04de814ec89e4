//! CLI command implementations for reachard.
//!
//! Provides subcommand handlers for:
//! - `reachard login|logout|status`: session management
//! - `reachard targets list|add|delete`: target management
//! - `reachard open <path>`: render one view and exit
//! - `reachard browse [path]`: interactive navigation over the router
//! - `reachard config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;
use tracing::warn;

use crate::api::{ApiClient, ApiError, Backend, NewTarget};
use crate::auth::AuthCache;
use crate::config::{self, ReachardConfig};
use crate::dashboard::{Dashboard, DashboardError, DashboardOptions};
use crate::render::{RenderSink, TerminalRenderer};
use crate::router::MemoryHistory;
use crate::store::{FileStore, KeyValueStore, MemoryStore};

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Where session state lives for this process.
#[derive(Debug, Clone)]
pub enum StoreLocation {
    File(PathBuf),
    /// The file store could not be opened; the session lasts only as long
    /// as the process.
    Memory,
}

/// Open the credential store named by the config.
///
/// An unusable store degrades to an in-memory one so the client keeps
/// working, logged out.
pub fn open_auth(config: &ReachardConfig) -> (AuthCache, StoreLocation) {
    let Some(path) = config.store.resolved_path() else {
        warn!("could not resolve store path; session will not persist");
        return memory_auth();
    };

    match FileStore::open(&path) {
        Ok(store) => {
            let store: Arc<dyn KeyValueStore> = Arc::new(store);
            (AuthCache::new(store), StoreLocation::File(path))
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "credential store unavailable; session will not persist");
            memory_auth()
        }
    }
}

fn memory_auth() -> (AuthCache, StoreLocation) {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    (AuthCache::new(store), StoreLocation::Memory)
}

fn build_dashboard(config: &ReachardConfig, start_path: &str) -> Result<Dashboard> {
    let (auth, _) = open_auth(config);
    let backend = Arc::new(ApiClient::from_config(&config.api, auth.clone()));
    let sink: Arc<dyn RenderSink> = Arc::new(TerminalRenderer::new());
    let options = DashboardOptions {
        charts: config.charts.clone(),
        ..DashboardOptions::default()
    };
    Dashboard::new(
        auth,
        backend,
        Box::new(MemoryHistory::new(start_path)),
        sink,
        options,
    )
}

/// Turn a dashboard failure into a user-facing error with a hint.
fn explain(error: DashboardError) -> anyhow::Error {
    match error {
        DashboardError::Api(ApiError::NotLoggedIn) => {
            anyhow::anyhow!("not logged in. Run `reachard login --username <USER>` first.")
        }
        DashboardError::Api(ApiError::Status { status: 401, .. }) => anyhow::anyhow!(
            "the server rejected the session. Run `reachard login` again."
        ),
        other => anyhow::Error::new(other),
    }
}

// ---------------------------------------------------------------------------
// reachard login | logout | status
// ---------------------------------------------------------------------------

/// Log in and persist the session token.
pub fn run_login(config: &ReachardConfig, username: &str, password: Option<&str>) -> Result<()> {
    let password = match password {
        Some(p) => p.to_string(),
        None => prompt(PASSWORD_PROMPT)?,
    };

    let mut dashboard = build_dashboard(config, "/")?;
    dashboard.log_in(username, &password).map_err(explain)?;
    println!("{} Logged in as {}", "✓".green().bold(), username.bold());
    Ok(())
}

/// End the session, locally and (best effort) on the server.
pub fn run_logout(config: &ReachardConfig) -> Result<()> {
    let mut dashboard = build_dashboard(config, "/")?;
    if !dashboard.is_logged_in() {
        println!("{}", "Already logged out.".yellow());
        return Ok(());
    }
    dashboard.log_out().map_err(explain)?;
    println!("{} Logged out", "✓".green().bold());
    Ok(())
}

/// Show session, server, and store information.
pub fn run_status(config: &ReachardConfig) -> Result<()> {
    let (auth, location) = open_auth(config);

    println!("{}", "Reachard Status".bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Server: ".bold(), config.api.base_url);
    match &location {
        StoreLocation::File(path) => println!("  {} {}", "Store:  ".bold(), path.display()),
        StoreLocation::Memory => println!(
            "  {} {}",
            "Store:  ".bold(),
            "unavailable (in-memory fallback)".yellow()
        ),
    }
    if auth.is_logged_in() {
        println!("  {} {}", "Session:".bold(), "logged in".green());
    } else {
        println!("  {} {}", "Session:".bold(), "logged out".yellow());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// reachard targets list | add | delete
// ---------------------------------------------------------------------------

pub fn run_targets_list(config: &ReachardConfig, own: bool) -> Result<()> {
    let (auth, _) = open_auth(config);
    let client = ApiClient::from_config(&config.api, auth);
    let targets = client
        .list_targets(own)
        .map_err(|e| explain(DashboardError::Api(e)))?;

    let renderer = TerminalRenderer::new();
    renderer.set_title(if own { "My targets" } else { "Targets" });
    renderer.show_targets(&targets);
    if targets.is_empty() {
        renderer.show_no_targets();
    }
    Ok(())
}

pub fn run_targets_add(config: &ReachardConfig, name: &str, url: &str, interval: u64) -> Result<()> {
    if interval == 0 {
        bail!("interval must be at least 1 second");
    }
    let mut dashboard = build_dashboard(config, "/")?;
    let target = NewTarget {
        name: name.to_string(),
        url: url.to_string(),
        interval_seconds: interval,
    };
    dashboard.add_target(&target).map_err(explain)?;
    println!("{} Added target {}", "✓".green().bold(), name.bold());
    Ok(())
}

pub fn run_targets_delete(config: &ReachardConfig, id: i64) -> Result<()> {
    let mut dashboard = build_dashboard(config, "/")?;
    dashboard.delete_target(id).map_err(explain)?;
    println!("{} Deleted target {}", "✓".green().bold(), id);
    Ok(())
}

// ---------------------------------------------------------------------------
// reachard open | browse
// ---------------------------------------------------------------------------

/// Resolve `path` as the initial location, render it, and wait for its
/// charts.
pub fn run_open(config: &ReachardConfig, path: &str) -> Result<()> {
    let mut dashboard = build_dashboard(config, path)?;
    let matched = dashboard
        .router()
        .views()
        .iter()
        .any(|view| view.pattern().is_match(path));
    if !matched {
        eprintln!(
            "{} no view matches '{}', showing the default view",
            "!".yellow().bold(),
            path
        );
    }
    dashboard.start();
    dashboard.wait_for_widgets();
    Ok(())
}

const BROWSE_HELP: &str = "\
  /path      navigate (e.g. /targets, /target/7, /profile)
  back       previous history entry
  forward    next history entry
  refresh    reload the current view
  login USER log in (prompts for the password, input is echoed)
  logout     end the session
  help       show this help
  quit       exit";

/// Line-driven navigation over the router.
pub fn run_browse(config: &ReachardConfig, path: &str) -> Result<()> {
    let mut dashboard = build_dashboard(config, path)?;
    dashboard.start();
    dashboard.wait_for_widgets();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n{} ", format!("{}>", dashboard.router().location()).dimmed());
        io::stdout().flush().context("failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read command")?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command {
            "quit" | "exit" | "q" => break,
            "help" | "?" => println!("{BROWSE_HELP}"),
            "back" => {
                if !dashboard.router_mut().back() {
                    println!("{}", "Nothing to go back to.".yellow());
                }
            }
            "forward" => {
                if !dashboard.router_mut().forward() {
                    println!("{}", "Nothing to go forward to.".yellow());
                }
            }
            "refresh" => dashboard.router_mut().refresh(),
            "login" => {
                let Some(username) = words.next() else {
                    println!("{}", "usage: login USER".yellow());
                    continue;
                };
                let password = prompt_from(&mut lines, PASSWORD_PROMPT)?;
                if let Err(e) = dashboard.log_in(username, &password) {
                    println!("{} {:#}", "✗".red().bold(), explain(e));
                }
            }
            "logout" => {
                if let Err(e) = dashboard.log_out() {
                    println!("{} {:#}", "✗".red().bold(), explain(e));
                }
            }
            path if path.starts_with('/') => {
                if !dashboard.open(path) {
                    println!("{} no view matches '{}'", "✗".red().bold(), path);
                }
            }
            other => println!("{} unknown command '{}'; try help", "✗".red().bold(), other),
        }
        dashboard.wait_for_widgets();
    }
    Ok(())
}

/// Passwords are read as plain lines, so the prompt says they are visible.
const PASSWORD_PROMPT: &str = "Password (input is echoed): ";

fn prompt(label: &str) -> Result<String> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    prompt_from(&mut lines, label)
}

fn prompt_from(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush().context("failed to flush stdout")?;
    match lines.next() {
        Some(line) => Ok(line.context("failed to read input")?.trim_end_matches('\r').to_string()),
        None => bail!("no input provided"),
    }
}

// ---------------------------------------------------------------------------
// reachard config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Reachard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.reachard/config.toml");
    print_source(project_exists, ".reachard.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "REACHARD_* environment variables".dimmed()
    );
    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.reachard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    let path = config::set_config_value(key, value)?;
    println!(
        "{} Set {} = {} in {}",
        "✓".green().bold(),
        key.bold(),
        value,
        path.display()
    );
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}
