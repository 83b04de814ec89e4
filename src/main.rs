use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reachard::cli;
use reachard::config::{self, ReachardConfig};

#[derive(Debug, Parser)]
#[command(name = "reachard")]
#[command(about = "Client for the Reachard reachability monitor")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        /// Account name
        #[arg(long, short)]
        username: String,
        /// Password; read from stdin when omitted (input is echoed)
        #[arg(long, short)]
        password: Option<String>,
    },
    /// End the session and forget the stored token
    Logout,
    /// Show session, server, and store information
    Status,
    /// Manage monitored targets
    Targets {
        #[command(subcommand)]
        action: TargetsAction,
    },
    /// Render the view at an in-app path (e.g. /target/7) and exit
    Open {
        /// Pathname to resolve
        path: String,
    },
    /// Interactive navigation: type paths, back, forward, refresh, quit
    Browse {
        /// Starting pathname
        #[arg(default_value = "/")]
        path: String,
    },
    /// Manage reachard configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum TargetsAction {
    /// List targets
    List {
        /// Only targets owned by the logged-in account
        #[arg(long)]
        own: bool,
    },
    /// Add a target
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// URL to probe
        #[arg(long)]
        url: String,
        /// Probe interval in seconds
        #[arg(long, default_value = "60")]
        interval: u64,
    },
    /// Delete a target by id
    Delete {
        /// Target id
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file to ~/.reachard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. api.base_url
    Set {
        key: String,
        value: String,
    },
    /// Reset the global config to defaults
    Reset,
}

fn init_tracing(config: &ReachardConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let app = App::parse();
    let config = config::load();
    init_tracing(&config);

    match app.command {
        Commands::Login { username, password } => {
            cli::run_login(&config, &username, password.as_deref())
        }
        Commands::Logout => cli::run_logout(&config),
        Commands::Status => cli::run_status(&config),
        Commands::Targets { action } => match action {
            TargetsAction::List { own } => cli::run_targets_list(&config, own),
            TargetsAction::Add {
                name,
                url,
                interval,
            } => cli::run_targets_add(&config, &name, &url, interval),
            TargetsAction::Delete { id } => cli::run_targets_delete(&config, id),
        },
        Commands::Open { path } => cli::run_open(&config, &path),
        Commands::Browse { path } => cli::run_browse(&config, &path),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn password_help_warns_about_echo() {
        let app = App::command();
        let login = app.find_subcommand("login").unwrap();
        let password = login
            .get_arguments()
            .find(|arg| arg.get_id() == "password")
            .unwrap();
        let help = password.get_help().unwrap().to_string();
        assert!(help.contains("echoed"), "{help}");
    }

    #[test]
    fn login_accepts_password_flag() {
        let app = App::try_parse_from(["reachard", "login", "-u", "alice", "-p", "secret"]).unwrap();
        match app.command {
            Commands::Login { username, password } => {
                assert_eq!(username, "alice");
                assert_eq!(password.as_deref(), Some("secret"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
