//! Command-line front end.
//!
//! Thin layer over [`SessionManager`]: parses arguments, asks for
//! confirmation where a restore would skip folders, and prints results.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use clap::{ArgAction, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{AppConfig, ConfigError};
use crate::folder::FolderRecord;
use crate::manager::{SessionError, SessionManager};
use crate::session::{Session, SessionUpdate};

#[derive(Debug, Parser)]
#[command(name = "foldersess", version, about = "Save and reopen sets of file-manager folders")]
pub struct Cli {
    /// Directory holding sessions.json and config.json.
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List folders currently open in file-manager windows.
    OpenFolders,
    /// Save the open folders as a new session.
    Save {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
    },
    /// List saved sessions.
    List {
        #[arg(long)]
        favorites: bool,
    },
    /// Show one session with the current status of its folders.
    Show { id: String },
    /// Search names, descriptions, tags and folder paths.
    Search {
        #[arg(default_value = "")]
        text: String,
    },
    /// Reopen every available folder of a session.
    Restore {
        id: String,
        /// Skip the confirmation when some folders are unavailable.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show, or reopen, the most recently restored session.
    Last {
        #[arg(long)]
        restore: bool,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete a session.
    Delete { id: String },
    /// Toggle a session's favorite flag.
    Favorite { id: String },
    /// Change a session's name, description or tags.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        /// Replace the tag set (repeatable).
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
        /// Replace the folders with those open right now.
        #[arg(long)]
        replace_folders: bool,
    },
    /// Copy sessions.json to sessions_backup.json.
    Backup,
    /// Replace sessions.json with the backup copy.
    Recover,
    /// Print the effective configuration.
    Config {
        /// Write the effective configuration to config.json.
        #[arg(long)]
        init: bool,
    },
}

impl Command {
    /// Whether the command enumerates desktop windows.
    pub fn needs_windows(&self) -> bool {
        matches!(
            self,
            Self::OpenFolders | Self::Save { .. } | Self::Edit { replace_folders: true, .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to read confirmation: {0}")]
    Prompt(#[from] std::io::Error),

    #[error("restore cancelled")]
    Cancelled,

    #[error("no session has been restored yet")]
    NothingRestored,

    #[error("nothing to change")]
    NothingToChange,
}

pub async fn run(
    command: Command,
    manager: &SessionManager,
    config: &AppConfig,
    data_dir: &Path,
) -> Result<(), CliError> {
    match command {
        Command::OpenFolders => {
            let folders = manager.current_folders().await;
            if folders.is_empty() {
                println!("No open folders found.");
            }
            for folder in &folders {
                print_folder(folder);
            }
        }
        Command::Save {
            name,
            description,
            tags,
        } => {
            let session = manager.save_current(&name, description, tags).await?;
            println!(
                "Saved '{}' with {} folder(s).",
                session.name,
                session.folders.len()
            );
            println!("{}", session.id);
        }
        Command::List { favorites } => {
            let sessions = if favorites {
                manager.favorites().await
            } else {
                manager.all_sessions().await
            };
            print_sessions(&sessions);
        }
        Command::Show { id } => {
            let session = manager
                .session(&id)
                .await
                .ok_or_else(|| SessionError::NotFound(id.clone()))?;
            let split = manager.check_session(&id).await?;
            print_session(&session);
            for folder in split.accessible.iter().chain(&split.inaccessible) {
                print_folder(folder);
            }
        }
        Command::Search { text } => print_sessions(&manager.search(&text).await),
        Command::Restore { id, yes } => restore(manager, &id, yes).await?,
        Command::Last { restore: reopen, yes } => {
            let session = manager.last_used().await.ok_or(CliError::NothingRestored)?;
            if reopen {
                restore(manager, &session.id, yes).await?;
            } else {
                print_session(&session);
            }
        }
        Command::Delete { id } => {
            let removed = manager.delete_session(&id).await?;
            println!("Deleted '{}'.", removed.name);
        }
        Command::Favorite { id } => {
            let favorite = manager.toggle_favorite(&id).await?;
            if favorite {
                println!("Marked as favorite.");
            } else {
                println!("Removed from favorites.");
            }
        }
        Command::Edit {
            id,
            name,
            description,
            clear_description,
            tags,
            clear_tags,
            replace_folders,
        } => {
            let mut update = SessionUpdate::new();
            if let Some(name) = name {
                update = update.name(name);
            }
            if clear_description {
                update = update.description(None);
            } else if description.is_some() {
                update = update.description(description);
            }
            if clear_tags {
                update = update.tags(Vec::new());
            } else if !tags.is_empty() {
                update = update.tags(tags);
            }
            if replace_folders {
                update = update.folders(manager.current_folders().await);
            }
            if update.is_empty() {
                return Err(CliError::NothingToChange);
            }
            let session = manager.update_session(&id, update).await?;
            print_session(&session);
        }
        Command::Backup => {
            manager.backup().await?;
            let path = manager.store().backup_file_path();
            println!("Backed up to {}.", path.display());
        }
        Command::Recover => {
            manager.restore_from_backup().await?;
            let path = manager.store().data_file_path();
            println!("Restored {} from backup.", path.display());
        }
        Command::Config { init } => {
            if init {
                let path = config.write(data_dir)?;
                println!("Wrote {}.", path.display());
            }
            if let Ok(json) = serde_json::to_string_pretty(config) {
                println!("{json}");
            }
        }
    }
    Ok(())
}

async fn restore(manager: &SessionManager, id: &str, yes: bool) -> Result<(), CliError> {
    let split = manager.check_session(id).await?;

    if !split.inaccessible.is_empty() {
        println!("{} folder(s) are unavailable:", split.inaccessible.len());
        for folder in &split.inaccessible {
            println!("  {} ({})", folder.path, folder.status_label());
        }
        if !split.accessible.is_empty()
            && !yes
            && !confirm(&format!("Open the remaining {} folder(s)?", split.accessible.len())).await?
        {
            return Err(CliError::Cancelled);
        }
    }

    let report = manager.restore_session(id).await?;
    println!(
        "Opened {} of {} folder(s) from '{}'.",
        report.opened.len(),
        report.session.folders.len(),
        report.session.name
    );
    for folder in &report.failed {
        println!("  failed: {}", folder.path);
    }
    Ok(())
}

async fn confirm(question: &str) -> Result<bool, std::io::Error> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_sessions(sessions: &[Session]) {
    if sessions.is_empty() {
        println!("No sessions.");
    }
    for session in sessions {
        print_session(session);
    }
}

fn print_session(session: &Session) {
    let star = if session.is_favorite { "*" } else { " " };
    let last_used = session
        .last_used_at
        .map(local_time)
        .unwrap_or_else(|| "never".into());
    println!(
        "{} {star} {}  ({} folders, updated {}, last used {last_used})",
        session.id,
        session.name,
        session.folders.len(),
        local_time(session.updated_at)
    );
    if let Some(description) = &session.description {
        println!("    {description}");
    }
    if !session.tags.is_empty() {
        let tags: Vec<&str> = session.tags.iter().map(String::as_str).collect();
        println!("    tags: {}", tags.join(", "));
    }
}

fn print_folder(folder: &FolderRecord) {
    println!(
        "  {:<14} {:<9} {}",
        folder.status_label(),
        folder.kind.label(),
        folder.path
    );
}

fn local_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_save_with_tags() {
        let cli = Cli::try_parse_from([
            "foldersess", "save", "Work", "-t", "a", "--tag", "b", "-d", "desc",
        ])
        .unwrap();
        match cli.command {
            Command::Save {
                name,
                description,
                tags,
            } => {
                assert_eq!(name, "Work");
                assert_eq!(description.as_deref(), Some("desc"));
                assert_eq!(tags, vec!["a", "b"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["foldersess", "list", "--data-dir", "/tmp/x", "-vv"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(cli.verbose, 2);
        assert!(!cli.command.needs_windows());
    }

    #[test]
    fn search_text_defaults_to_empty() {
        let cli = Cli::try_parse_from(["foldersess", "search"]).unwrap();
        assert!(matches!(cli.command, Command::Search { ref text } if text.is_empty()));
    }

    #[test]
    fn only_discovery_commands_need_windows() {
        let save = Cli::try_parse_from(["foldersess", "save", "x"]).unwrap();
        assert!(save.command.needs_windows());
        let open = Cli::try_parse_from(["foldersess", "open-folders"]).unwrap();
        assert!(open.command.needs_windows());
        let edit =
            Cli::try_parse_from(["foldersess", "edit", "id", "--replace-folders"]).unwrap();
        assert!(edit.command.needs_windows());
        let rename = Cli::try_parse_from(["foldersess", "edit", "id", "--name", "x"]).unwrap();
        assert!(!rename.command.needs_windows());
    }
}
