//! Strand — development server for externally-supplied programs.
//!
//! Maps logical `workspace/program` names to files on disk, resolves static
//! assets through layered search roots, and generates the bootstrap script
//! that wires the browser's module loader to the right program.
//!
//! Usage:
//!   strand                                  # serve on port 8000, open browser
//!   strand --port 1234 --no-open            # alternate port, stay headless
//!   strand -W demo:/path/to/programs        # register an extra workspace
//!   strand -I /path/to/watchers             # register an extra watcher root
//!   strand path/to/program.js               # pin a single program
//!   strand --list-found                     # print discovered programs/watchers

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use parking_lot::RwLock;
use strand_config::{Config, DEFAULT_PORT, posixify};
use strand_server::discover;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "strand", about = "Strand development server")]
struct Cli {
    /// Search path(s) for programs, as <name>:<path> pairs
    #[arg(short = 'W', long = "workspace", value_name = "NAME:PATH")]
    workspace: Vec<String>,

    /// Search path(s) for watchers
    #[arg(short = 'I', long = "include", value_name = "PATH")]
    include: Vec<String>,

    /// Run the server on an alternate port
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Don't automatically open the app in the browser
    #[arg(short = 'n', long = "no-open")]
    no_open: bool,

    /// List all programs and watchers found within their search paths
    #[arg(short = 'f', long = "list-found")]
    list_found: bool,

    /// Installation root (defaults to the current directory)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Program file to run exclusively (pinned mode)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,
}

/// Parse `-W name:path` arguments. Each argument may carry several pairs
/// separated by commas or whitespace.
fn parse_workspace_pairs(args: &[String]) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    for raw in args {
        let cleaned = raw.replace(',', " ");
        for pair in cleaned.split_whitespace() {
            match pair.split_once(':') {
                Some((name, path)) if !name.is_empty() && !path.is_empty() => {
                    pairs.push((name.to_string(), path.to_string()));
                }
                _ => {
                    return Err(format!(
                        "Must specify a path for every workspace (got '{pair}')."
                    ));
                }
            }
        }
    }
    Ok(pairs)
}

fn list_found(config: &Config) {
    println!("Found programs:");
    for (workspace_id, workspace_path) in config.workspace_paths() {
        println!("  {workspace_id} ({workspace_path}):");
        let mut workspaces = std::collections::BTreeMap::new();
        workspaces.insert(workspace_id.clone(), workspace_path.clone());
        for program in discover::discover_programs(&workspaces) {
            println!("    {}", program.relative_path);
        }
        println!();
    }

    println!("Found watchers:");
    let root_prefix = format!("{}/", config.root);
    for watcher in discover::discover_watchers(config.watcher_paths()) {
        let relative = watcher.strip_prefix(&root_prefix).unwrap_or(&watcher);
        println!("  {relative}");
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Installation root: --root or cwd, canonicalized and posixified.
    let root = cli.root.unwrap_or_else(|| {
        std::env::current_dir().unwrap_or_else(|e| {
            error!("Failed to determine current directory: {e}");
            std::process::exit(1);
        })
    });
    let root = root.canonicalize().unwrap_or(root);
    let mut config = Config::new(posixify(&root.to_string_lossy()));

    match parse_workspace_pairs(&cli.workspace) {
        Ok(pairs) => {
            for (name, path) in pairs {
                config.set_workspace(name, path);
            }
        }
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    }
    for include in &cli.include {
        config.add_watcher_path(include);
    }
    config.port = cli.port;
    config.open = !cli.no_open;

    // A positional file pins the server to a single program, registered
    // under a synthetic "file" workspace at the file's parent directory.
    if cli.files.len() > 1 {
        eprintln!("Refusing to start multiple programs at once. Consider composing them instead.");
        std::process::exit(2);
    }
    if let Some(file) = cli.files.first() {
        let file = file.canonicalize().unwrap_or_else(|e| {
            eprintln!("Cannot read program file '{}': {e}", file.display());
            std::process::exit(2);
        });
        let Some((parent, name)) = file.parent().zip(file.file_name()) else {
            eprintln!("Cannot determine workspace for '{}'", file.display());
            std::process::exit(2);
        };
        config.set_workspace("file", parent.to_string_lossy());
        config.file = Some(format!("file/{}", name.to_string_lossy()));
    }

    if cli.list_found {
        list_found(&config);
        return;
    }

    info!("Starting Strand server on port '{}'...", config.port);
    let listener = match tokio::net::TcpListener::bind(("127.0.0.1", config.port)).await {
        Ok(listener) => listener,
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            eprintln!(
                "ERROR: Strand couldn't start because port {} is already in use.\n\n\
                 You can select a different port with the \"port\" argument.\n\
                 For example:\n\n> strand --port 1234",
                config.port
            );
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("ERROR: failed to bind port {}: {e}", config.port);
            std::process::exit(1);
        }
    };

    let shared = Arc::new(RwLock::new(config));
    if let Err(e) = strand_server::serve(listener, shared).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_pairs_split_on_commas_and_whitespace() {
        let pairs = parse_workspace_pairs(&["a:/x,b:/y c:/z".to_string()]).unwrap();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), "/x".to_string()),
                ("b".to_string(), "/y".to_string()),
                ("c".to_string(), "/z".to_string()),
            ]
        );
    }

    #[test]
    fn workspace_pairs_require_a_path() {
        assert!(parse_workspace_pairs(&["orphan".to_string()]).is_err());
        assert!(parse_workspace_pairs(&["name:".to_string()]).is_err());
    }
}
