//! Program and watcher discovery via filesystem pattern search.
//!
//! Discovery is recomputed on every request that needs it — the filesystem
//! is the source of truth and the scans are cheap, so nothing is cached. A
//! missing or unreadable root contributes an empty result rather than an
//! error; a misconfigured extra search path must not take down the server.

use std::collections::BTreeMap;

use glob::glob;
use serde::Serialize;
use tracing::warn;

use strand_config::posixify;

/// A program file found inside a registered workspace. Derived per request,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredProgram {
    pub workspace_id: String,
    pub relative_path: String,
}

impl DiscoveredProgram {
    /// The logical address the client loader uses: `workspaceId/relativePath`.
    pub fn address(&self) -> String {
        format!("{}/{}", self.workspace_id, self.relative_path)
    }
}

/// List program files directly inside each registered workspace root.
///
/// Workspaces are visited in the mapping's key order; within a workspace,
/// matches come back in filesystem listing order.
pub fn discover_programs(workspace_paths: &BTreeMap<String, String>) -> Vec<DiscoveredProgram> {
    let mut programs = Vec::new();
    for (workspace_id, workspace_path) in workspace_paths {
        let pattern = format!("{workspace_path}/*.js");
        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping workspace '{workspace_id}': invalid search pattern: {e}");
                continue;
            }
        };
        for entry in entries {
            let Ok(path) = entry else { continue };
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            programs.push(DiscoveredProgram {
                workspace_id: workspace_id.clone(),
                relative_path: name.to_string(),
            });
        }
    }
    programs
}

/// Recursively scan each watcher root for extension modules, in root order.
///
/// A file reachable through two registered roots is emitted once — watchers
/// run side effects on load, and loading one twice is never what the user
/// meant.
pub fn discover_watchers(watcher_paths: &[String]) -> Vec<String> {
    let mut watchers: Vec<String> = Vec::new();
    for watcher_path in watcher_paths {
        let pattern = format!("{watcher_path}/**/*.js");
        let entries = match glob(&pattern) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping watcher root '{watcher_path}': invalid search pattern: {e}");
                continue;
            }
        };
        for entry in entries {
            let Ok(path) = entry else { continue };
            if !path.is_file() {
                continue;
            }
            let normalized = posixify(&path.to_string_lossy());
            if !watchers.contains(&normalized) {
                watchers.push(normalized);
            }
        }
    }
    watchers
}
