//! Process configuration and the workspace registry.
//!
//! `Config` is the single mutable object shared by the CLI layer and the
//! request handlers. It owns the mapping from workspace identifiers to
//! filesystem roots and the ordered list of watcher search roots. All paths
//! are stored in canonical forward-slash form so that concatenation into
//! URLs and module specifiers is deterministic across host filesystems.

use std::collections::BTreeMap;

use serde::Serialize;

/// Default port the server binds when none is requested.
pub const DEFAULT_PORT: u16 = 8000;

/// Convert a path string to canonical forward-slash form. Idempotent.
pub fn posixify(path: &str) -> String {
    path.replace('\\', "/")
}

/// Server configuration — workspace registry, watcher roots, bind options.
///
/// Serialized (camelCase) into the bootstrap fragment as the `__config`
/// global consumed by the client-side loader.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Absolute installation root, posixified. Fixed after construction.
    pub root: String,
    /// Compiled source root served to the client loader.
    pub src: String,
    workspace_paths: BTreeMap<String, String>,
    watcher_paths: Vec<String>,
    /// Pinned `"workspaceId/programId"` — when set the server always
    /// bootstraps this single program and the switcher is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub watch: bool,
    pub port: u16,
    pub open: bool,
}

impl Config {
    /// Build a config rooted at `root` with the stock workspace and watcher
    /// roots: bundled programs under `build/programs`, bundled watchers
    /// under `build/watchers` plus the runtime package's own watchers.
    pub fn new(root: impl Into<String>) -> Self {
        let root = posixify(&root.into());
        let src = format!("{root}/build/src");

        let mut config = Self {
            root: root.clone(),
            src,
            workspace_paths: BTreeMap::new(),
            watcher_paths: Vec::new(),
            file: None,
            watch: false,
            port: DEFAULT_PORT,
            open: true,
        };
        config.set_workspace("root", format!("{root}/build/programs"));
        config.add_watcher_path(format!("{root}/build/watchers"));
        config.add_watcher_path(format!(
            "{root}/node_modules/strand-runtime/build/watchers"
        ));
        config
    }

    /// Register (or replace) a workspace root. The path is normalized but
    /// not checked for existence — that is deferred to resolution time.
    pub fn set_workspace(&mut self, id: impl Into<String>, path: impl AsRef<str>) {
        self.workspace_paths
            .insert(id.into(), posixify(path.as_ref()));
    }

    /// Replace the whole workspace mapping, normalizing every entry.
    pub fn set_workspaces<I, K, V>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        self.workspace_paths.clear();
        for (id, path) in entries {
            self.set_workspace(id, path);
        }
    }

    /// Append a watcher search root. A no-op when the normalized path is
    /// already registered, so repeated registration is idempotent.
    pub fn add_watcher_path(&mut self, path: impl AsRef<str>) {
        let normalized = posixify(path.as_ref());
        if !self.watcher_paths.contains(&normalized) {
            self.watcher_paths.push(normalized);
        }
    }

    /// Replace the watcher root list, preserving the given order.
    pub fn set_watcher_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        self.watcher_paths.clear();
        for path in paths {
            self.add_watcher_path(path);
        }
    }

    /// Look up a workspace root by id.
    pub fn resolve_workspace(&self, id: &str) -> Option<&str> {
        self.workspace_paths.get(id).map(String::as_str)
    }

    pub fn workspace_paths(&self) -> &BTreeMap<String, String> {
        &self.workspace_paths
    }

    pub fn watcher_paths(&self) -> &[String] {
        &self.watcher_paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posixify_normalizes_backslashes() {
        assert_eq!(posixify(r"ws\programs\demo"), "ws/programs/demo");
        assert_eq!(posixify("/already/posix"), "/already/posix");
    }

    #[test]
    fn posixify_is_idempotent() {
        let once = posixify(r"a\b/c");
        assert_eq!(posixify(&once), once);
    }

    #[test]
    fn set_workspace_normalizes_and_overwrites() {
        let mut config = Config::new("/install");
        config.set_workspace("demo", r"C:\ws\demo");
        assert_eq!(config.resolve_workspace("demo"), Some("C:/ws/demo"));

        config.set_workspace("demo", "/ws/demo2");
        assert_eq!(config.resolve_workspace("demo"), Some("/ws/demo2"));
    }

    #[test]
    fn set_workspaces_replaces_the_whole_mapping() {
        let mut config = Config::new("/install");
        config.set_workspaces([("demo", r"ws\demo"), ("play", "/ws/play")]);
        assert_eq!(config.resolve_workspace("root"), None);
        assert_eq!(config.resolve_workspace("demo"), Some("ws/demo"));
        assert_eq!(config.resolve_workspace("play"), Some("/ws/play"));
    }

    #[test]
    fn resolve_workspace_misses_unknown_ids() {
        let config = Config::new("/install");
        assert_eq!(config.resolve_workspace("nope"), None);
    }

    #[test]
    fn add_watcher_path_is_idempotent() {
        let mut config = Config::new("/install");
        config.set_watcher_paths(Vec::<String>::new());
        config.add_watcher_path("/ws/watchers");
        config.add_watcher_path(r"\ws\watchers");
        assert_eq!(config.watcher_paths(), ["/ws/watchers"]);
    }

    #[test]
    fn watcher_order_is_preserved() {
        let mut config = Config::new("/install");
        config.set_watcher_paths(["/b", "/a", "/c"]);
        assert_eq!(config.watcher_paths(), ["/b", "/a", "/c"]);
    }

    #[test]
    fn stock_roots_are_registered() {
        let config = Config::new("/install");
        assert_eq!(
            config.resolve_workspace("root"),
            Some("/install/build/programs")
        );
        assert!(config
            .watcher_paths()
            .contains(&"/install/build/watchers".to_string()));
    }

    #[test]
    fn serializes_camel_case_for_the_client() {
        let mut config = Config::new("/install");
        config.file = Some("root/hello.js".into());
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("workspacePaths").is_some());
        assert!(value.get("watcherPaths").is_some());
        assert_eq!(value["file"], "root/hello.js");
        assert_eq!(value["port"], 8000);
    }

    #[test]
    fn pinned_file_is_omitted_when_unset() {
        let config = Config::new("/install");
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("file").is_none());
    }
}
