//! HTTP routing — binds the resolver, discovery, and bootstrap generator
//! to the server's routes.
//!
//! The shared `Config` sits behind a `parking_lot::RwLock`; handlers clone
//! a snapshot under a read lock and never hold the lock across an await.
//! The only write path is `/select-program`, so cross-request interleaving
//! is bounded to the pinned-file field (last write wins).

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use parking_lot::RwLock;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use strand_config::Config;

use crate::{bootstrap, discover, error::ServeError, resolve};

pub type SharedConfig = Arc<RwLock<Config>>;

/// Placeholder token in the HTML shell replaced by the bootstrap script.
pub const BOOTSTRAP_PLACEHOLDER: &str = "<!-- BOOTSTRAP -->";

const SCRIPT_CONTENT_TYPE: &str = "text/javascript; charset=utf-8";

/// Build the application router.
pub fn router(config: SharedConfig) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/bootstrap.js", get(serve_bootstrap))
        .route("/app/{workspace_id}/{program_id}", get(serve_app))
        .route("/programs/{workspace_id}/{program_id}", get(serve_program))
        .route("/select-program/{workspace_id}/{program_id}", get(select_program))
        .route("/watchers.js", get(serve_watchers))
        .route("/assets/{*path}", get(serve_assets))
        .route("/build/{*path}", get(serve_source))
        .route("/src/{*path}", get(serve_source))
        .route("/node_modules/{*path}", get(serve_node_modules))
        .layer(CorsLayer::permissive())
        .with_state(config)
}

/// Serve requests on an already-bound listener until ctrl-c.
///
/// Binding is the caller's job — a port conflict is a fatal configuration
/// error that deserves a user-facing diagnostic, not a 500.
pub async fn serve(listener: TcpListener, config: SharedConfig) -> std::io::Result<()> {
    let open = config.read().open;
    let addr = listener.local_addr()?;
    info!("Server started on http://{addr}");

    if open {
        open_browser(&format!("http://localhost:{}", addr.port()));
    }

    axum::serve(listener, router(config))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start"]);
        c
    };
    #[cfg(all(unix, not(target_os = "macos")))]
    let mut command = std::process::Command::new("xdg-open");

    if let Err(e) = command.arg(url).spawn() {
        warn!("Failed to open browser: {e}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn serve_index(State(config): State<SharedConfig>) -> Result<Response, ServeError> {
    let snapshot = config.read().clone();
    let fragment = bootstrap_for(&snapshot, None);
    let page = inject_shell(&snapshot.root, &fragment).await?;
    info!("Served: index");
    Ok(Html(page).into_response())
}

async fn serve_bootstrap(State(config): State<SharedConfig>) -> Response {
    let snapshot = config.read().clone();
    let fragment = bootstrap_for(&snapshot, None);
    ([(CONTENT_TYPE, SCRIPT_CONTENT_TYPE)], fragment).into_response()
}

/// Browse a specific program directly. In pinned mode only the pinned
/// program itself is allowed through.
async fn serve_app(
    Path((workspace_id, program_id)): Path<(String, String)>,
    State(config): State<SharedConfig>,
) -> Result<Response, ServeError> {
    let snapshot = config.read().clone();
    let requested = format!("{workspace_id}/{program_id}");

    if let Some(pinned) = snapshot.file.as_deref() {
        if pinned != requested {
            return Err(ServeError::Pinned {
                pinned: pinned.to_string(),
                requested,
            });
        }
    }

    let fragment = bootstrap_for(&snapshot, Some(&requested));
    let page = inject_shell(&snapshot.root, &fragment).await?;
    info!("Served: app shell for '{requested}'");
    Ok(Html(page).into_response())
}

async fn serve_program(
    Path((workspace_id, program_id)): Path<(String, String)>,
    State(config): State<SharedConfig>,
) -> Result<Response, ServeError> {
    let workspace_path = {
        let config = config.read();
        config
            .resolve_workspace(&workspace_id)
            .map(str::to_string)
            .ok_or_else(|| ServeError::UnknownWorkspace(workspace_id.clone()))?
    };
    let (bytes, content_type) = resolve::read_resolved(&program_id, &[workspace_path]).await?;
    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}

/// The one mutation path: pin the server to the selected program.
async fn select_program(
    Path((workspace_id, program_id)): Path<(String, String)>,
    State(config): State<SharedConfig>,
) -> StatusCode {
    let selected = format!("{workspace_id}/{program_id}");
    info!("Selected program: {selected}");
    config.write().file = Some(selected);
    StatusCode::OK
}

/// Aggregate module that requires every discovered watcher, in search-root
/// order. Load order matters: watchers run side effects on load.
async fn serve_watchers(State(config): State<SharedConfig>) -> Response {
    let snapshot = config.read().clone();
    let root_prefix = format!("{}/", snapshot.root);

    let mut content = String::new();
    for watcher in discover::discover_watchers(snapshot.watcher_paths()) {
        let relative = watcher.strip_prefix(&root_prefix).unwrap_or(&watcher);
        let relative = relative.strip_prefix("node_modules/").unwrap_or(relative);
        content.push_str(&format!("require(\"{relative}\");\n"));
    }
    ([(CONTENT_TYPE, SCRIPT_CONTENT_TYPE)], content).into_response()
}

async fn serve_assets(
    Path(path): Path<String>,
    State(config): State<SharedConfig>,
) -> Result<Response, ServeError> {
    let roots = {
        let config = config.read();
        vec![format!("{}/assets", config.root)]
    };
    serve_static(&path, &roots).await
}

/// Build output shadows the raw source tree.
async fn serve_source(
    Path(path): Path<String>,
    State(config): State<SharedConfig>,
) -> Result<Response, ServeError> {
    let roots = {
        let config = config.read();
        vec![format!("{}/build", config.root), format!("{}/src", config.root)]
    };
    serve_static(&path, &roots).await
}

/// Vendored dependencies, with a nested fallback for the runtime package's
/// own node_modules.
async fn serve_node_modules(
    Path(path): Path<String>,
    State(config): State<SharedConfig>,
) -> Result<Response, ServeError> {
    let roots = {
        let config = config.read();
        vec![
            format!("{}/node_modules", config.root),
            format!("{}/node_modules/strand-runtime/node_modules", config.root),
        ]
    };
    serve_static(&path, &roots).await
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Bootstrap fragment for the current snapshot, discovering programs only
/// when the switcher will need the list.
fn bootstrap_for(snapshot: &Config, requested: Option<&str>) -> String {
    let programs = if snapshot.file.is_none() && requested.is_none() {
        discover::discover_programs(snapshot.workspace_paths())
    } else {
        Vec::new()
    };
    bootstrap::generate(snapshot, requested, &programs)
}

/// Read the HTML shell and splice the bootstrap fragment in at the
/// placeholder. A local assets directory may override the bundled shell.
async fn inject_shell(root: &str, fragment: &str) -> Result<String, ServeError> {
    let roots = [format!("{root}/assets"), root.to_string()];
    let path = resolve::resolve("index.html", &roots).await.map_err(|_| {
        ServeError::Template(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("index.html missing under '{root}'"),
        ))
    })?;
    let shell = tokio::fs::read_to_string(&path)
        .await
        .map_err(ServeError::Template)?;
    Ok(shell.replace(
        BOOTSTRAP_PLACEHOLDER,
        &format!("<script>\n{fragment}</script>"),
    ))
}

async fn serve_static(path: &str, roots: &[String]) -> Result<Response, ServeError> {
    let (bytes, content_type) = resolve::read_resolved(path, roots).await?;
    Ok(([(CONTENT_TYPE, content_type)], bytes).into_response())
}
