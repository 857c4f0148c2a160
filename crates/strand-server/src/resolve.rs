//! Ordered-fallback static file resolution.
//!
//! A requested relative path is probed against an ordered list of candidate
//! roots; the first root containing the file wins. Earlier roots override
//! later ones (a local assets directory shadowing the one bundled with the
//! runtime package). Content is never merged across roots.

use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::error::ServeError;

/// Screen a client-supplied relative path before it touches the filesystem.
///
/// Rejects absolute paths, drive prefixes, and any `..` segment — the
/// resolver must never hand out a file outside its candidate roots. `.`
/// segments are dropped.
pub fn sanitize(relative: &str) -> Result<PathBuf, ServeError> {
    let mut clean = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(segment) => clean.push(segment),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ServeError::Forbidden(relative.to_string()));
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(ServeError::Forbidden(relative.to_string()));
    }
    Ok(clean)
}

/// Resolve `relative` against `roots` in order, returning the first
/// existing file. Exhausting the list is `NotFound`.
pub async fn resolve(relative: &str, roots: &[String]) -> Result<PathBuf, ServeError> {
    let clean = sanitize(relative)?;
    for root in roots {
        let candidate = Path::new(root).join(&clean);
        match tokio::fs::metadata(&candidate).await {
            Ok(meta) if meta.is_file() => return Ok(candidate),
            _ => continue,
        }
    }
    Err(ServeError::NotFound(relative.to_string()))
}

/// Resolve and read a file, returning its bytes and a content type derived
/// from the extension.
pub async fn read_resolved(
    relative: &str,
    roots: &[String],
) -> Result<(Vec<u8>, &'static str), ServeError> {
    let path = resolve(relative, roots).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ServeError::NotFound(relative.to_string()))?;
    info!("Served: '{}' from '{}'", relative, path.display());
    Ok((bytes, content_type(relative)))
}

/// Content type by file extension, octet-stream fallback.
pub fn content_type(path: &str) -> &'static str {
    if path.ends_with(".html") {
        "text/html; charset=utf-8"
    } else if path.ends_with(".js") || path.ends_with(".mjs") {
        "text/javascript; charset=utf-8"
    } else if path.ends_with(".css") {
        "text/css; charset=utf-8"
    } else if path.ends_with(".json") || path.ends_with(".map") {
        "application/json; charset=utf-8"
    } else if path.ends_with(".svg") {
        "image/svg+xml"
    } else if path.ends_with(".png") {
        "image/png"
    } else if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg"
    } else if path.ends_with(".ico") {
        "image/x-icon"
    } else if path.ends_with(".woff2") {
        "font/woff2"
    } else if path.ends_with(".woff") {
        "font/woff"
    } else if path.ends_with(".ttf") {
        "font/ttf"
    } else if path.ends_with(".wasm") {
        "application/wasm"
    } else {
        "application/octet-stream"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn root(dir: &TempDir) -> String {
        dir.path().to_string_lossy().to_string()
    }

    #[test]
    fn sanitize_rejects_traversal_and_absolute_paths() {
        assert!(sanitize("../escape.js").is_err());
        assert!(sanitize("a/../../escape.js").is_err());
        assert!(sanitize("nested/../up.js").is_err());
        assert!(sanitize("/etc/passwd").is_err());
        assert!(sanitize("").is_err());
        assert!(sanitize(".").is_err());
    }

    #[test]
    fn sanitize_passes_plain_relative_paths() {
        assert_eq!(sanitize("a/b/c.js").unwrap(), PathBuf::from("a/b/c.js"));
        assert_eq!(sanitize("./a/b.js").unwrap(), PathBuf::from("a/b.js"));
    }

    #[tokio::test]
    async fn earlier_roots_take_precedence() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        std::fs::write(a.path().join("app.js"), "from a").unwrap();
        std::fs::write(b.path().join("app.js"), "from b").unwrap();

        let roots = [root(&a), root(&b)];
        let (bytes, _) = read_resolved("app.js", &roots).await.unwrap();
        assert_eq!(bytes, b"from a");
    }

    #[tokio::test]
    async fn falls_through_to_later_roots() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        std::fs::write(b.path().join("only.js"), "from b").unwrap();

        let roots = [root(&a), root(&b)];
        let (bytes, _) = read_resolved("only.js", &roots).await.unwrap();
        assert_eq!(bytes, b"from b");
    }

    #[tokio::test]
    async fn exhausted_roots_are_not_found() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        let roots = [root(&a), root(&b)];
        let err = resolve("missing.js", &roots).await.unwrap_err();
        assert!(matches!(err, ServeError::NotFound(_)));
    }

    #[tokio::test]
    async fn directories_do_not_satisfy_resolution() {
        let a = TempDir::new().unwrap();
        std::fs::create_dir(a.path().join("sub")).unwrap();

        let roots = [root(&a)];
        let err = resolve("sub", &roots).await.unwrap_err();
        assert!(matches!(err, ServeError::NotFound(_)));
    }

    #[tokio::test]
    async fn traversal_is_forbidden_even_when_target_exists() {
        let outer = TempDir::new().unwrap();
        let inner = outer.path().join("inner");
        std::fs::create_dir(&inner).unwrap();
        std::fs::write(outer.path().join("secret.txt"), "secret").unwrap();

        let roots = [inner.to_string_lossy().to_string()];
        let err = resolve("../secret.txt", &roots).await.unwrap_err();
        assert!(matches!(err, ServeError::Forbidden(_)));
    }

    #[test]
    fn content_types_cover_the_loader_formats() {
        assert_eq!(content_type("index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("app.js"), "text/javascript; charset=utf-8");
        assert_eq!(content_type("style.css"), "text/css; charset=utf-8");
        assert_eq!(content_type("blob.bin"), "application/octet-stream");
    }
}
