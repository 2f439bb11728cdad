use std::path::{Component, Path, PathBuf};

use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use super::AppState;

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

/// Join a request path under `root`, refusing anything that could escape it.
pub fn resolve_under(root: &Path, rel: &str) -> Option<PathBuf> {
    let rel = Path::new(rel);
    let mut out = root.to_path_buf();
    for comp in rel.components() {
        match comp {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if out == root { None } else { Some(out) }
}

async fn send_file(path: Option<PathBuf>) -> Response {
    let Some(path) = path else { return StatusCode::NOT_FOUND.into_response(); };
    match tokio::fs::read(&path).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type_for(&path))], bytes).into_response(),
        Err(e) => {
            debug!(target: "assets", path = ?path, "not served: {}", e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

pub async fn static_file(State(state): State<AppState>, UrlPath(path): UrlPath<String>) -> Response {
    send_file(resolve_under(&state.static_dir, &path)).await
}

pub async fn image_file(State(state): State<AppState>, UrlPath(path): UrlPath<String>) -> Response {
    send_file(resolve_under(&state.static_dir.join("images"), &path)).await
}

pub async fn favicon(State(state): State<AppState>) -> Response {
    send_file(resolve_under(&state.static_dir, "favicon.ico")).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_is_rejected() {
        let root = Path::new("/srv/public");
        assert_eq!(resolve_under(root, "css/app.css"), Some(PathBuf::from("/srv/public/css/app.css")));
        assert_eq!(resolve_under(root, "./a.js"), Some(PathBuf::from("/srv/public/a.js")));
        assert!(resolve_under(root, "../etc/passwd").is_none());
        assert!(resolve_under(root, "a/../../b").is_none());
        assert!(resolve_under(root, "/etc/passwd").is_none());
        assert!(resolve_under(root, "").is_none());
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type_for(Path::new("logo.png")), "image/png");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }
}
