//! Development server: serves the build directory from disk and pushes
//! step events to browsers over Server-Sent Events.

use std::convert::Infallible;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri, header},
    response::{
        IntoResponse, Response, Sse,
        sse::{Event, KeepAlive},
    },
    routing::get,
};
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use tower_http::cors::{Any, CorsLayer};

use crate::dev::{DevConfig, DevEvent, DevServerState, SharedState};
use crate::error::{CliError, Result};

pub const SSE_PATH: &str = "/__sd_sse__";
pub const RELOAD_SCRIPT_PATH: &str = "/__sd_reload__.js";

/// Files served from the build root whatever directory they are requested from.
const ROOT_FILES: [&str; 2] = ["VERSION.txt", "CHANGELOG.md"];

const RELOAD_SCRIPT: &str = include_str!("../../assets/dev/reload-client.js");

pub struct DevServer {
    config: DevConfig,
    state: SharedState,
}

impl DevServer {
    pub fn new(config: DevConfig, state: SharedState) -> Self {
        Self { config, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.config.addr)
    }

    /// Bind and serve until the task is dropped or the listener fails.
    pub async fn start(self) -> Result<()> {
        let addr = self.config.addr;
        let url = self.url();
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {}: {}", addr, e)))?;

        crate::ui::success(&format!("Development server running at {}", url));

        axum::serve(listener, app)
            .await
            .map_err(|e| CliError::Server(e.to_string()))
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route(SSE_PATH, get(handle_sse))
        .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
        .fallback(handle_request)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn handle_sse(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (id, rx) = state.register_client();
    tracing::debug!(client = id, clients = state.client_count(), "SSE client connected");

    state.broadcast(&DevEvent::ClientConnected { id }).await;

    // Steps that are still failing are replayed to the new client first.
    let stream = tokio_stream::iter(replay_failures(&state))
        .chain(ReceiverStream::new(rx))
        .map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// `StepFailed` payloads for every step whose last run failed.
fn replay_failures(state: &DevServerState) -> Vec<String> {
    state
        .failed_steps()
        .into_iter()
        .filter_map(|(step, error)| {
            serde_json::to_string(&DevEvent::StepFailed { step, error }).ok()
        })
        .collect()
}

async fn handle_reload_script() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        RELOAD_SCRIPT,
    )
        .into_response()
}

async fn handle_request(State(state): State<SharedState>, uri: Uri) -> Response {
    let path = uri.path();

    let Some(file_path) = resolve_request_path(state.build_dir(), path) else {
        return (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response();
    };

    let content = match tokio::fs::read(&file_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {}", file_path.display(), err);
            return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
        }
    };

    let content_type = content_type_for(&file_path);
    let body = if content_type.starts_with("text/html") {
        inject_reload_script(&content)
    } else {
        content
    };

    (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

/// Map a request path to a file in the build directory.
///
/// Version and changelog files resolve to the build root from any directory.
/// Extension-less paths that are not files fall back to `index.html` so the
/// app's client-side routes load. Paths escaping the build directory resolve
/// to nothing.
pub fn resolve_request_path(build_dir: &Path, request_path: &str) -> Option<PathBuf> {
    let rel = Path::new(request_path.trim_start_matches('/'));
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    if let Some(name) = rel.file_name().and_then(|n| n.to_str()) {
        if ROOT_FILES.contains(&name) {
            return Some(build_dir.join(name));
        }
    }

    let index = build_dir.join("index.html");
    if rel.as_os_str().is_empty() {
        return Some(index);
    }

    let candidate = build_dir.join(rel);
    if candidate.is_file() {
        return Some(candidate);
    }

    if rel.extension().is_none() {
        return Some(index);
    }

    None
}

/// Add the reload client before the closing `</body>`, or at the end.
fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    let html = String::from_utf8_lossy(content);
    let script_tag = format!(r#"<script src="{}"></script>"#, RELOAD_SCRIPT_PATH);

    match html.rfind("</body>") {
        Some(pos) => {
            let mut result = String::with_capacity(html.len() + script_tag.len() + 4);
            result.push_str(&html[..pos]);
            result.push_str(&script_tag);
            result.push('\n');
            result.push_str(&html[pos..]);
            result.into_bytes()
        }
        None => format!("{}\n{}", html, script_tag).into_bytes(),
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    match extension {
        "html" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "css" => "text/css",
        "md" => "text/markdown; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "wasm" => "application/wasm",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn build_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("_assets/js")).unwrap();
        std::fs::write(temp.path().join("index.html"), "<html><body></body></html>").unwrap();
        std::fs::write(temp.path().join("_assets/js/app.js"), "export {}").unwrap();
        temp
    }

    #[test]
    fn test_existing_file() {
        let dir = build_dir();
        assert_eq!(
            resolve_request_path(dir.path(), "/_assets/js/app.js"),
            Some(dir.path().join("_assets/js/app.js"))
        );
    }

    #[test]
    fn test_client_routes_fall_back_to_index() {
        let dir = build_dir();
        let index = Some(dir.path().join("index.html"));
        assert_eq!(resolve_request_path(dir.path(), "/"), index);
        assert_eq!(resolve_request_path(dir.path(), "/users/42"), index);
    }

    #[test]
    fn test_missing_asset_is_not_found() {
        let dir = build_dir();
        assert_eq!(resolve_request_path(dir.path(), "/_assets/js/missing.js"), None);
    }

    #[test]
    fn test_version_and_changelog_resolve_to_root() {
        let dir = build_dir();
        assert_eq!(
            resolve_request_path(dir.path(), "/users/42/VERSION.txt"),
            Some(dir.path().join("VERSION.txt"))
        );
        assert_eq!(
            resolve_request_path(dir.path(), "/deep/nested/CHANGELOG.md"),
            Some(dir.path().join("CHANGELOG.md"))
        );
    }

    #[test]
    fn test_parent_traversal_rejected() {
        let dir = build_dir();
        assert_eq!(resolve_request_path(dir.path(), "/../secret"), None);
        assert_eq!(resolve_request_path(dir.path(), "/_assets/../../x"), None);
    }

    #[tokio::test]
    async fn test_failed_steps_are_replayed() {
        let state = DevServerState::new(PathBuf::from("build"));
        assert!(replay_failures(&state).is_empty());

        state
            .broadcast(&DevEvent::StepFailed {
                step: "main-html".to_string(),
                error: "template missing".to_string(),
            })
            .await;
        state
            .broadcast(&DevEvent::StepCompleted {
                step: "vendor-styles".to_string(),
                duration_ms: 4,
            })
            .await;

        assert_eq!(
            replay_failures(&state),
            vec![r#"{"type":"StepFailed","step":"main-html","error":"template missing"}"#]
        );
    }

    #[test]
    fn test_inject_reload_script_before_body_end() {
        let html = String::from_utf8(inject_reload_script(b"<html><body><h1>x</h1></body></html>"))
            .unwrap();
        let script = html.find(RELOAD_SCRIPT_PATH).unwrap();
        assert!(script < html.find("</body>").unwrap());
    }

    #[test]
    fn test_inject_reload_script_without_body() {
        let html = String::from_utf8(inject_reload_script(b"<h1>x</h1>")).unwrap();
        assert!(html.ends_with(r#"<script src="/__sd_reload__.js"></script>"#));
    }
}
