//! Static file routes and the live reload socket.

use super::livereload::{self, LiveReload, CLIENT_PATH, CLIENT_SCRIPT, SOCKET_PATH};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use mime_guess::mime;
use percent_encoding::percent_decode_str;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Shared state of the dev server.
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Output root being served
    pub root: PathBuf,
    pub live_reload: LiveReload,
    /// Inject the reload client into HTML responses
    pub inject_client: bool,
}

/// Create the router for an output root.
pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .route(SOCKET_PATH, get(websocket_handler))
        .route(CLIENT_PATH, get(client_script))
        .fallback(static_file)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn client_script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], CLIENT_SCRIPT)
}

async fn static_file(State(state): State<Arc<ServerState>>, uri: Uri) -> Response {
    let Some(rel) = request_path(uri.path()) else {
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    };

    let mut path = state.root.join(rel);
    if tokio::fs::metadata(&path).await.map(|m| m.is_dir()).unwrap_or(false) {
        path.push("index.html");
    }

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(_) => {
            debug!("not found: {}", path.display());
            return (StatusCode::NOT_FOUND, "Not Found").into_response();
        }
    };

    let content_type = content_type(&path);
    let body = if state.inject_client && content_type.starts_with("text/html") {
        livereload::inject_client(&String::from_utf8_lossy(&bytes)).into_bytes()
    } else {
        bytes
    };

    ([(header::CONTENT_TYPE, content_type), (header::CACHE_CONTROL, "no-cache".to_string())], body).into_response()
}

/// Map a request path to a path relative to the served root.
///
/// Percent escapes are decoded; paths that would leave the root are refused.
pub fn request_path(uri_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode_str(uri_path).decode_utf8().ok()?;
    let mut rel = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if decoded.contains('\\') || decoded.contains('\0') {
        return None;
    }
    Some(rel)
}

/// Content type by file extension. Text types are served as UTF-8.
pub fn content_type(path: &Path) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    if mime.type_() == mime::TEXT || mime.subtype() == mime::JAVASCRIPT {
        format!("{}; charset=utf-8", mime.essence_str())
    } else {
        mime.essence_str().to_string()
    }
}

async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<ServerState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = state.live_reload.subscribe();

    info!("live reload client connected");

    let send_task = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if sender.send(Message::Text(event.to_json())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            info!("live reload client disconnected");
            break;
        }
    }

    send_task.abort();
}
