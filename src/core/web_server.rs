//! Public-facing web server.
//!
//! Receives Telegram webhook calls at /webhook/{token}, renders the upload
//! index at /, and serves uploaded files at /files/{name} with a fallback
//! to the URL recorded in the metadata store.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{Me, Update};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::core::config::Config;
use crate::core::error::{AppError, AppResult};
use crate::storage::meta::{MetaStore, UploadRecord};
use crate::telegram::{Bot, HandlerError};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Invalid token".to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found".to_string()),
            AppError::Json(ref e) => {
                log::warn!("Failed to decode webhook update: {}", e);
                (StatusCode::BAD_REQUEST, "Malformed update".to_string())
            }
            ref other => {
                log::error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        (status, Json(json!({"detail": detail}))).into_response()
    }
}

/// Shared state for the web server.
#[derive(Clone)]
pub struct WebState {
    pub config: Arc<Config>,
    pub meta: Arc<MetaStore>,
    pub bot: Bot,
    /// Bot identity fetched once at startup; command parsing needs the username.
    pub me: Me,
    pub handler: UpdateHandler<HandlerError>,
}

/// Builds the application router. Exposed so integration tests can drive
/// the exact production routes without binding a socket.
pub fn router(state: WebState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/webhook/{token}", post(webhook_handler))
        .route("/", get(index_handler))
        .route("/files/{filename}", get(serve_file_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Start the public web server.
pub async fn start_web_server(state: WebState) -> AppResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let app = router(state);

    log::info!("Starting web server on http://{}", addr);
    log::info!("  POST /webhook/{{token}}  - Telegram webhook");
    log::info!("  GET  /                  - Upload index");
    log::info!("  GET  /files/{{filename}} - File serving");
    log::info!("  GET  /health            - Health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    log::info!("Shutdown signal received");
}

/// POST /webhook/{token} — receives one Telegram update.
///
/// The path token must equal the configured bot token. Once dispatch has
/// been invoked the response is always the success acknowledgment; handler
/// failures are visible only in the logs so Telegram never re-delivers.
async fn webhook_handler(
    Path(token): Path<String>,
    State(state): State<WebState>,
    body: String,
) -> Result<Json<serde_json::Value>, AppError> {
    if token != state.config.bot_token {
        return Err(AppError::Forbidden);
    }

    let update: Update = serde_json::from_str(&body)?;

    dispatch_update(&state, update).await;
    Ok(Json(json!({"ok": true})))
}

/// Runs one update through the handler tree, swallowing handler errors.
async fn dispatch_update(state: &WebState, update: Update) {
    let deps = dptree::deps![state.bot.clone(), state.me.clone(), update];
    match state.handler.dispatch(deps).await {
        ControlFlow::Break(Ok(())) => {}
        ControlFlow::Break(Err(err)) => log::error!("Update handler failed: {}", err),
        ControlFlow::Continue(_) => log::debug!("Update matched no handler branch"),
    }
}

/// GET / — HTML index of all uploads, most recent last.
async fn index_handler(State(state): State<WebState>) -> Result<Html<String>, AppError> {
    let records = state.meta.list_all().await?;
    Ok(Html(render_index(&records)))
}

/// GET /files/{filename} — staged bytes, recorded-URL redirect, or 404.
async fn serve_file_handler(
    Path(filename): Path<String>,
    State(state): State<WebState>,
) -> Result<Response, AppError> {
    let local = state.config.uploads_dir.join(&filename);
    if let Ok(bytes) = tokio::fs::read(&local).await {
        return Ok(file_response(&filename, bytes));
    }

    let records = state.meta.list_all().await?;
    if let Some(record) = records.iter().find(|r| r.file_name == filename) {
        return Ok(Redirect::temporary(&record.url).into_response());
    }

    Err(AppError::NotFound(filename))
}

/// GET /health — simple health check.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn file_response(filename: &str, bytes: Vec<u8>) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));

    match Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, disposition)
        .body(Body::from(bytes))
    {
        Ok(resp) => resp,
        Err(e) => {
            log::error!("Failed to build file response for '{}': {}", filename, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Render the upload index page.
fn render_index(records: &[UploadRecord]) -> String {
    let rows = if records.is_empty() {
        r#"<p class="empty">Nothing has been uploaded yet.</p>"#.to_string()
    } else {
        let items = records
            .iter()
            .map(|record| {
                format!(
                    r#"<li><a href="{url}">{name}</a> <span class="mode">{mode}</span></li>"#,
                    url = html_escape(&record.url),
                    name = html_escape(&record.file_name),
                    mode = record.storage,
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("<ol>\n{items}\n</ol>")
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Uploaded files</title>
<style>
*{{box-sizing:border-box;margin:0;padding:0}}
body{{background:#0d0d0d;color:#fff;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;padding:40px;max-width:720px;margin:0 auto}}
h1{{font-size:1.4rem;font-weight:700;margin-bottom:20px}}
ol{{list-style-position:inside;display:flex;flex-direction:column;gap:8px}}
a{{color:#7cb8ff;text-decoration:none}}
a:hover{{text-decoration:underline}}
.mode{{color:rgba(255,255,255,.4);font-size:.8rem;margin-left:8px}}
.empty{{color:rgba(255,255,255,.5)}}
</style>
</head>
<body>
<h1>Uploaded files</h1>
{rows}
</body>
</html>"#,
        rows = rows,
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::StorageMode;

    fn record(name: &str, url: &str) -> UploadRecord {
        UploadRecord {
            file_name: name.to_string(),
            uploader_id: 1,
            storage: StorageMode::Local,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    }

    #[test]
    fn test_render_index_empty() {
        let html = render_index(&[]);
        assert!(html.contains("Nothing has been uploaded yet."));
    }

    #[test]
    fn test_render_index_lists_records_in_order() {
        let html = render_index(&[
            record("a.pdf", "/files/a.pdf"),
            record("b.pdf", "/files/b.pdf"),
        ]);

        let a = html.find("a.pdf").unwrap();
        let b = html.find("b.pdf").unwrap();
        assert!(a < b);
        assert!(html.contains(r#"href="/files/a.pdf""#));
    }

    #[test]
    fn test_render_index_escapes_file_names() {
        let html = render_index(&[record("<script>.pdf", "/files/x")]);
        assert!(!html.contains("<script>.pdf"));
        assert!(html.contains("&lt;script&gt;.pdf"));
    }
}
