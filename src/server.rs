use crate::config::ServerConfig;
use crate::error::{ErrorKind, RegistryError};
use crate::error_response::ErrorResponse;
use crate::metrics;
use crate::registry::Registry;
use crate::types::{FetchQuery, UploadedFile};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, Query, State,
    },
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hyper::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

const FILE_FIELD: &str = "file";

#[derive(Clone)]
struct AppState {
    registry: Arc<Registry>,
    max_upload_bytes: usize,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

async fn metrics_text() -> impl IntoResponse {
    metrics::render()
}

/// Run a facade call on the blocking pool. A panic inside it is reported as
/// `UnknownError` rather than tearing down the connection.
async fn run_blocking<T, F>(f: F) -> Result<T, ErrorResponse>
where
    F: FnOnce() -> Result<T, ErrorResponse> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => {
            Err(ErrorResponse::from_panic(join_err.into_panic()))
        }
        Err(join_err) => Err(ErrorResponse::from_error(&RegistryError::Internal(
            join_err.to_string(),
        ))),
    }
}

/// Reject a body whose declared length is already over the limit.
fn check_declared_length(headers: &HeaderMap, limit: usize) -> Result<(), ErrorResponse> {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    match declared {
        Some(len) if len > limit as u64 => Err(ErrorResponse::payload_too_large(format!(
            "Upload of {len} bytes exceeds the {limit} byte limit"
        ))),
        _ => Ok(()),
    }
}

/// Display text of an error followed by its sources.
fn describe(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

/// Pull the `file` field out of a multipart body. A request that is not
/// multipart at all, or has no `file` field, simply carries no file. A body
/// over `limit` is a 413; any other read failure is `InvalidSpec`.
async fn read_file(
    headers: &HeaderMap,
    limit: usize,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Option<UploadedFile>, ErrorResponse> {
    check_declared_length(headers, limit)?;
    let Ok(mut multipart) = multipart else {
        return Ok(None);
    };
    let unreadable = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ErrorResponse::payload_too_large(format!(
                "Upload exceeds the {limit} byte limit"
            ));
        }
        ErrorResponse::from_error(&RegistryError::step(
            ErrorKind::InvalidSpec,
            format!("Could not read uploaded file: {}", describe(&e)),
        ))
    };
    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(unreadable)?;
        return Ok(Some(UploadedFile::new(original_name, bytes.to_vec())));
    }
    Ok(None)
}

async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let file = match read_file(&headers, state.max_upload_bytes, multipart).await {
        Ok(file) => file,
        Err(e) => return e.into_response(),
    };
    match run_blocking(move || state.registry.upload(file)).await {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn edit(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let file = match read_file(&headers, state.max_upload_bytes, multipart).await {
        Ok(file) => file,
        Err(e) => return e.into_response(),
    };
    match run_blocking(move || state.registry.edit(file)).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn fetch(State(state): State<AppState>, Query(query): Query<FetchQuery>) -> Response {
    match run_blocking(move || state.registry.get(query)).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Create the HTTP router for the registry endpoints
pub fn create_server(registry: Arc<Registry>, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);
    let limit = config.max_upload_bytes;

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .route(
            "/api/schemas/upload",
            post(upload).layer(DefaultBodyLimit::max(limit)),
        )
        .route(
            "/api/schemas/edit",
            post(edit).layer(DefaultBodyLimit::max(limit)),
        )
        .route("/api/schemas", get(fetch))
        .layer(ServiceBuilder::new().layer(cors))
        .with_state(AppState {
            registry,
            max_upload_bytes: limit,
        })
}

/// Start the HTTP server on the configured address
pub async fn start_server(registry: Arc<Registry>, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_server(registry, config);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("HTTP server running on http://{}", addr);
    info!("Upload limit: {} bytes", config.max_upload_bytes);
    info!("Health check: http://{}/health", addr);

    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
