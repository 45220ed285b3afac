use anyhow::Result;

use tracing::{info, warn};

use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};
use crate::ingestion::{ingest_value, IngestError};
use crate::song_store::{ListQuery, SortOrder};

const RATING_MIN: i64 = 0;
const RATING_MAX: i64 = 5;

#[derive(Serialize)]
struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
struct HealthResponse {
    pub status: &'static str,
}

#[derive(Deserialize, Debug)]
struct ListParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SearchParams {
    pub title: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Deserialize, Debug)]
struct RateBody {
    pub rating: i64,
}

#[derive(Serialize)]
struct RatingResponse {
    pub rating: i64,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    10
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

fn internal_error(err: impl std::fmt::Display) -> Response {
    warn!("Request failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
        .into_response()
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn list_songs(
    State(store): State<GuardedSongStore>,
    Query(params): Query<ListParams>,
) -> Response {
    if params.page < 1 {
        return bad_request("page must be >= 1");
    }
    if params.limit < 1 {
        return bad_request("limit must be >= 1");
    }
    let order = match params.order.as_deref() {
        None => SortOrder::Asc,
        Some(raw) => match SortOrder::from_param(raw) {
            Some(order) => order,
            None => return bad_request("order must be 'asc' or 'desc'"),
        },
    };

    let query = ListQuery {
        page: params.page,
        limit: params.limit,
        sort_by: params.sort_by,
        order,
    };

    match store.list_songs(&query) {
        Ok(page) => Json(page).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn search_songs(
    State(store): State<GuardedSongStore>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(title) = params.title else {
        return bad_request("title query parameter is required");
    };
    if params.page < 1 {
        return bad_request("page must be >= 1");
    }
    if params.limit < 1 {
        return bad_request("limit must be >= 1");
    }

    match store.search_songs(&title, params.page, params.limit) {
        Ok(page) => Json(page).into_response(),
        Err(err) => internal_error(err),
    }
}

/// POST /upload - Upload a JSON catalog file (multipart/form-data)
async fn upload_songs(
    State(store): State<GuardedSongStore>,
    mut multipart: Multipart,
) -> Response {
    let mut filename: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            match field.bytes().await {
                Ok(bytes) => data = Some(bytes.to_vec()),
                Err(e) => {
                    warn!("Failed to read file data: {}", e);
                    return bad_request("Failed to read file");
                }
            }
        }
    }

    let filename = match filename {
        Some(f) if !f.is_empty() => f,
        _ => return bad_request("No file provided"),
    };

    if !filename.to_ascii_lowercase().ends_with(".json") {
        return bad_request("Only .json files are supported");
    }

    let data = match data {
        Some(d) if !d.is_empty() => d,
        _ => return bad_request("No file data provided"),
    };

    let parsed: serde_json::Value = match serde_json::from_slice(&data) {
        Ok(value) => value,
        Err(e) => {
            warn!("Unparseable upload {}: {}", filename, e);
            return bad_request("Invalid JSON file");
        }
    };

    match ingest_value(store.as_ref(), &parsed) {
        Ok(report) => {
            info!("Upload {}: {}", filename, report.summary());
            Json(MessageResponse {
                message: report.summary(),
            })
            .into_response()
        }
        Err(IngestError::MalformedInput(reason)) => bad_request(reason),
        Err(IngestError::Storage(err)) => internal_error(err),
    }
}

async fn rate_song(
    State(store): State<GuardedSongStore>,
    Path(id): Path<String>,
    Json(body): Json<RateBody>,
) -> Response {
    if !(RATING_MIN..=RATING_MAX).contains(&body.rating) {
        return bad_request(format!(
            "rating must be between {} and {}",
            RATING_MIN, RATING_MAX
        ));
    }

    match store.set_rating(&id, body.rating) {
        Ok(Some(rating)) => Json(RatingResponse { rating }).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No song with id {:?}", id),
            }),
        )
            .into_response(),
        Err(err) => internal_error(err),
    }
}

async fn get_all_songs(State(store): State<GuardedSongStore>) -> Response {
    match store.get_all_songs() {
        Ok(songs) => Json(songs).into_response(),
        Err(err) => internal_error(err),
    }
}

async fn delete_all_songs(State(store): State<GuardedSongStore>) -> Response {
    match store.delete_all_songs() {
        Ok(deleted) => {
            info!("Cleared song catalog ({} records)", deleted);
            Json(MessageResponse {
                message: format!("Deleted {} songs.", deleted),
            })
            .into_response()
        }
        Err(err) => internal_error(err),
    }
}

pub fn make_app(song_store: GuardedSongStore, config: ServerConfig) -> Router {
    let state = ServerState {
        config: config.clone(),
        song_store,
    };

    let upload_route: Router<ServerState> = Router::new()
        .route("/api/songs/upload", post(upload_songs))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    let api_routes: Router = Router::new()
        .route("/health", get(health))
        .route("/api/songs", get(list_songs))
        .route("/api/songs/search", get(search_songs))
        .route("/api/songs/all", get(get_all_songs).delete(delete_all_songs))
        .route("/api/songs/{id}/rate", post(rate_song))
        .merge(upload_route)
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new(),
    };

    let mut app: Router = home_router.merge(api_routes);

    app = app.layer(CorsLayer::permissive());
    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    app
}

pub async fn run_server(song_store: GuardedSongStore, config: ServerConfig) -> Result<()> {
    let port = config.port;
    let app = make_app(song_store, config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Listening on port {}", port);

    Ok(axum::serve(listener, app).await?)
}
