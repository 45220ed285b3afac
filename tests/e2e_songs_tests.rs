use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use playlist_server::server::{make_app, ServerConfig};
use playlist_server::song_store::SqliteSongStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "e2e-test-boundary-7f3a";

fn make_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteSongStore::new(temp_dir.path().join("songs.db")).unwrap();
    let app = make_app(Arc::new(store), ServerConfig::default());
    (app, temp_dir)
}

fn upload_request(filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: application/json\r\n\
         \r\n\
         {content}\r\n\
         --{boundary}--\r\n",
        boundary = BOUNDARY,
        filename = filename,
        content = content,
    );
    Request::builder()
        .method("POST")
        .uri("/api/songs/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload(app: &Router, payload: &Value) -> (StatusCode, Value) {
    let request = upload_request("songs.json", &payload.to_string());
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

async fn rate(app: &Router, id: &str, rating: i64) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/songs/{}/rate", id))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "rating": rating }).to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn uploads_row_oriented_batch() {
    let (app, _temp_dir) = make_test_app();

    let payload = json!([
        {"id": "a", "title": "First", "tempo": 120.0},
        {"id": "b", "title": "Second", "class": "rock"},
    ]);
    let (status, body) = upload(&app, &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Processed 2 items: 2 created, 0 updated, 0 rejected."
    );

    let (status, body) = get_json(&app, "/api/songs/all").await;
    assert_eq!(status, StatusCode::OK);
    let songs = body.as_array().unwrap();
    assert_eq!(songs.len(), 2);
    assert_eq!(songs[0]["id"], "a");
    assert_eq!(songs[1]["song_class"], "rock");
}

#[tokio::test]
async fn uploads_column_oriented_batch() {
    let (app, _temp_dir) = make_test_app();

    let payload = json!({
        "id": {"0": "a", "1": "b"},
        "title": {"0": "First", "1": "Second"},
        "danceability": {"0": 0.4, "1": 0.8},
    });
    let (status, body) = upload(&app, &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Processed 2 items: 2 created, 0 updated, 0 rejected."
    );

    let (_, body) = get_json(&app, "/api/songs/all").await;
    let songs = body.as_array().unwrap();
    assert_eq!(songs[1]["title"], "Second");
    assert_eq!(songs[1]["danceability"], 0.8);
}

#[tokio::test]
async fn second_identical_upload_only_updates() {
    let (app, _temp_dir) = make_test_app();

    let payload = json!([{"id": "a", "title": "Same"}, {"id": "b", "title": "Same"}]);
    upload(&app, &payload).await;
    let (status, body) = upload(&app, &payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Processed 2 items: 0 created, 2 updated, 0 rejected."
    );

    let (_, body) = get_json(&app, "/api/songs?page=1&limit=50").await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn later_upload_overwrites_fields() {
    let (app, _temp_dir) = make_test_app();

    upload(
        &app,
        &json!([{"id": "a", "title": "X", "danceability": 0.5}]),
    )
    .await;
    upload(
        &app,
        &json!([{"id": "a", "title": "X", "danceability": 0.9, "rating": 3}]),
    )
    .await;

    let (_, body) = get_json(&app, "/api/songs/all").await;
    let songs = body.as_array().unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0]["title"], "X");
    assert_eq!(songs[0]["danceability"], 0.9);
    assert_eq!(songs[0]["rating"], 3);
}

#[tokio::test]
async fn records_without_id_are_rejected_not_fatal() {
    let (app, _temp_dir) = make_test_app();

    let payload = json!([
        {"id": "a", "title": "Kept"},
        {"title": "Dropped"},
    ]);
    let (status, body) = upload(&app, &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Processed 2 items: 1 created, 0 updated, 1 rejected."
    );
}

#[tokio::test]
async fn missing_fields_get_defaults() {
    let (app, _temp_dir) = make_test_app();

    upload(&app, &json!([{"id": "sparse"}])).await;

    let (_, body) = get_json(&app, "/api/songs/all").await;
    let song = &body.as_array().unwrap()[0];
    assert_eq!(song["title"], "Unknown Title");
    assert_eq!(song["song_class"], "");
    assert_eq!(song["rating"], 0);
    assert_eq!(song["tempo"], 0.0);
    assert_eq!(song["time_signature"], 4);
}

#[tokio::test]
async fn rejects_non_json_extension() {
    let (app, _temp_dir) = make_test_app();

    let request = upload_request("songs.csv", "id,title\na,First");
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_unparseable_json() {
    let (app, _temp_dir) = make_test_app();

    let request = upload_request("songs.json", "{not json at all");
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rejects_shapeless_payload() {
    let (app, _temp_dir) = make_test_app();

    let (status, body) = upload(&app, &json!([])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("payload"));
}

#[tokio::test]
async fn lists_with_pagination_envelope() {
    let (app, _temp_dir) = make_test_app();

    let records: Vec<Value> = (0..25)
        .map(|i| json!({"id": format!("id{:02}", i), "title": format!("Song {:02}", i)}))
        .collect();
    upload(&app, &Value::Array(records)).await;

    let (status, body) = get_json(&app, "/api/songs?page=2&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 25);
    assert_eq!(body["page"], 2);
    assert_eq!(body["size"], 10);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["id"], "id10");
    assert_eq!(items[9]["id"], "id19");
}

#[tokio::test]
async fn lists_sorted_by_requested_field() {
    let (app, _temp_dir) = make_test_app();

    upload(
        &app,
        &json!([
            {"id": "a", "title": "Slow", "tempo": 60.0},
            {"id": "b", "title": "Fast", "tempo": 180.0},
        ]),
    )
    .await;

    let (_, body) = get_json(&app, "/api/songs?sort_by=tempo&order=desc").await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items[0]["id"], "b");
    assert_eq!(items[1]["id"], "a");
}

#[tokio::test]
async fn searches_titles_case_insensitively() {
    let (app, _temp_dir) = make_test_app();

    upload(
        &app,
        &json!([
            {"id": "a", "title": "Love Song"},
            {"id": "b", "title": "Heartbreak"},
        ]),
    )
    .await;

    let (status, body) = get_json(&app, "/api/songs/search?title=love").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["id"], "a");
}

#[tokio::test]
async fn rating_boundaries_and_errors() {
    let (app, _temp_dir) = make_test_app();

    upload(&app, &json!([{"id": "a", "title": "Rated"}])).await;

    let (status, body) = rate(&app, "a", 0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 0);

    let (status, body) = rate(&app, "a", 5).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], 5);

    let (status, _) = rate(&app, "a", -1).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = rate(&app, "a", 6).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = rate(&app, "nonexistent", 3).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The out-of-range attempts must not have clobbered the stored value.
    let (_, body) = get_json(&app, "/api/songs/all").await;
    assert_eq!(body.as_array().unwrap()[0]["rating"], 5);
}

#[tokio::test]
async fn delete_all_empties_the_catalog() {
    let (app, _temp_dir) = make_test_app();

    upload(&app, &json!([{"id": "a"}, {"id": "b"}])).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/songs/all")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Deleted 2 songs.");

    let (_, body) = get_json(&app, "/api/songs").await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _temp_dir) = make_test_app();

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
