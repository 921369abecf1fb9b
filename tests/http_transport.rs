//! End-to-end checks of `HttpTransport` and the controller against an
//! in-process portal server.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use clubdesk::controller::{AssumeYes, LoadOutcome, RemoveOutcome};
use clubdesk::export::ExportFormat;
use clubdesk::form::{FormData, SelectedFile};
use clubdesk::notify::{ToastBoard, ToastKind};
use clubdesk::resources::{designs, find, vendors};
use clubdesk::transport::{FileAction, HttpTransport, ResourceTransport};
use clubdesk::{PortalConfig, PortalError, RecordId, ResourceListController};
use serde_json::{Value, json};

// =============================================================================
// SERVER
// =============================================================================

#[derive(Clone, Default)]
struct Portal {
    vendors: Arc<Mutex<Vec<Value>>>,
    uploads: Arc<Mutex<Vec<String>>>,
}

impl Portal {
    fn next_id(&self) -> u64 {
        self.vendors
            .lock()
            .unwrap()
            .iter()
            .filter_map(|v| v["id"].as_u64())
            .max()
            .unwrap_or(0)
            + 1
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

async fn list_vendors(State(portal): State<Portal>) -> Json<Value> {
    ok(Value::Array(portal.vendors.lock().unwrap().clone()))
}

async fn create_vendor(State(portal): State<Portal>, Json(mut body): Json<Value>) -> Json<Value> {
    body["id"] = json!(portal.next_id());
    body["created_at"] = json!("2026-10-17T09:30:00Z");
    portal.vendors.lock().unwrap().push(body.clone());
    ok(body)
}

async fn get_vendor(State(portal): State<Portal>, Path(id): Path<u64>) -> Response {
    let vendors = portal.vendors.lock().unwrap();
    match vendors.iter().find(|v| v["id"] == json!(id)) {
        Some(vendor) => ok(vendor.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "success": false, "error": "商家不存在" }))).into_response(),
    }
}

async fn update_vendor(State(portal): State<Portal>, Path(id): Path<u64>, Json(body): Json<Value>) -> Response {
    let mut vendors = portal.vendors.lock().unwrap();
    let Some(vendor) = vendors.iter_mut().find(|v| v["id"] == json!(id)) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let (Some(target), Some(patch)) = (vendor.as_object_mut(), body.as_object()) {
        for (k, v) in patch {
            target.insert(k.clone(), v.clone());
        }
    }
    // Some endpoints answer updates with no body at all.
    StatusCode::NO_CONTENT.into_response()
}

async fn delete_vendor(State(portal): State<Portal>, Path(id): Path<u64>) -> Json<Value> {
    if id == 99 {
        return Json(json!({ "success": false, "message": "商家仍有关联活动" }));
    }
    portal.vendors.lock().unwrap().retain(|v| v["id"] != json!(id));
    Json(json!({ "success": true }))
}

async fn export_vendors() -> Response {
    ([(header::CONTENT_TYPE, "text/csv")], "\u{feff}\"ID\"\r\n\"1\"\r\n").into_response()
}

async fn list_users() -> Json<Value> {
    Json(json!([{ "id": "u-1", "username": "alice", "role": "admin" }]))
}

async fn list_departments() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "database locked" }))).into_response()
}

async fn list_meetings(headers: HeaderMap) -> Response {
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok());
    if cookie != Some("sid=abc") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "请先登录" }))).into_response();
    }
    ok(json!([])).into_response()
}

async fn upload_design(State(portal): State<Portal>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("multipart/form-data") {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "expected multipart" }))).into_response();
    }
    portal.uploads.lock().unwrap().push(String::from_utf8_lossy(&body).into_owned());
    ok(json!({ "id": 1, "title": "Poster" })).into_response()
}

async fn spawn_portal(portal: Portal) -> PortalConfig {
    let app = Router::new()
        .route("/api/pr/vendors", get(list_vendors).post(create_vendor))
        .route("/api/pr/vendors/export", get(export_vendors))
        .route("/api/pr/vendors/{id}", get(get_vendor).put(update_vendor).delete(delete_vendor))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/departments", get(list_departments))
        .route("/api/secretary/meetings", get(list_meetings))
        .route("/api/design/designs", get(|| async { ok(json!([])) }).post(upload_design))
        .with_state(portal);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    PortalConfig::default().with_base_url(&format!("http://{addr}/"))
}

fn seeded() -> Portal {
    let portal = Portal::default();
    portal
        .vendors
        .lock()
        .unwrap()
        .push(json!({ "id": 1, "name": "Acme", "status": "active", "created_at": "2024-05-01T08:00:00Z" }));
    portal
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[tokio::test]
async fn list_accepts_wrapped_and_bare_collections() {
    let config = spawn_portal(seeded()).await;
    let transport = HttpTransport::new(&config).unwrap();

    let vendors = transport.list("/api/pr/vendors").await.unwrap();
    assert_eq!(vendors[0].text("name"), "Acme");

    let users = transport.list("/api/admin/users").await.unwrap();
    assert_eq!(users[0].id(), Some(RecordId::from("u-1")));
}

#[tokio::test]
async fn server_error_message_is_surfaced() {
    let config = spawn_portal(Portal::default()).await;
    let transport = HttpTransport::new(&config).unwrap();

    let err = transport.list("/api/admin/departments").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), "database locked");
    assert!(err.retryable());
}

#[tokio::test]
async fn session_cookie_is_sent() {
    let config = spawn_portal(Portal::default()).await;

    let anonymous = HttpTransport::new(&config).unwrap();
    let err = anonymous.list("/api/secretary/meetings").await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.user_message(), "请先登录");

    let authed = HttpTransport::new(&config.with_session_cookie(Some("sid=abc".into()))).unwrap();
    assert!(authed.list("/api/secretary/meetings").await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let config = PortalConfig::default().with_base_url("http://127.0.0.1:1");
    let transport = HttpTransport::new(&config).unwrap();
    let err = transport.list("/api/pr/vendors").await.unwrap_err();
    assert!(matches!(err, PortalError::Network(_)));
}

#[tokio::test]
async fn delete_with_failure_envelope_is_an_error() {
    let config = spawn_portal(seeded()).await;
    let transport = HttpTransport::new(&config).unwrap();

    let err = transport.delete("/api/pr/vendors", &RecordId::from(99)).await.unwrap_err();
    assert_eq!(err.user_message(), "商家仍有关联活动");
}

#[tokio::test]
async fn empty_update_response_is_accepted() {
    let portal = seeded();
    let config = spawn_portal(portal.clone()).await;
    let transport = HttpTransport::new(&config).unwrap();

    let updated = transport
        .update("/api/pr/vendors", &RecordId::from(1), &FormData::new().with("status", "inactive"))
        .await
        .unwrap();
    assert_eq!(updated, None);
    assert_eq!(portal.vendors.lock().unwrap()[0]["status"], "inactive");
}

#[tokio::test]
async fn file_upload_is_sent_as_multipart() {
    let portal = Portal::default();
    let config = spawn_portal(portal.clone()).await;
    let transport = HttpTransport::new(&config).unwrap();
    let file = SelectedFile { name: "poster.png".into(), mime: "image/png".into(), bytes: b"PNGDATA".to_vec() };
    let form = FormData::new().with("title", "Poster").with_file("file", file);

    transport.create("/api/design/designs", &form).await.unwrap();

    let uploads = portal.uploads.lock().unwrap();
    assert!(uploads[0].contains("filename=\"poster.png\""));
    assert!(uploads[0].contains("PNGDATA"));
    assert!(uploads[0].contains("name=\"title\""));
}

#[tokio::test]
async fn remote_export_returns_raw_bytes() {
    let config = spawn_portal(seeded()).await;
    let transport = HttpTransport::new(&config).unwrap();
    let bytes = transport.export("/api/pr/vendors", ExportFormat::Csv).await.unwrap();
    assert!(bytes.starts_with("\u{feff}".as_bytes()));
}

#[tokio::test]
async fn file_links_are_absolute() {
    let config = spawn_portal(Portal::default()).await;
    let transport = HttpTransport::new(&config).unwrap();
    let url = transport.file_url("/api/design/designs", &RecordId::from(3), FileAction::Download);
    assert!(url.starts_with("http://127.0.0.1:"));
    assert!(url.ends_with("/api/design/designs/3/download"));
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[tokio::test]
async fn vendor_page_full_cycle() {
    let portal = seeded();
    let config = spawn_portal(portal.clone()).await;
    let board = Arc::new(ToastBoard::default());
    let controller = ResourceListController::new(vendors(), HttpTransport::new(&config).unwrap())
        .with_notifier(board.clone())
        .with_confirm(Arc::new(AssumeYes));

    assert!(controller.initialize().await.unwrap());
    let html = controller.view_html();
    assert!(html.contains("data-id=\"1\""));
    assert!(html.contains("已合作"));
    assert!(html.contains("2024-05-01"));

    let created = controller.create(FormData::new().with("name", "Beta & Co")).await.unwrap();
    assert_eq!(created.and_then(|r| r.id()), Some(RecordId::from(2)));
    assert_eq!(controller.items().len(), 2);
    assert!(controller.view_html().contains("Beta &amp; Co"));

    let session = controller.begin_edit(&RecordId::from(2)).await.unwrap();
    let mut form = session.form;
    form.set("status", "pending");
    controller.submit(form).await.unwrap();
    assert!(controller.view_html().contains("洽谈中"));

    assert_eq!(controller.remove(&RecordId::from(1)).await.unwrap(), RemoveOutcome::Removed);
    let ids: Vec<Option<RecordId>> = controller.items().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec![Some(RecordId::from(2))]);

    let kinds: Vec<ToastKind> = board.visible(Instant::now()).into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![ToastKind::Success; 3]);
}

#[tokio::test]
async fn failing_page_keeps_placeholder_free_previous_state() {
    let config = spawn_portal(Portal::default()).await;
    let board = Arc::new(ToastBoard::default());
    let spec = find("departments").unwrap();
    let controller =
        ResourceListController::new(spec, HttpTransport::new(&config).unwrap()).with_notifier(board.clone());

    assert!(controller.initialize().await.is_err());
    assert!(controller.view().is_none());
    assert!(!controller.is_loading());
    let messages: Vec<String> = board.visible(Instant::now()).into_iter().map(|t| t.message).collect();
    assert_eq!(messages, vec!["database locked"]);
    assert_eq!(controller.diagnostics().len(), 1);
}

#[tokio::test]
async fn design_upload_through_controller() {
    let portal = Portal::default();
    let config = spawn_portal(portal.clone()).await;
    let controller = ResourceListController::new(designs(), HttpTransport::new(&config).unwrap());
    let file = SelectedFile { name: "a.pdf".into(), mime: "application/pdf".into(), bytes: vec![b'%'; 4] };

    let missing = controller.create(FormData::new().with("title", "Poster")).await.unwrap_err();
    assert!(matches!(missing, PortalError::Validation(_)));
    assert!(portal.uploads.lock().unwrap().is_empty());

    controller
        .create(FormData::new().with("title", "Poster").with_file("file", file))
        .await
        .unwrap();
    assert_eq!(portal.uploads.lock().unwrap().len(), 1);
    assert_eq!(controller.load().await.unwrap(), LoadOutcome::Loaded(0));
}
