//! API integration tests.
//!
//! Routers run over mock databases with a fixed token table.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use std::path::Path;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use ripple_api::{AppState, auth_middleware, router as api_router};
use ripple_common::{AppError, AppResult, LocalStorage, RoleLookupFailurePolicy};
use ripple_core::{
    AuthResolver, EvidenceService, Identity, IdentityVerifier, NotificationEmitter,
    ReportLifecycleService, ReportQueryService, Role, RoleProbe, StaffRecord,
};
use ripple_db::{
    entities::report::{self, ReportStatus},
    repositories::{NotificationRepository, ReportRepository, StatusLogRepository},
    test_utils::report_fixture,
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::Value;
use tower::ServiceExt;

/// Tokens are `<subject>-token`.
struct StaticVerifier;

#[async_trait::async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> AppResult<Identity> {
        let subject = token
            .strip_suffix("-token")
            .ok_or(AppError::Unauthenticated)?;
        Ok(Identity {
            subject: subject.to_string(),
            email: Some(format!("{subject}@city.example")),
            expires_at: None,
        })
    }
}

struct FixedProbe {
    role: Role,
    subject: &'static str,
}

#[async_trait::async_trait]
impl RoleProbe for FixedProbe {
    fn role(&self) -> Role {
        self.role
    }

    async fn probe(&self, identity: &Identity) -> AppResult<Option<StaffRecord>> {
        Ok((identity.subject == self.subject).then(|| StaffRecord {
            email: None,
            block_id: (self.role == Role::Supervisor).then(|| "ward-3".to_string()),
        }))
    }
}

fn empty_db() -> Arc<DatabaseConnection> {
    Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
}

fn reports_db(batches: Vec<Vec<report::Model>>) -> Arc<DatabaseConnection> {
    let mut mock = MockDatabase::new(DatabaseBackend::Postgres);
    for batch in batches {
        mock = mock.append_query_results([batch]);
    }
    Arc::new(mock.into_connection())
}

/// Create test app state. `reports` backs the lifecycle and listings,
/// `evidence` backs the upload lookups.
fn create_test_state(
    reports: Arc<DatabaseConnection>,
    evidence: Arc<DatabaseConnection>,
    storage_dir: &Path,
) -> AppState {
    let auth = AuthResolver::new(
        Arc::new(StaticVerifier),
        vec![
            Arc::new(FixedProbe {
                role: Role::Admin,
                subject: "admin",
            }),
            Arc::new(FixedProbe {
                role: Role::Supervisor,
                subject: "sup",
            }),
        ],
        RoleLookupFailurePolicy::ClearRole,
    );
    let lifecycle = ReportLifecycleService::new(
        ReportRepository::new(reports.clone()),
        StatusLogRepository::new(empty_db()),
        NotificationEmitter::new(NotificationRepository::new(empty_db())),
        None,
        0.0,
    );
    let storage = LocalStorage::new(
        storage_dir.to_path_buf(),
        "http://localhost:3000/files".to_string(),
        "reports".to_string(),
    );

    AppState {
        auth,
        lifecycle,
        queries: ReportQueryService::new(ReportRepository::new(reports)),
        evidence: EvidenceService::new(
            Arc::new(storage),
            ReportRepository::new(evidence),
            1024 * 1024,
        ),
    }
}

fn create_test_app(state: AppState) -> Router {
    api_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

fn app_with_reports(batches: Vec<Vec<report::Model>>) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = create_test_state(reports_db(batches), empty_db(), dir.path());
    (create_test_app(state), dir)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method("GET");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn patch_json(uri: &str, token: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("PATCH")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_token_is_unauthenticated() {
    let (app, _dir) = app_with_reports(vec![]);

    let response = app.oneshot(get("/admin/reports", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn test_user_without_role_keeps_session_but_is_denied() {
    let (app, _dir) = app_with_reports(vec![]);

    let me = app
        .clone()
        .oneshot(get("/auth/me", Some("citizen-token")))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let body = json_body(me).await;
    assert_eq!(body["id"], "citizen");
    assert!(body["role"].is_null());

    let console = app
        .oneshot(get("/admin/me", Some("citizen-token")))
        .await
        .unwrap();
    assert_eq!(console.status(), StatusCode::FORBIDDEN);
    let body = json_body(console).await;
    assert_eq!(body["error"]["code"], "ROLE_UNDETERMINED");
}

#[tokio::test]
async fn test_supervisor_cannot_use_admin_console() {
    let (app, _dir) = app_with_reports(vec![]);

    let response = app
        .oneshot(get("/admin/reports", Some("sup-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_supervisor_me_carries_block() {
    let (app, _dir) = app_with_reports(vec![]);

    let response = app
        .oneshot(get("/supervisor/me", Some("sup-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["role"], "SUPERVISOR");
    assert_eq!(body["block_id"], "ward-3");
}

#[tokio::test]
async fn test_resolve_without_photo_is_rejected() {
    // No prepared rows: any store access would fail the request differently.
    let (app, _dir) = app_with_reports(vec![]);

    let response = app
        .oneshot(patch_json(
            "/admin/report/r1/resolve",
            "admin-token",
            &serde_json::json!({ "resolved_class": "NoPotHole" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn test_start_work_returns_updated_report() {
    let pending = report_fixture("r1", ReportStatus::Pending);
    let mut started = pending.clone();
    started.status = ReportStatus::InProgress;
    started.estimated_time = Some("2 days".to_string());
    let (app, _dir) = app_with_reports(vec![vec![pending], vec![started]]);

    let response = app
        .oneshot(patch_json(
            "/admin/report/r1/start",
            "admin-token",
            &serde_json::json!({ "estimated_time": "2 days" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "In Progress");
    assert_eq!(body["estimated_time"], "2 days");
}

#[tokio::test]
async fn test_listing_filters_by_status_and_parses_location() {
    let mut a = report_fixture("r3", ReportStatus::Resolved);
    a.coords = Some("12.9716,77.5946".to_string());
    let rows = vec![
        a,
        report_fixture("r2", ReportStatus::Pending),
        report_fixture("r1", ReportStatus::Resolved),
    ];
    let (app, _dir) = app_with_reports(vec![rows]);

    let response = app
        .oneshot(get("/admin/reports?status=Resolved", Some("admin-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"], "r3");
    assert!((list[0]["location_point"]["lat"].as_f64().unwrap() - 12.9716).abs() < 1e-9);
    assert!(list[1]["location_point"].is_null());
}

#[tokio::test]
async fn test_admin_listing_scoped_to_one_citizen() {
    let mut mine = report_fixture("r2", ReportStatus::Pending);
    mine.user_id = "citizen-7".to_string();
    let mut resolved = mine.clone();
    resolved.id = "r1".to_string();
    resolved.status = ReportStatus::Resolved;
    let db = reports_db(vec![vec![mine, resolved]]);
    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(create_test_state(db.clone(), empty_db(), dir.path()));

    let response = app
        .oneshot(get(
            "/admin/reports?user_id=citizen-7&status=Pending",
            Some("admin-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["r2"]);

    let Ok(conn) = Arc::try_unwrap(db) else {
        panic!("connection still shared");
    };
    let sql = format!("{:?}", conn.into_transaction_log());
    assert!(sql.contains("user_id"));
    assert!(sql.contains("citizen-7"));
}

#[tokio::test]
async fn test_listing_rejects_unknown_status() {
    let (app, _dir) = app_with_reports(vec![]);

    let response = app
        .oneshot(get("/supervisor/reports?status=Closed", Some("sup-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_hotspots_group_located_reports() {
    let mut a = report_fixture("r3", ReportStatus::Pending);
    a.coords = Some("12.97,77.59".to_string());
    let mut b = a.clone();
    b.id = "r2".to_string();
    let c = report_fixture("r1", ReportStatus::Pending);
    let (app, _dir) = app_with_reports(vec![vec![a, b, c]]);

    let response = app
        .oneshot(get("/reports/hotspots", Some("sup-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let groups = body.as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["count"], 2);
}

#[tokio::test]
async fn test_class_lookup() {
    let (app, _dir) = app_with_reports(vec![]);

    let response = app
        .oneshot(get("/classes/NoPotHole", Some("admin-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["description"], "No Pothole (Resolved)");
    assert_eq!(body["resolved"], true);
}

#[tokio::test]
async fn test_signed_out_token_is_refused() {
    let (app, _dir) = app_with_reports(vec![]);

    let signout = Request::builder()
        .uri("/auth/signout")
        .method("POST")
        .header(header::AUTHORIZATION, "Bearer admin-token")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(signout).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me = app
        .oneshot(get("/auth/me", Some("admin-token")))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signout_requires_a_valid_session() {
    let (app, _dir) = app_with_reports(vec![]);

    let signout = Request::builder()
        .uri("/auth/signout")
        .method("POST")
        .header(header::AUTHORIZATION, "Bearer not-a-real-session")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(signout).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

fn evidence_upload(report_id: &str, token: &str) -> Request<Body> {
    let png: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    let boundary = "ripple-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"after.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(png);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .uri(format!("/reports/{report_id}/evidence"))
        .method("POST")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_uploaded_evidence_url_becomes_resolved_photo() {
    let dir = tempfile::tempdir().unwrap();
    let mut current = report_fixture("r1", ReportStatus::InProgress);
    current.worker_name = Some("Ravi".to_string());

    let upload_app = create_test_app(create_test_state(
        empty_db(),
        reports_db(vec![vec![current.clone()]]),
        dir.path(),
    ));
    let response = upload_app
        .oneshot(evidence_upload("r1", "admin-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let url = json_body(response).await["url"].as_str().unwrap().to_string();

    let mut stored = current.clone();
    stored.status = ReportStatus::Resolved;
    stored.resolved_photo = Some(url.clone());
    stored.resolved_image_url = Some(url.clone());
    let db = reports_db(vec![vec![current], vec![stored]]);
    let resolve_app = create_test_app(create_test_state(db.clone(), empty_db(), dir.path()));

    let response = resolve_app
        .oneshot(patch_json(
            "/admin/report/r1/resolve",
            "admin-token",
            &serde_json::json!({ "image_url": url }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["resolved_photo"], url.as_str());
    assert_eq!(body["status"], "Resolved");

    let Ok(conn) = Arc::try_unwrap(db) else {
        panic!("connection still shared");
    };
    let sql = format!("{:?}", conn.into_transaction_log());
    assert!(sql.contains("UPDATE"));
    assert!(sql.contains(&url));
}

#[tokio::test]
async fn test_evidence_upload_returns_public_url() {
    let dir = tempfile::tempdir().unwrap();
    let state = create_test_state(
        empty_db(),
        reports_db(vec![vec![report_fixture("r1", ReportStatus::InProgress)]]),
        dir.path(),
    );
    let app = create_test_app(state);

    let response = app.oneshot(evidence_upload("r1", "sup-token")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("http://localhost:3000/files/reports/resolved/r1_"));
    assert_eq!(body["size"], 10);
}
