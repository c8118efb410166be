//! Ripple server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use ripple_api::{AppState, auth_middleware, router as api_router};
use ripple_common::{Config, LocalStorage, StorageBackend};
use ripple_core::{
    AdminProbe, AuthResolver, Classifier, EvidenceService, HttpClassifier, JwtVerifier,
    NotificationEmitter, ReportLifecycleService, ReportQueryService, RoleProbe, SupervisorProbe,
};
use ripple_db::repositories::{
    NotificationRepository, ReportRepository, StaffRepository, StatusLogRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Multipart framing allowance on top of the largest accepted photo.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Wire repositories and services from configuration.
fn build_state(config: &Config, db: &Arc<sea_orm::DatabaseConnection>) -> anyhow::Result<AppState> {
    let report_repo = ReportRepository::new(Arc::clone(db));
    let status_log_repo = StatusLogRepository::new(Arc::clone(db));
    let notification_repo = NotificationRepository::new(Arc::clone(db));
    let staff_repo = StaffRepository::new(Arc::clone(db));

    let probes: Vec<Arc<dyn RoleProbe>> = vec![
        Arc::new(AdminProbe::new(staff_repo.clone())),
        Arc::new(SupervisorProbe::new(staff_repo)),
    ];
    let auth = AuthResolver::new(
        Arc::new(JwtVerifier::from_config(&config.auth)?),
        probes,
        config.auth.role_lookup_failure,
    );

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::from_settings(&config.storage));

    let classifier: Option<Arc<dyn Classifier>> = if config.classifier.enabled {
        info!(url = %config.classifier.url, "Resolution classifier enabled");
        Some(Arc::new(HttpClassifier::new(
            &config.classifier,
            storage.clone(),
            config.storage.max_upload_bytes,
        )?))
    } else {
        info!("Resolution classifier disabled");
        None
    };

    let lifecycle = ReportLifecycleService::new(
        report_repo.clone(),
        status_log_repo,
        NotificationEmitter::new(notification_repo),
        classifier,
        config.classifier.min_confidence,
    );

    let evidence = EvidenceService::new(
        storage,
        report_repo.clone(),
        config.storage.max_upload_bytes,
    );

    Ok(AppState {
        auth,
        lifecycle,
        queries: ReportQueryService::new(report_repo),
        evidence,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ripple=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting ripple server...");

    let config = Config::load()?;

    let db = Arc::new(ripple_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    ripple_db::migrate(&db).await?;
    info!("Migrations completed");

    let state = build_state(&config, &db)?;

    let files_dir = config.storage.base_path.clone();
    if let Err(e) = tokio::fs::create_dir_all(files_dir.join(&config.storage.bucket)).await {
        tracing::warn!(path = %files_dir.display(), error = %e, "Could not create storage directory");
    }

    let app = Router::new()
        .merge(api_router())
        .layer(DefaultBodyLimit::max(
            config.storage.max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .nest_service("/files", ServeDir::new(files_dir))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
