use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryApplicationRepository, Mailer};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use leave_desk::config::AppConfig;
use leave_desk::error::AppError;
use leave_desk::telemetry;
use leave_desk::workflows::leave::{LeaveApplicationService, NotificationGateway};
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryApplicationRepository::default());
    let mailer = Arc::new(Mailer::from_config(&config.mail)?);
    spawn_mailer_check(mailer.clone());

    let application_service = Arc::new(LeaveApplicationService::new(
        repository,
        mailer,
        config.workflow_config(),
    ));

    let app = with_application_routes(application_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer)
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr()?;
    let listener = bind(addr, config.server.port_fallback).await?;
    let bound = listener.local_addr()?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %bound, "leave application API ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("leave application API stopped");
    Ok(())
}

/// Bind `addr`, retrying once on the next port when it is already taken.
async fn bind(addr: SocketAddr, port_fallback: bool) -> Result<TcpListener, AppError> {
    match TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(err) if port_fallback && err.kind() == ErrorKind::AddrInUse => {
            let Some(next_port) = addr.port().checked_add(1) else {
                return Err(err.into());
            };
            let alternative = SocketAddr::new(addr.ip(), next_port);
            warn!(%addr, %alternative, "port busy, trying alternative port");
            Ok(TcpListener::bind(alternative).await?)
        }
        Err(err) => Err(err.into()),
    }
}

/// Reachability check on the mail transport; only logged, never blocks serving.
fn spawn_mailer_check<G>(mailer: Arc<G>)
where
    G: NotificationGateway + 'static,
{
    tokio::spawn(async move {
        match tokio::task::spawn_blocking(move || mailer.verify()).await {
            Ok(Ok(())) => info!("mail transport ready to send decision emails"),
            Ok(Err(err)) => warn!(error = %err, "mail transport verification failed"),
            Err(err) => warn!(error = %err, "mail transport verification aborted"),
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
