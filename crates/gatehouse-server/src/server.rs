use std::sync::Arc;

use axum::{Router, http::header, middleware, routing::get};
use gatehouse_cache::{ControlPlaneClient, PeerCoordinator, PeerServer, Resolver};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tracing::{error, info, warn};

use crate::forward::Forwarder;
use crate::handlers::{
    health::health_check,
    metrics::{MetricsState, metrics_handler},
    proxy::proxy_request,
};
use crate::middleware::{LoggingLayer, RequestIdLayer};
use crate::settings::Settings;
use crate::state::AppState;

/// Creates a router with the given application state and metrics handle.
pub fn create_router_with_state(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .layer(SetSensitiveRequestHeadersLayer::new([header::AUTHORIZATION]))
        .layer(RequestIdLayer)
        .layer(LoggingLayer);

    let metrics_router = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(MetricsState {
            prometheus: prometheus_handle,
            groups: state.resolver().groups(),
        });

    // Everything that is not an operational route goes through the proxy
    let app_router = Router::new()
        .route("/health", get(health_check))
        .fallback(proxy_request)
        .with_state(state);

    Router::new()
        .merge(app_router)
        .merge(metrics_router)
        .layer(middleware::from_fn(
            crate::metrics::http::http_metrics_middleware,
        ))
        .layer(middleware_stack)
}

/// Builds the resolver for `settings`, starting the peer listener first
/// when caching is enabled.
async fn build_resolver(
    settings: &Settings,
) -> anyhow::Result<(Resolver, Option<gatehouse_cache::PeerServerHandle>)> {
    let client = Arc::new(ControlPlaneClient::new(settings.control_plane_config()?)?);

    if !settings.cache.enabled {
        info!("Caching disabled, every lookup goes to the control plane");
        return Ok((Resolver::bypass(client), None));
    }

    let coordinator = Arc::new(PeerCoordinator::new(
        &settings.cache.peers,
        &settings.cache.self_addr,
        settings.peer_config(),
    )?);
    let resolver = Resolver::cached(
        client,
        settings.resolver_config(),
        Some(Arc::clone(&coordinator)),
    );
    let peer_server = PeerServer::start(&settings.cache.self_addr, resolver.groups()).await?;

    info!(
        self_addr = %coordinator.self_addr(),
        peers = coordinator.peers().len(),
        "Caching enabled"
    );

    Ok((resolver, Some(peer_server)))
}

/// Runs the proxy until SIGINT/SIGTERM, then drains and shuts down.
pub async fn run(settings: Settings, prometheus_handle: PrometheusHandle) -> anyhow::Result<()> {
    let (resolver, peer_server) = build_resolver(&settings).await?;
    let forwarder = Forwarder::new(&settings.origin_url, settings.tracing_enabled)?;
    let app = create_router_with_state(AppState::new(resolver, forwarder), prometheus_handle);

    let listener = TcpListener::bind(settings.listen_addr).await?;
    info!("Server listening on {}", settings.listen_addr);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            })
            .await
    });

    let grace = settings.shutdown.grace();

    tokio::select! {
        _ = shutdown_signal() => {},
        result = &mut server => {
            if let Some(peer_server) = peer_server {
                peer_server.shutdown(grace).await;
            }
            return Ok(result??);
        }
    }

    let drain = settings.shutdown.drain();
    info!("Sleeping {}s before closing listeners", drain.as_secs());
    tokio::time::sleep(drain).await;

    let _ = shutdown_tx.send(true);
    match tokio::time::timeout(grace, &mut server).await {
        Ok(Ok(Ok(()))) => info!("HTTP server stopped"),
        Ok(Ok(Err(e))) => error!(error = %e, "HTTP server ended with error"),
        Ok(Err(e)) => error!(error = %e, "HTTP server task failed"),
        Err(_) => {
            warn!("Graceful shutdown exceeded {}s, aborting", grace.as_secs());
            server.abort();
        },
    }

    if let Some(peer_server) = peer_server {
        peer_server.shutdown(grace).await;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    warn!("Shutdown signal received");
}
