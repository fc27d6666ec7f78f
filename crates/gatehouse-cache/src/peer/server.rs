//! Internal listener answering load requests from other peers.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use gatehouse_core::{GatehouseError, Result, RoutingKey};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::protocol::{EXPIRES_AT_HEADER, PEER_PATH_PREFIX, PeerErrorBody};
use crate::group::GroupRegistry;

/// Builds and starts the peer listener.
pub struct PeerServer;

impl PeerServer {
    /// Router serving `GET /_gatehouse/{group}/{key}`.
    pub fn router(registry: GroupRegistry) -> Router {
        Router::new()
            .route(
                &format!("{PEER_PATH_PREFIX}/{{group}}/{{key}}"),
                get(peer_load),
            )
            .with_state(registry)
    }

    /// Binds all interfaces on the port of `self_addr` and starts serving.
    pub async fn start(self_addr: &str, registry: GroupRegistry) -> Result<PeerServerHandle> {
        let port = reqwest::Url::parse(self_addr)
            .ok()
            .and_then(|url| url.port_or_known_default())
            .ok_or_else(|| {
                GatehouseError::configuration(format!("cannot take a port from {self_addr}"))
            })?;

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            GatehouseError::configuration(format!("peer listener cannot bind {addr}: {e}"))
        })?;

        Self::serve(listener, registry)
    }

    /// Serves on an already bound listener.
    pub fn serve(listener: TcpListener, registry: GroupRegistry) -> Result<PeerServerHandle> {
        let local_addr = listener.local_addr().map_err(GatehouseError::transport)?;
        let app = Self::router(registry);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.wait_for(|stop| *stop).await;
                })
                .await
        });

        info!(addr = %local_addr, "Peer listener started");

        Ok(PeerServerHandle {
            shutdown_tx,
            task,
            local_addr,
        })
    }
}

/// Handle for stopping a running peer listener.
#[derive(Debug)]
pub struct PeerServerHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<std::io::Result<()>>,
    local_addr: SocketAddr,
}

impl PeerServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting peer requests and waits up to `grace` for in-flight
    /// ones; anything still running after that is aborted.
    pub async fn shutdown(self, grace: Duration) {
        let _ = self.shutdown_tx.send(true);
        let mut task = self.task;

        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(Ok(()))) => info!("Peer listener stopped"),
            Ok(Ok(Err(e))) => warn!(error = %e, "Peer listener ended with error"),
            Ok(Err(e)) => warn!(error = %e, "Peer listener task failed"),
            Err(_) => {
                warn!(grace_ms = grace.as_millis() as u64, "Peer listener grace expired, aborting");
                task.abort();
            },
        }
    }
}

async fn peer_load(
    State(registry): State<GroupRegistry>,
    Path((group, key)): Path<(String, String)>,
) -> Response {
    let Some(cache) = registry.get(&group) else {
        debug!(group = %group, "Peer asked for unknown group");
        return peer_error(
            StatusCode::NOT_FOUND,
            &GatehouseError::UnknownGroup(group),
        );
    };

    let result = match RoutingKey::new(key) {
        Ok(key) => cache.get_as_owner(&key).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(entry) => {
            let expires = HeaderValue::from(entry.expires_at_millis());
            (
                StatusCode::OK,
                [(EXPIRES_AT_HEADER, expires)],
                entry.value,
            )
                .into_response()
        },
        Err(err) => peer_error(StatusCode::BAD_GATEWAY, &err),
    }
}

fn peer_error(status: StatusCode, err: &GatehouseError) -> Response {
    (status, Json(PeerErrorBody::from(err))).into_response()
}
