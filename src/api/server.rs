//! API server lifecycle: bind, spawn the axum server in a background task,
//! shut down via a oneshot channel.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::api::router::api_router;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Bind the API server and spawn it in a background task.
pub async fn start_server(addr: SocketAddr, db_path: PathBuf) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(%addr, "API server binding");

    let app = api_router(db_path);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        if let Err(e) = server.await {
            tracing::error!("API server error: {e}");
        }
        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_starts_and_shuts_down() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");
        crate::db::sqlite::open_database(&db_path).unwrap();

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut server = start_server(addr, db_path).await.unwrap();
        assert_ne!(server.addr.port(), 0);

        server.shutdown();
    }

    #[tokio::test]
    async fn two_servers_get_distinct_ports() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("test.db");
        crate::db::sqlite::open_database(&db_path).unwrap();

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let mut a = start_server(addr, db_path.clone()).await.unwrap();
        let mut b = start_server(addr, db_path).await.unwrap();
        assert_ne!(a.addr.port(), b.addr.port());

        a.shutdown();
        b.shutdown();
    }
}
