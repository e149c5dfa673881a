use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use vitgen_core::dataset::CompiledDataset;

use crate::api::{build_router, GatewayState};
use crate::proxy::Upstream;

/// The gateway HTTP server.
pub struct GatewayServer {
    state: GatewayState,
}

impl GatewayServer {
    pub fn new(dataset: Arc<CompiledDataset>, upstream: Upstream) -> Self {
        Self {
            state: GatewayState::new(dataset, upstream),
        }
    }

    /// Bind `addr` and serve in the background. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<GatewayHandle> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let app = build_router(self.state);
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let shutdown = async {
                let _ = stop_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                warn!(error = %e, "gateway stopped with error");
            }
        });

        info!(addr = %local_addr, "gateway started");
        Ok(GatewayHandle {
            local_addr,
            stop: Some(stop_tx),
            task,
        })
    }
}

/// Running gateway.
pub struct GatewayHandle {
    local_addr: SocketAddr,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl GatewayHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "gateway task failed");
        }
        info!(addr = %self.local_addr, "gateway stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn serves_until_stopped() {
        let upstream = Upstream::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let server = GatewayServer::new(Arc::new(CompiledDataset::default()), upstream);
        let handle = server.start("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = handle.local_addr();

        let resp = reqwest::get(format!("http://{addr}/api/v0/fund")).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        handle.stop().await;
        assert!(reqwest::get(format!("http://{addr}/api/v0/fund")).await.is_err());
    }
}
