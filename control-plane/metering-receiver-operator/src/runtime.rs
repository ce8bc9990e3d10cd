use std::net::SocketAddr;

use kube::Client;
use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    config::OperatorConfig, controller::run_controller, web::run_http_server,
};

/// Compute the HTTP bind address based on config.
pub fn compute_http_addr(cfg: &OperatorConfig) -> SocketAddr {
    ([0, 0, 0, 0], cfg.http_port).into()
}

/// Spawn the Kubernetes controller loop.
pub fn spawn_controller(
    client: Client,
    cfg: OperatorConfig,
) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { run_controller(client, cfg).await })
}

/// Spawn the health endpoint.
pub fn spawn_http(addr: SocketAddr) -> JoinHandle<anyhow::Result<()>> {
    tokio::spawn(async move { run_http_server(addr).await })
}

/// Start the controller and the HTTP server; return when either finishes.
pub async fn run_all(client: Client, cfg: OperatorConfig) -> anyhow::Result<()> {
    let http_addr = compute_http_addr(&cfg);

    let mut controller = spawn_controller(client, cfg);
    let mut http = spawn_http(http_addr);

    tokio::select! {
        res = &mut controller => {
            info!("controller task finished");
            http.abort();
            res?
        }
        res = &mut http => {
            info!("http task finished");
            controller.abort();
            res?
        }
    }
}
