//! `msghub daemon`: Serve the hub over WebSockets.

use msghub_hub::{server, EchoService, Hub, PresenceHooks, WhoAmIService};
use msghub_types::{HubConfig, HubResult};
use tokio::net::TcpListener;
use tracing::info;

pub async fn run(config: HubConfig) -> HubResult<()> {
    let addr = config.listen_addr;
    let (hub, _executor) = Hub::<()>::builder()
        .config(config)
        .hooks(PresenceHooks)
        .service("@echo", EchoService)
        .service("@whoami", WhoAmIService)
        .spawn();

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listen on");
    server::serve(listener, hub).await
}
