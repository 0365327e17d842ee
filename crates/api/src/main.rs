use std::sync::Arc;

use brewpos_api::app::{self, services};
use brewpos_api::config::Config;
use brewpos_core::SystemClock;
use brewpos_infra::ExpirySweeper;

#[tokio::main]
async fn main() {
    brewpos_observability::init();

    let config = Config::from_env();
    let services = services::build_services(&config);

    // Held until the process exits; dropping it stops the sweep thread.
    let _sweeper = ExpirySweeper {
        interval: config.sweep_interval,
    }
    .spawn(
        "reservation-expiry",
        Arc::clone(&services.manager),
        Arc::new(SystemClock),
    );

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .expect("failed to bind listen address");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
