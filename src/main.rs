mod forms;
mod routes;
mod services;

use std::net::SocketAddr;
use tracing::info;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let state = routes::default_state().await;
    if let Err(err) = state.settings.validate() {
        panic!("invalid settings: {err}");
    }
    let addr: SocketAddr = state
        .settings
        .bind_address
        .parse()
        .expect("invalid bind address");
    let app = routes::build_router(state);

    info!("cluster planner listening on http://{addr}");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .expect("server failed");
}
