pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::ApiState;

/// Build the API router. Split out from [`serve`] so tests can bind their
/// own listener on an ephemeral port.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handlers::handle_status))
        .route("/tasks", post(handlers::handle_task_submit))
        .route("/tasks", get(handlers::handle_task_list))
        .route("/tasks/{id}", get(handlers::handle_task_get))
        .route("/votes", post(handlers::handle_vote))
        .route("/votes/{id}", get(handlers::handle_votes_get))
        .route("/tally/{id}", get(handlers::handle_tally_get))
        .route("/events/{id}", get(handlers::handle_events_get))
        .route("/submitters", get(handlers::handle_submitter_list))
        .route("/submitters/add", post(handlers::handle_submitter_add))
        .route("/submitters/remove", post(handlers::handle_submitter_remove))
        .route("/verifiers", get(handlers::handle_verifier_list))
        .route("/verifiers/add", post(handlers::handle_verifier_add))
        .route("/verifiers/remove", post(handlers::handle_verifier_remove))
        .route("/threshold", get(handlers::handle_threshold_get))
        .route("/threshold", post(handlers::handle_threshold_set))
        .route("/tally-identity", post(handlers::handle_tally_identity_set))
        .route("/daemon/shutdown", post(handlers::handle_shutdown))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn serve(state: ApiState, port: u16) -> anyhow::Result<()> {
    let shutdown_rx = state.shutdown_tx.subscribe();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!(port, "API listening on 127.0.0.1");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let mut rx = shutdown_rx;
            let _ = rx.recv().await;
        })
        .await?;
    Ok(())
}
