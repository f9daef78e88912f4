use didactic::{app, initialize_state, telemetry};

const DEFAULT_ADDRESS: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init();

    let state = initialize_state().await?;
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(DEFAULT_ADDRESS).await?;
    tracing::info!(address = %listener.local_addr()?, "didactic started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("cannot install ctrl+c handler");

    tracing::info!("shutdown signal received");
}
