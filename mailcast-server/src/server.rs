//! Axum server setup and router configuration.

use crate::api;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;
use axum::Router;
use std::borrow::Cow;
use std::future::{Future, IntoFuture};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Build the main application router.
pub fn build_router(state: AppState) -> Router {
    api::router().with_state(state)
}

/// Resolve a `host:port` listen address. A bare `:port` binds every
/// interface.
fn bind_target(listen: &str) -> Cow<'_, str> {
    if listen.starts_with(':') {
        Cow::Owned(format!("0.0.0.0{listen}"))
    } else {
        Cow::Borrowed(listen)
    }
}

/// Run the server until SIGTERM/SIGINT, then drain for at most `grace`.
pub async fn run_server(
    router: Router,
    listen: &str,
    shutdown_tx: watch::Sender<bool>,
    grace: Duration,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(&*bind_target(listen)).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    let shutdown_rx = shutdown_tx.subscribe();
    serve(listener, router, shutdown_signal(shutdown_tx), shutdown_rx, grace).await
}

/// Serve `router` until `signal` resolves. `shutdown_rx` must flip to `true`
/// when it does; from then on in-flight requests get `grace` to finish.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    signal: impl Future<Output = ()> + Send + 'static,
    mut shutdown_rx: watch::Receiver<bool>,
    grace: Duration,
) -> Result<(), std::io::Error> {
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(signal)
        .into_future();
    tokio::pin!(server);

    let signalled = async move { shutdown_rx.wait_for(|&stop| stop).await.is_ok() };
    tokio::select! {
        result = &mut server => return result,
        _ = signalled => {}
    }

    match tokio::time::timeout(grace, server).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(?grace, "Shutdown deadline reached, dropping open connections");
            Ok(())
        }
    }
}
