//! A tiny local HTTP origin, standing in for a passive test origin that
//! only ever responds, never initiates requests. Built with `axum`. Only
//! ever started by tests.

use axum::Router;
use axum::extract::Path;
use axum::routing::get;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub struct TestOrigin {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestOrigin {
    /// Starts a server on an ephemeral local port that answers `GET /<code>`
    /// with status `<code>` and an empty body.
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("can bind ephemeral port");
        let addr = listener.local_addr().expect("listener has a local addr");

        let app = Router::new().route("/{status}", get(respond_with_status));
        let handle = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .await
                .expect("test origin crashed");
        });

        Self { addr, handle }
    }

    pub fn base_uri(&self, status: u16) -> String {
        format!("http://{}/{}", self.addr, status)
    }
}

impl Drop for TestOrigin {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn respond_with_status(Path(status): Path<u16>) -> axum::http::StatusCode {
    axum::http::StatusCode::from_u16(status).unwrap_or(axum::http::StatusCode::OK)
}
