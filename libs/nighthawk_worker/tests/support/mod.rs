//! The same tiny local HTTP origin `nighthawk_client`'s integration tests
//! use, duplicated here rather than shared across crates so each crate's
//! test-only dependency on `axum` stays local to that crate.

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

    pub fn uri(&self, status: u16) -> String {
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

/// A `TestOrigin` on its own dedicated thread and runtime, for tests that
/// call `Orchestrator::run` directly: that call builds its own per-worker
/// runtimes and panics if nested inside one already driving the test.
pub struct BackgroundOrigin {
    pub addr: SocketAddr,
    _thread: std::thread::JoinHandle<()>,
}

impl BackgroundOrigin {
    pub fn start() -> Self {
        let (addr_tx, addr_rx) = std::sync::mpsc::channel();
        let thread = std::thread::Builder::new()
            .name("test-origin".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("can build the test origin's runtime");
                runtime.block_on(async {
                    let origin = TestOrigin::start().await;
                    addr_tx.send(origin.addr).expect("test thread is alive");
                    std::future::pending::<()>().await;
                });
            })
            .expect("can spawn the test origin thread");

        let addr = addr_rx.recv().expect("test origin reports its address");
        Self {
            addr,
            _thread: thread,
        }
    }

    pub fn uri(&self, status: u16) -> String {
        format!("http://{}/{}", self.addr, status)
    }
}
