//! Skips network-backed tests in sandboxes that forbid binding sockets.

use std::net::TcpListener;

use wiremock::MockServer;

/// Starts a mock server, or returns `None` when loopback sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if TcpListener::bind("127.0.0.1:0").is_err() {
        eprintln!("skipping: cannot bind a loopback socket in this environment");
        return None;
    }
    Some(MockServer::start().await)
}

/// Value returned by a test that was skipped for lack of sockets.
pub fn socket_skip_return() {}
