//! Shared utilities for integration testing.

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, Method, StatusCode, Uri},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use webdriver_proxy::{HttpServer, ProxyConfig, SessionRegistry, Shutdown};

/// Start an upstream that answers every connection with a response head after
/// `head_delay`, sends part of the body, and then never finishes it.
#[allow(dead_code)]
pub async fn start_stalling_upstream(head_delay: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf).await;
                tokio::time::sleep(head_delay).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 64\r\n\r\n{\"value\":")
                    .await;
                tokio::time::sleep(Duration::from_secs(30)).await;
            });
        }
    });
    addr
}

/// Start a programmable mock upstream. The closure gets method, path and body.
pub async fn start_programmable_upstream<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(Method, String, String) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = Router::new().fallback(move |method: Method, uri: Uri, body: Bytes| {
        let f = f.clone();
        async move {
            let body = String::from_utf8_lossy(&body).into_owned();
            let (status, body) = f(method, uri.path().to_string(), body).await;
            (
                StatusCode::from_u16(status).unwrap(),
                [(CONTENT_TYPE, "application/json; charset=utf-8")],
                body,
            )
        }
    });

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A minimal automation server: creates sessions, fails element lookups.
#[allow(dead_code)]
pub async fn start_webdriver_upstream() -> SocketAddr {
    start_programmable_upstream(|method: Method, path: String, body: String| async move {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match (method, segments.as_slice()) {
            (Method::POST, [.., "session"]) => {
                let request: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
                let browser = request["capabilities"]["alwaysMatch"]["browserName"]
                    .as_str()
                    .unwrap_or("chrome")
                    .to_string();
                let id = uuid::Uuid::new_v4().simple().to_string();
                let response = serde_json::json!({
                    "value": {
                        "sessionId": id,
                        "capabilities": { "browserName": browser, "browserVersion": "120.0" }
                    }
                });
                (200, response.to_string())
            }
            (Method::POST, [.., "element"]) => (
                404,
                r#"{"value":{"error":"no such element","message":"Unable to locate element","stacktrace":""}}"#
                    .to_string(),
            ),
            (Method::DELETE, [.., "session", _]) => (200, r#"{"value":null}"#.to_string()),
            _ => (200, r#"{"value":null}"#.to_string()),
        }
    })
    .await
}

/// Start the proxy in front of `upstream` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_proxy(
    upstream: SocketAddr,
    tweak: impl FnOnce(&mut ProxyConfig),
) -> (SocketAddr, SessionRegistry, Shutdown) {
    let mut config = ProxyConfig::default();
    config.upstream.url = format!("http://{upstream}");
    tweak(&mut config);

    let server = HttpServer::new(config).unwrap();
    let sessions = server.sessions();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, sessions, shutdown)
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub const CREATE_CHROME: &str =
    r#"{"capabilities":{"alwaysMatch":{"browserName":"chrome"}}}"#;
