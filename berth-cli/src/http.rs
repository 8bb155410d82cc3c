//! Minimal HTTP/1 client over TCP for probing a running gateway.

use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use crate::error::CliError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Status and headers of a probe response. The body is drained and dropped.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// Send a bodyless request to `host:port` and return the response head.
///
/// # Errors
/// Returns [`CliError::Http`] on connection, protocol, or timeout errors.
/// Non-2xx statuses are returned, not treated as errors.
pub async fn probe(
    host: &str,
    port: u16,
    method: Method,
    uri_path: &str,
    headers: &[(&str, &str)],
) -> Result<ProbeResponse, CliError> {
    tokio::time::timeout(REQUEST_TIMEOUT, send(host, port, method, uri_path, headers))
        .await
        .map_err(|_| CliError::Http(format!("{host}:{port} timed out after {REQUEST_TIMEOUT:?}")))?
}

async fn send(
    host: &str,
    port: u16,
    method: Method,
    uri_path: &str,
    headers: &[(&str, &str)],
) -> Result<ProbeResponse, CliError> {
    let stream = TcpStream::connect((host, port))
        .await
        .map_err(|e| CliError::Http(format!("connect to {host}:{port}: {e}")))?;

    let io = TokioIo::new(stream);

    let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| CliError::Http(format!("HTTP handshake: {e}")))?;

    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!("probe connection closed: {e}");
        }
    });

    let uri: Uri = uri_path
        .parse()
        .map_err(|e| CliError::Http(format!("invalid URI path {uri_path}: {e}")))?;

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Host", format!("{host}:{port}"));
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let req = builder
        .body(Full::new(Bytes::new()))
        .map_err(|e| CliError::Http(format!("build request: {e}")))?;

    let resp: Response<_> = sender
        .send_request(req)
        .await
        .map_err(|e| CliError::Http(format!("send request: {e}")))?;

    let status = resp.status();
    let headers = resp.headers().clone();
    resp.into_body()
        .collect()
        .await
        .map_err(|e| CliError::Http(format!("read response body: {e}")))?;

    Ok(ProbeResponse { status, headers })
}

#[cfg(test)]
pub(crate) mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;

    /// Serve one canned response on an ephemeral loopback port.
    pub(crate) async fn serve_once(response: &'static str) -> u16 {
        let listener = match TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) => panic!("bind: {e}"),
        };
        let port = match listener.local_addr() {
            Ok(a) => a.port(),
            Err(e) => panic!("local_addr: {e}"),
        };
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = vec![0u8; 4096];
                let mut read = 0;
                while let Ok(n) = socket.read(&mut buf[read..]).await {
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        port
    }

    #[tokio::test]
    async fn probe_returns_status_and_headers() {
        let port = serve_once(
            "HTTP/1.1 204 No Content\r\nAccess-Control-Allow-Origin: *\r\nContent-Length: 0\r\n\r\n",
        )
        .await;

        let resp = match probe("127.0.0.1", port, Method::OPTIONS, "/rest/v1/", &[("Origin", "http://example.com")]).await
        {
            Ok(r) => r,
            Err(e) => panic!("probe: {e}"),
        };
        assert_eq!(resp.status, StatusCode::NO_CONTENT);
        assert_eq!(
            resp.headers.get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn probe_non_success_status_is_not_an_error() {
        let port = serve_once("HTTP/1.1 401 Unauthorized\r\nContent-Length: 2\r\n\r\nno").await;
        let resp = match probe("127.0.0.1", port, Method::GET, "/", &[]).await {
            Ok(r) => r,
            Err(e) => panic!("probe: {e}"),
        };
        assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn probe_refused_connection_is_http_error() {
        let port = {
            let listener = match std::net::TcpListener::bind("127.0.0.1:0") {
                Ok(l) => l,
                Err(e) => panic!("bind: {e}"),
            };
            match listener.local_addr() {
                Ok(a) => a.port(),
                Err(e) => panic!("local_addr: {e}"),
            }
        };
        let result = probe("127.0.0.1", port, Method::GET, "/", &[]).await;
        assert!(matches!(result, Err(CliError::Http(_))));
    }
}
