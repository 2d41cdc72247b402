//! Liveness endpoint for uptime monitors.
//!
//! Answers every request, whatever the method or path, with `200 OK` and the
//! current readiness status line. The request itself is only drained, never parsed.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info};

use crate::readiness::Readiness;

/// Upper bound on how much of a request head we read before answering.
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// How long a client gets to send its request head.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Cap on discarding leftover request bytes after answering.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);
const MAX_DRAIN: usize = 1024 * 1024;

/// Bind the liveness port on all interfaces.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
    info!("🌐 Health endpoint listening on port {}", port);
    Ok(listener)
}

/// Serve liveness requests forever.
pub async fn serve(listener: TcpListener, readiness: Readiness) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let readiness = readiness.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, &readiness).await {
                        debug!("Health connection error: {e}");
                    }
                });
            }
            Err(e) => {
                debug!("Health accept error: {e}");
                // Avoid spinning when out of file descriptors
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

async fn handle_connection(mut stream: TcpStream, readiness: &Readiness) -> std::io::Result<()> {
    let head = tokio::time::timeout(READ_TIMEOUT, read_request_head(&mut stream))
        .await
        .unwrap_or_default();
    let is_head = head.starts_with(b"HEAD ");
    stream.write_all(&response(is_head, readiness)).await?;
    stream.shutdown().await?;
    // Unread request bytes at close make the kernel send RST, which can
    // destroy the response before the client reads it
    let _ = tokio::time::timeout(DRAIN_TIMEOUT, drain(&mut stream)).await;
    Ok(())
}

/// Discard whatever the client still sends until it closes its side.
async fn drain(stream: &mut TcpStream) {
    let mut buf = [0u8; 4096];
    let mut total = 0;
    while total < MAX_DRAIN {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => total += n,
        }
    }
}

/// Read until the end of the request head, EOF, or the size cap.
async fn read_request_head(stream: &mut TcpStream) -> Vec<u8> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while head.len() < MAX_REQUEST_HEAD {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                head.extend_from_slice(&buf[..n]);
                if head.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }
    head
}

/// Build the raw HTTP response for the current readiness.
pub fn response(is_head: bool, readiness: &Readiness) -> Vec<u8> {
    let body = readiness.status_line();
    let mut out = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n",
        body.len()
    )
    .into_bytes();
    if !is_head {
        out.extend_from_slice(body.as_bytes());
    }
    out
}
