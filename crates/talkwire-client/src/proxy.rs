//! HTTP CONNECT tunneling for proxied WebSocket connections.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::client_async_tls;
use url::Url;

use crate::errors::ClientError;
use crate::transport::WsStream;

/// Upper bound on the proxy's CONNECT response header.
const MAX_RESPONSE_HEADER: usize = 4096;

/// Open a tunnel through `proxy_url` and run the WebSocket (and TLS, for
/// `wss` endpoints) handshake through it.
pub(crate) async fn connect_via_proxy(
    endpoint: &Url,
    proxy_url: &str,
) -> Result<WsStream, ClientError> {
    let proxy = Url::parse(proxy_url).map_err(|e| ClientError::Proxy {
        context: format!("{proxy_url}: {e}"),
    })?;
    if proxy.scheme() != "http" && proxy.scheme() != "https" {
        return Err(ClientError::Proxy {
            context: format!("unsupported scheme {}", proxy.scheme()),
        });
    }
    let proxy_host = proxy.host_str().ok_or_else(|| ClientError::Proxy {
        context: format!("{proxy_url}: missing host"),
    })?;
    let proxy_port = proxy.port_or_known_default().unwrap_or(8080);

    let target_host = endpoint.host_str().ok_or_else(|| ClientError::Connect {
        context: format!("endpoint {endpoint} has no host"),
    })?;
    let target_port = endpoint
        .port()
        .unwrap_or(if endpoint.scheme() == "wss" { 443 } else { 80 });

    let mut stream = TcpStream::connect((proxy_host, proxy_port))
        .await
        .map_err(|e| ClientError::Connect {
            context: format!("proxy dial {proxy_host}:{proxy_port}: {e}"),
        })?;

    let request = format!(
        "CONNECT {target_host}:{target_port} HTTP/1.1\r\n\
         Host: {target_host}:{target_port}\r\n\
         Proxy-Connection: Keep-Alive\r\n\r\n"
    );
    stream
        .write_all(request.as_bytes())
        .await
        .map_err(|e| ClientError::Connect {
            context: format!("proxy CONNECT write: {e}"),
        })?;

    let header = read_response_header(&mut stream).await?;
    let status_line = header.lines().next().unwrap_or_default();
    if !status_line.contains(" 200") {
        return Err(ClientError::Connect {
            context: format!("proxy refused CONNECT: {status_line}"),
        });
    }

    let (ws, _response) = client_async_tls(endpoint.as_str(), stream)
        .await
        .map_err(|e| ClientError::Connect {
            context: format!("websocket handshake through proxy: {e}"),
        })?;
    Ok(ws)
}

/// Read the proxy response up to the blank line terminating the header.
async fn read_response_header(stream: &mut TcpStream) -> Result<String, ClientError> {
    let mut header = Vec::new();
    let mut byte = [0u8; 1];
    while !header.ends_with(b"\r\n\r\n") {
        if header.len() >= MAX_RESPONSE_HEADER {
            return Err(ClientError::Connect {
                context: "proxy response header too large".to_owned(),
            });
        }
        let n = stream.read(&mut byte).await.map_err(|e| ClientError::Connect {
            context: format!("proxy CONNECT read: {e}"),
        })?;
        if n == 0 {
            return Err(ClientError::Connect {
                context: "proxy closed the connection during CONNECT".to_owned(),
            });
        }
        header.push(byte[0]);
    }
    Ok(String::from_utf8_lossy(&header).into_owned())
}
