//! # Connectivity Probe over HTTP
//!
//! Drives `GatewayClient::connection_status` against a real socket.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use receptor_gateway::{GatewayClient, GatewayConfig};
    use serde_json::json;
    use shared_bus::InMemoryEventBus;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client_for(host: String) -> GatewayClient {
        let mut config = GatewayConfig::default();
        config.controller.host = host;
        GatewayClient::with_event_bus(config, Arc::new(InMemoryEventBus::new())).unwrap()
    }

    /// Accept one connection, read the request head and reply.
    async fn controller_replying(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            // Request body is small; the head plus body arrive well within the buffer.
            while !String::from_utf8_lossy(&buf[..read]).contains("\"node_id\"") {
                let n = socket.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        host
    }

    #[tokio::test]
    async fn test_connected_node() {
        let host = controller_replying("200 OK", r#"{"status":"connected"}"#).await;
        let client = client_for(host);

        let status = client.connection_status("0001", "node-a").await;
        assert!(status.is_connected());
        assert_eq!(status.raw(), &json!({"status": "connected"}));
    }

    #[tokio::test]
    async fn test_controller_error_falls_back() {
        let host = controller_replying("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let client = client_for(host);

        let status = client.connection_status("0001", "node-a").await;
        assert_eq!(status.into_raw(), json!({"status": "disconnected"}));
    }

    #[tokio::test]
    async fn test_unreachable_controller_falls_back() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = client_for(host);
        let status = client.connection_status("0001", "node-a").await;
        assert_eq!(status.into_raw(), json!({"status": "disconnected"}));
    }
}
