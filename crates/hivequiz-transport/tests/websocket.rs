//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use hivequiz_transport::{Connection, Transport, WebSocketConnection, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds a transport, connects one client, and returns both ends.
    async fn connected_pair() -> (WebSocketTransport, WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have an address");

        let url = format!("ws://{addr}");
        let client = tokio::spawn(async move {
            let (ws, _) = tokio_tungstenite::connect_async(&url)
                .await
                .expect("client should connect");
            ws
        });

        let conn = transport.accept().await.expect("should accept");
        let client = client.await.expect("client task should complete");
        (transport, conn, client)
    }

    #[tokio::test]
    async fn test_local_addr_reports_assigned_port() {
        let transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_utf8_is_sent_as_text_frame() {
        let (_transport, conn, mut client) = connected_pair().await;

        conn.send(br#"{"event":"welcome","data":{"playerId":1}}"#)
            .await
            .expect("send should succeed");

        let msg = client.next().await.unwrap().unwrap();
        let Message::Text(text) = msg else {
            panic!("expected a text frame, got {msg:?}");
        };
        assert!(text.as_str().contains("welcome"));
    }

    #[tokio::test]
    async fn test_non_utf8_is_sent_as_binary_frame() {
        let (_transport, conn, mut client) = connected_pair().await;

        conn.send(&[0xff, 0xfe, 0x00]).await.unwrap();

        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_binary());
        assert_eq!(msg.into_data().as_ref(), &[0xff, 0xfe, 0x00]);
    }

    #[tokio::test]
    async fn test_receives_text_and_binary() {
        let (_transport, conn, mut client) = connected_pair().await;

        client.send(Message::text("hello".to_string())).await.unwrap();
        client
            .send(Message::binary(b"bytes".to_vec()))
            .await
            .unwrap();

        assert_eq!(conn.recv().await.unwrap(), Some(b"hello".to_vec()));
        assert_eq!(conn.recv().await.unwrap(), Some(b"bytes".to_vec()));
    }

    #[tokio::test]
    async fn test_client_close_yields_none() {
        let (_transport, conn, mut client) = connected_pair().await;

        client.close(None).await.unwrap();

        assert_eq!(conn.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_send_while_recv_is_pending() {
        let (_transport, conn, mut client) = connected_pair().await;
        let conn = Arc::new(conn);

        // Park a reader on the connection before anything arrives.
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Sending must not wait for the reader.
        tokio::time::timeout(Duration::from_secs(1), conn.send(b"broadcast"))
            .await
            .expect("send should not block on a pending recv")
            .unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "broadcast");

        client.send(Message::text("answer".to_string())).await.unwrap();
        let received = reader.await.unwrap().unwrap();
        assert_eq!(received, Some(b"answer".to_vec()));
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", transport.local_addr().unwrap());

        let clients = tokio::spawn(async move {
            let a = tokio_tungstenite::connect_async(&url).await.unwrap().0;
            let b = tokio_tungstenite::connect_async(&url).await.unwrap().0;
            (a, b)
        });

        let first = transport.accept().await.unwrap();
        let second = transport.accept().await.unwrap();
        let _clients = clients.await.unwrap();

        assert_ne!(first.id(), second.id());
        assert!(first.id().into_inner() > 0);
    }

    #[tokio::test]
    async fn test_server_close_ends_client_stream() {
        let (_transport, conn, mut client) = connected_pair().await;

        conn.close().await.unwrap();

        // A close frame, then end of stream.
        match client.next().await {
            Some(Ok(Message::Close(_))) | None => {}
            other => panic!("expected close, got {other:?}"),
        }
    }
}
