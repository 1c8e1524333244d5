//! The WebSocket transport against real `tokio-tungstenite` clients.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use rankwar_transport::{
        Connection, Transport, TransportError, WebSocketConnection, WebSocketTransport,
    };
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Accepts one browser-style client on a loopback port.
    async fn connected() -> (WebSocketConnection, Client) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let addr = transport.local_addr().unwrap();

        let accepted = tokio::spawn(async move { transport.accept().await });
        let (client, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        (accepted.await.unwrap().unwrap(), client)
    }

    #[tokio::test]
    async fn test_room_state_json_arrives_as_text() {
        let (conn, mut client) = connected().await;
        assert!(conn.peer_addr().ip().is_loopback());

        let payload = r#"{"event":"room_state","data":{"name":"A"}}"#;
        conn.send(payload.as_bytes()).await.unwrap();

        let frame = client.next().await.unwrap().unwrap();
        assert!(frame.is_text(), "got {frame:?}");
        assert_eq!(frame.into_text().unwrap().as_str(), payload);
    }

    #[tokio::test]
    async fn test_non_utf8_payload_falls_back_to_binary() {
        let (conn, mut client) = connected().await;

        conn.send(&[0xff, 0xfe, 0x00]).await.unwrap();

        let frame = client.next().await.unwrap().unwrap();
        assert!(frame.is_binary());
        assert_eq!(frame.into_data().as_ref(), &[0xff, 0xfe, 0x00]);
    }

    #[tokio::test]
    async fn test_inbound_text_and_binary_yield_bytes() {
        let (conn, mut client) = connected().await;

        client
            .send(Message::text(r#"{"event":"play_card"}"#))
            .await
            .unwrap();
        client
            .send(Message::binary(b"raw".to_vec()))
            .await
            .unwrap();

        assert_eq!(
            conn.recv().await.unwrap().unwrap(),
            br#"{"event":"play_card"}"#
        );
        assert_eq!(conn.recv().await.unwrap().unwrap(), b"raw");
    }

    #[tokio::test]
    async fn test_push_is_not_blocked_by_parked_reader() {
        let (conn, mut client) = connected().await;
        let conn = Arc::new(conn);

        let reader = tokio::spawn({
            let conn = Arc::clone(&conn);
            async move { conn.recv().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), conn.send(b"turn_timeout"))
            .await
            .expect("push waited on the reader")
            .unwrap();
        let pushed = client.next().await.unwrap().unwrap();
        assert_eq!(pushed.into_data().as_ref(), b"turn_timeout");

        client.send(Message::text("ack")).await.unwrap();
        assert_eq!(reader.await.unwrap().unwrap().unwrap(), b"ack");
    }

    #[tokio::test]
    async fn test_client_close_ends_the_stream() {
        let (conn, mut client) = connected().await;

        client.close(None).await.unwrap();

        assert_eq!(conn.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_silent_tcp_client_hits_handshake_timeout() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .unwrap()
            .with_handshake_timeout(Duration::from_millis(50));
        let addr = transport.local_addr().unwrap();

        let _silent = tokio::net::TcpStream::connect(addr).await.unwrap();

        let err = match transport.accept().await {
            Ok(_) => panic!("a client that never upgrades must not be accepted"),
            Err(e) => e,
        };
        assert!(matches!(err, TransportError::Handshake { .. }), "{err}");
        assert!(err.is_per_client());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let first = WebSocketTransport::bind("127.0.0.1:0").await.unwrap();
        let taken = first.local_addr().unwrap().to_string();

        let err = match WebSocketTransport::bind(&taken).await {
            Ok(_) => panic!("second bind on {taken} should fail"),
            Err(e) => e,
        };
        assert!(matches!(err, TransportError::Bind { .. }));
        assert!(!err.is_per_client());
    }
}
