//! End-to-end test over real WebSockets.
//!
//! Binds the axum front end on an ephemeral port, connects one peer through
//! [`Client`] and one through raw tokio-tungstenite, and checks routing,
//! presence and disconnect handling.

use futures::{SinkExt, StreamExt};
use msghub_hub::presence::{DISCONNECTED, WHOAMI};
use msghub_hub::{server, Client, ClientConfig, EchoService, Hub, Message, PresenceHooks};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;

async fn next_msg(rx: &mut mpsc::UnboundedReceiver<Message>) -> Message {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for a message")
        .expect("client callback dropped")
}

#[tokio::test]
async fn test_websocket_relay() {
    let (hub, _executor) = Hub::<()>::builder()
        .hooks(PresenceHooks)
        .service("@echo", EchoService)
        .spawn();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, hub.clone()));

    // Peer A through the client-side peer.
    let (tx, mut inbox) = mpsc::unbounded_channel();
    let client = Client::new(ClientConfig {
        url: format!("ws://{addr}"),
        ..Default::default()
    })
    .on_message(move |msg| {
        let _ = tx.send(msg);
    });
    {
        let client = client.clone();
        tokio::spawn(async move { client.dial().await });
    }
    let hello = next_msg(&mut inbox).await;
    assert_eq!(hello.from, WHOAMI);
    let a_id = hello.data[0].clone();

    // Peer B through a raw socket.
    let (mut b, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    let b_hello = match b.next().await.unwrap().unwrap() {
        WsMessage::Text(text) => text,
        other => panic!("unexpected frame: {other:?}"),
    };
    let b_id = b_hello
        .strip_prefix("@whoami\u{1F}")
        .expect("whoami frame")
        .to_string();
    assert_ne!(a_id, b_id);

    // A -> B: B sees A's id in front of the payload.
    client
        .send(Message::new("", b_id.as_str(), ["x", "y"]))
        .await
        .unwrap();
    match b.next().await.unwrap().unwrap() {
        WsMessage::Text(text) => assert_eq!(text, format!("{a_id}\u{1F}x\u{1F}y")),
        other => panic!("unexpected frame: {other:?}"),
    }

    // B -> A.
    b.send(WsMessage::Text(format!("{a_id}\u{1F}pong")))
        .await
        .unwrap();
    let pong = next_msg(&mut inbox).await;
    assert_eq!(pong, Message::new(b_id.as_str(), "", ["pong"]));

    // A -> @echo -> A.
    client.send(Message::new("", "@echo", ["hi"])).await.unwrap();
    let echoed = next_msg(&mut inbox).await;
    assert_eq!(echoed, Message::new("@echo", "", ["hi"]));

    // B hangs up: A hears about it.
    b.close(None).await.unwrap();
    drop(b);
    let bye = next_msg(&mut inbox).await;
    assert_eq!(bye.from, DISCONNECTED);
    assert_eq!(bye.data, vec![b_id]);
}
