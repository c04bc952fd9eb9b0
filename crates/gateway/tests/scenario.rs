//! End-to-end protocol tests against a live gateway on an ephemeral port.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    futures::{SinkExt, StreamExt},
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
};

use tably_gateway::{methods::MethodRegistry, server::build_gateway_app, state::GatewayState};

async fn spawn_gateway() -> SocketAddr {
    let state = GatewayState::new();
    let methods = Arc::new(MethodRegistry::new());
    let app = build_gateway_app(state, methods);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Test client that buffers frames, so acknowledgements and pushes can be
/// awaited in any order.
struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
    buffered: Vec<serde_json::Value>,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
        Self {
            ws,
            buffered: Vec::new(),
        }
    }

    async fn send(&mut self, frame: serde_json::Value) {
        self.ws
            .send(Message::Text(frame.to_string().into()))
            .await
            .unwrap();
    }

    async fn close(mut self) {
        self.ws.close(None).await.unwrap();
    }

    /// Return the first frame matching `pred`, buffering everything else.
    async fn wait_for(&mut self, pred: impl Fn(&serde_json::Value) -> bool) -> serde_json::Value {
        if let Some(pos) = self.buffered.iter().position(|f| pred(f)) {
            return self.buffered.remove(pos);
        }
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("timed out waiting for frame")
                .expect("connection closed")
                .unwrap();
            if let Message::Text(text) = msg {
                let frame: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
                if pred(&frame) {
                    return frame;
                }
                self.buffered.push(frame);
            }
        }
    }

    async fn wait_for_event(&mut self, event: &str) -> serde_json::Value {
        self.wait_for(|f| f["type"] == "event" && f["event"] == event)
            .await
    }

    async fn wait_for_ack(&mut self, id: &str) -> serde_json::Value {
        self.wait_for(|f| f["type"] == "res" && f["id"] == id).await
    }
}

#[tokio::test]
async fn full_table_session() {
    let addr = spawn_gateway().await;

    // A host joins (fire-and-forget) and immediately gets the empty list.
    let mut host = TestClient::connect(addr).await;
    host.send(serde_json::json!({"method": "host:join"})).await;
    let list = host.wait_for_event("players:list").await;
    assert!(list["payload"].as_array().unwrap().is_empty());

    // Alice joins from her own connection.
    let mut alice = TestClient::connect(addr).await;
    alice
        .send(serde_json::json!({"type": "req", "id": "1", "method": "player:join",
            "params": {"name": "Alice"}}))
        .await;
    let ack = alice.wait_for_ack("1").await;
    assert_eq!(ack["ok"], true);
    let player_id = ack["payload"]["playerId"].as_str().unwrap().to_string();

    let state = alice.wait_for_event("player:state").await;
    assert_eq!(state["payload"]["money"], 1500);
    assert_eq!(state["payload"]["trust"], 50);
    assert_eq!(state["payload"]["history"].as_array().unwrap().len(), 1);

    let list = host.wait_for_event("players:list").await;
    assert_eq!(list["payload"][0]["name"], "Alice");

    // Rent is due.
    host.send(serde_json::json!({"type": "req", "id": "2", "method": "host:adjust",
        "params": {"playerId": player_id, "moneyDelta": -200, "note": "rent"}}))
        .await;
    assert_eq!(host.wait_for_ack("2").await["ok"], true);
    let list = host.wait_for_event("players:list").await;
    assert_eq!(list["payload"][0]["money"], 1300);
    let state = alice.wait_for_event("player:state").await;
    assert_eq!(state["payload"]["money"], 1300);
    assert_eq!(state["payload"]["history"].as_array().unwrap().len(), 2);

    // Trust clamps at zero.
    host.send(serde_json::json!({"type": "req", "id": "3", "method": "host:adjust",
        "params": {"playerId": player_id, "trustDelta": -60}}))
        .await;
    assert_eq!(host.wait_for_ack("3").await["ok"], true);
    let state = alice.wait_for_event("player:state").await;
    assert_eq!(state["payload"]["trust"], 0);

    // Alice is removed; only the hosts hear about it.
    host.send(serde_json::json!({"type": "req", "id": "4", "method": "host:removePlayer",
        "params": {"playerId": player_id}}))
        .await;
    assert_eq!(host.wait_for_ack("4").await["ok"], true);
    let list = host.wait_for_event("players:list").await;
    assert!(list["payload"].as_array().unwrap().is_empty());

    // Binding the removed id fails.
    alice
        .send(serde_json::json!({"type": "req", "id": "5", "method": "player:bind",
            "params": {"playerId": player_id}}))
        .await;
    let ack = alice.wait_for_ack("5").await;
    assert_eq!(ack["ok"], false);
    assert_eq!(ack["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn reconnect_preserves_entity_and_history() {
    let addr = spawn_gateway().await;
    let mut host = TestClient::connect(addr).await;
    host.send(serde_json::json!({"method": "host:join"})).await;

    let mut bob = TestClient::connect(addr).await;
    bob.send(serde_json::json!({"type": "req", "id": "1", "method": "player:join",
        "params": {"name": "Bob"}}))
        .await;
    let player_id = bob.wait_for_ack("1").await["payload"]["playerId"]
        .as_str()
        .unwrap()
        .to_string();

    host.send(serde_json::json!({"type": "req", "id": "2", "method": "host:adjust",
        "params": {"playerId": player_id, "moneyDelta": -100, "note": "fine"}}))
        .await;
    assert_eq!(host.wait_for_ack("2").await["ok"], true);

    // Bob's only connection drops; the entity must survive.
    bob.close().await;

    let mut bob2 = TestClient::connect(addr).await;
    bob2.send(serde_json::json!({"type": "req", "id": "3", "method": "player:bind",
        "params": {"playerId": player_id}}))
        .await;
    assert_eq!(bob2.wait_for_ack("3").await["ok"], true);
    let state = bob2.wait_for_event("player:state").await;
    assert_eq!(state["payload"]["money"], 1400);
    let history = state["payload"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1]["note"], "money -100 (fine)");
}

#[tokio::test]
async fn malformed_and_unknown_frames_do_not_kill_the_connection() {
    let addr = spawn_gateway().await;
    let mut ws = TestClient::connect(addr).await;

    ws.ws
        .send(Message::Text("not json".into()))
        .await
        .unwrap();
    ws.send(serde_json::json!({"type": "req", "id": "1", "method": "no:such"}))
        .await;
    let ack = ws.wait_for_ack("1").await;
    assert_eq!(ack["ok"], false);
    assert_eq!(ack["error"]["code"], "INVALID_REQUEST");

    // Still usable afterwards.
    ws.send(serde_json::json!({"type": "req", "id": "2", "method": "health"}))
        .await;
    assert_eq!(ws.wait_for_ack("2").await["ok"], true);
}
