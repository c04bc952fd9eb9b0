use std::{net::SocketAddr, sync::Arc, time::Instant};

use {
    axum::extract::ws::{Message, WebSocket},
    futures::{SinkExt, StreamExt},
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use tably_protocol::RequestFrame;

use crate::{
    methods::{MethodContext, MethodRegistry},
    state::{ConnectedClient, GatewayState},
};

/// Drive one WebSocket connection: register the client, pump outbound
/// frames from its channel, dispatch inbound requests, and clean up
/// group membership on disconnect. Player entities are never removed
/// here — a lost connection only affects membership.
pub async fn handle_connection(
    socket: WebSocket,
    state: Arc<GatewayState>,
    methods: Arc<MethodRegistry>,
    addr: SocketAddr,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    state
        .register_client(ConnectedClient {
            conn_id: conn_id.clone(),
            sender: tx,
            remote_ip: Some(addr.ip().to_string()),
            connected_at: Instant::now(),
        })
        .await;
    info!(conn_id = %conn_id, remote = %addr, "client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Write loop: everything queued for this client goes out in order.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Read loop: run each request to completion before the next.
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_frame(&state, &methods, &conn_id, text.as_str()).await;
            },
            Ok(Message::Binary(_)) => {
                debug!(conn_id = %conn_id, "ignoring binary frame");
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}, // ping/pong handled by axum
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "websocket error");
                break;
            },
        }
    }

    send_task.abort();

    // Membership cleanup only; entity state is untouched.
    state.groups.write().await.drop_conn(&conn_id);
    state.remove_client(&conn_id).await;
    info!(conn_id = %conn_id, "client disconnected");
}

async fn handle_frame(
    state: &Arc<GatewayState>,
    methods: &Arc<MethodRegistry>,
    conn_id: &str,
    text: &str,
) {
    let frame: RequestFrame = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(conn_id = %conn_id, error = %e, "unparseable frame");
            return;
        },
    };

    let request_id = frame.id.clone();
    let response = methods
        .dispatch(MethodContext {
            request_id: request_id.clone().unwrap_or_default(),
            method: frame.method,
            params: frame.params,
            client_conn_id: conn_id.to_string(),
            state: Arc::clone(state),
        })
        .await;

    // Requests without an id are fire-and-forget: no acknowledgement.
    if request_id.is_none() {
        return;
    }
    match serde_json::to_string(&response) {
        Ok(text) => {
            let clients = state.clients.read().await;
            if let Some(client) = clients.get(conn_id) {
                client.send(&text);
            }
        },
        Err(e) => warn!(conn_id = %conn_id, error = %e, "failed to serialize response"),
    }
}
