use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use tracing::{debug, warn};

use {
    tably_protocol::{ErrorShape, ResponseFrame, error_codes, events},
    tably_registry::RegistryError,
};

use crate::{
    broadcast::{host_summary, player_detail, push_to_channel, push_to_conn, push_to_hosts},
    state::GatewayState,
};

// ── Types ────────────────────────────────────────────────────────────────────

/// Context passed to every method handler.
pub struct MethodContext {
    pub request_id: String,
    pub method: String,
    pub params: serde_json::Value,
    pub client_conn_id: String,
    pub state: Arc<GatewayState>,
}

/// The result a method handler produces.
pub type MethodResult = Result<serde_json::Value, ErrorShape>;

/// A boxed async method handler.
pub type HandlerFn =
    Box<dyn Fn(MethodContext) -> Pin<Box<dyn Future<Output = MethodResult> + Send>> + Send + Sync>;

fn registry_error(err: RegistryError) -> ErrorShape {
    match err {
        RegistryError::EmptyName => {
            ErrorShape::new(error_codes::VALIDATION_FAILED, err.to_string())
        },
        RegistryError::NotFound(_) => ErrorShape::not_found(err.to_string()),
    }
}

fn required_str(params: &serde_json::Value, key: &str) -> Result<String, ErrorShape> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ErrorShape::invalid_request(format!("missing {key}")))
}

// ── Method registry ──────────────────────────────────────────────────────────

pub struct MethodRegistry {
    handlers: HashMap<String, HandlerFn>,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            handlers: HashMap::new(),
        };
        reg.register_defaults();
        reg
    }

    pub fn register(&mut self, method: impl Into<String>, handler: HandlerFn) {
        self.handlers.insert(method.into(), handler);
    }

    /// Dispatch one request. Every failure is reported through the
    /// returned acknowledgement frame; nothing propagates past here and
    /// no retries are attempted.
    pub async fn dispatch(&self, ctx: MethodContext) -> ResponseFrame {
        let method = ctx.method.clone();
        let request_id = ctx.request_id.clone();
        let conn_id = ctx.client_conn_id.clone();

        let Some(handler) = self.handlers.get(&method) else {
            warn!(method, conn_id = %conn_id, "unknown method");
            return ResponseFrame::err(
                &request_id,
                ErrorShape::invalid_request(format!("unknown method: {method}")),
            );
        };

        debug!(method, request_id = %request_id, conn_id = %conn_id, "dispatching method");
        match handler(ctx).await {
            Ok(payload) => {
                debug!(method, request_id = %request_id, "method ok");
                ResponseFrame::ok(&request_id, payload)
            },
            Err(err) => {
                warn!(method, request_id = %request_id, code = %err.code, msg = %err.message, "method error");
                ResponseFrame::err(&request_id, err)
            },
        }
    }

    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    fn register_defaults(&mut self) {
        self.register_gateway_methods();
        self.register_player_methods();
        self.register_host_methods();
    }

    // ── Gateway-internal methods ─────────────────────────────────────────

    fn register_gateway_methods(&mut self) {
        // health
        self.register(
            "health",
            Box::new(|ctx| {
                Box::pin(async move {
                    let count = ctx.state.client_count().await;
                    Ok(serde_json::json!({
                        "status": "ok",
                        "version": ctx.state.version,
                        "protocol": tably_protocol::PROTOCOL_VERSION,
                        "connections": count,
                    }))
                })
            }),
        );

        // status: counts plus per-connection presence
        self.register(
            "status",
            Box::new(|ctx| {
                Box::pin(async move {
                    let players = ctx.state.players.read().await.len();
                    let groups = ctx.state.groups.read().await;
                    let clients = ctx.state.clients.read().await;

                    let connections: Vec<_> = clients
                        .values()
                        .map(|c| {
                            serde_json::json!({
                                "connId": c.conn_id,
                                "remoteIp": c.remote_ip,
                                "connectedAtSecs": c.connected_at.elapsed().as_secs(),
                                "host": groups.is_host(&c.conn_id),
                            })
                        })
                        .collect();

                    Ok(serde_json::json!({
                        "version": ctx.state.version,
                        "hostname": ctx.state.hostname,
                        "hosts": groups.host_count(),
                        "players": players,
                        "connections": connections,
                    }))
                })
            }),
        );
    }

    // ── Player methods ───────────────────────────────────────────────────

    fn register_player_methods(&mut self) {
        // player:join — create the entity and enter its channel.
        self.register(
            "player:join",
            Box::new(|ctx| {
                Box::pin(async move {
                    let name = required_str(&ctx.params, "name")?;

                    let (player_id, channel, detail, summary) = {
                        let mut players = ctx.state.players.write().await;
                        let player = players.create(&name).map_err(registry_error)?;
                        let player_id = player.id.clone();
                        let channel = player.channel.clone();
                        let detail = player_detail(player);
                        ctx.state
                            .groups
                            .write()
                            .await
                            .join_channel(&ctx.client_conn_id, &channel);
                        (player_id, channel, detail, host_summary(&players))
                    };

                    push_to_channel(&ctx.state, &channel, detail).await;
                    push_to_hosts(&ctx.state, summary).await;
                    Ok(serde_json::json!({ "playerId": player_id }))
                })
            }),
        );

        // player:bind — rejoin an existing player's channel (reconnect or
        // second viewer). Read-only over the registry.
        self.register(
            "player:bind",
            Box::new(|ctx| {
                Box::pin(async move {
                    let player_id = required_str(&ctx.params, "playerId")?;

                    let (channel, detail) = {
                        let players = ctx.state.players.read().await;
                        let player = players
                            .get(&player_id)
                            .ok_or_else(|| registry_error(RegistryError::NotFound(player_id.clone())))?;
                        let channel = player.channel.clone();
                        let detail = player_detail(player);
                        ctx.state
                            .groups
                            .write()
                            .await
                            .join_channel(&ctx.client_conn_id, &channel);
                        (channel, detail)
                    };

                    push_to_channel(&ctx.state, &channel, detail).await;
                    Ok(serde_json::json!({}))
                })
            }),
        );
    }

    // ── Host methods ─────────────────────────────────────────────────────
    //
    // Any connection issuing host:join is trusted as a host; there is no
    // credential check on this boundary.

    fn register_host_methods(&mut self) {
        // host:join — enter the hosts group and receive the current
        // summary immediately. Sent without a request id, so no ack.
        self.register(
            "host:join",
            Box::new(|ctx| {
                Box::pin(async move {
                    ctx.state
                        .groups
                        .write()
                        .await
                        .join_hosts(&ctx.client_conn_id);
                    let summary = host_summary(&*ctx.state.players.read().await);
                    push_to_conn(
                        &ctx.state,
                        &ctx.client_conn_id,
                        events::PLAYERS_LIST,
                        summary,
                    )
                    .await;
                    Ok(serde_json::json!({}))
                })
            }),
        );

        // host:adjust — apply money/trust deltas to one player.
        self.register(
            "host:adjust",
            Box::new(|ctx| {
                Box::pin(async move {
                    let player_id = required_str(&ctx.params, "playerId")?;
                    let money_delta = ctx
                        .params
                        .get("moneyDelta")
                        .and_then(|v| v.as_i64())
                        .unwrap_or(0);
                    let trust_delta = ctx
                        .params
                        .get("trustDelta")
                        .and_then(|v| v.as_i64())
                        .unwrap_or(0);
                    let note = ctx
                        .params
                        .get("note")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string());

                    // Both views come from the same post-mutation snapshot:
                    // the write lock spans mutate and rendering.
                    let (channel, detail, summary) = {
                        let mut players = ctx.state.players.write().await;
                        let player = players
                            .mutate(&player_id, money_delta, trust_delta, note.as_deref())
                            .map_err(registry_error)?;
                        let channel = player.channel.clone();
                        let detail = player_detail(player);
                        (channel, detail, host_summary(&players))
                    };

                    push_to_channel(&ctx.state, &channel, detail).await;
                    push_to_hosts(&ctx.state, summary).await;
                    Ok(serde_json::json!({}))
                })
            }),
        );

        // host:removePlayer — delete the entity and evict its channel.
        // The channel is gone, so only the hosts summary goes out.
        self.register(
            "host:removePlayer",
            Box::new(|ctx| {
                Box::pin(async move {
                    let player_id = required_str(&ctx.params, "playerId")?;

                    let summary = {
                        let mut players = ctx.state.players.write().await;
                        let removed = players
                            .remove(&player_id)
                            .ok_or_else(|| registry_error(RegistryError::NotFound(player_id.clone())))?;
                        let evicted = ctx
                            .state
                            .groups
                            .write()
                            .await
                            .evict_channel(&removed.channel);
                        debug!(player_id, evicted, "player removed, channel evicted");
                        host_summary(&players)
                    };

                    push_to_hosts(&ctx.state, summary).await;
                    Ok(serde_json::json!({}))
                })
            }),
        );
    }
}
