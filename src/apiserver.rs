use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, watch};
use uuid::Uuid;

use crate::{
    BridgeHandle,
    actions::{ActionDefinition, ActionId, action_definitions},
    config::BridgeConfig,
    connection::ConnectionStatus,
    controller::PanelCommand,
    event::UiEvent,
    feedback::{ButtonStyle, FeedbackDefinition, FeedbackId, feedback_definitions},
    manager::BridgeStateManager,
    model::CueMirror,
    presets::{ButtonPreset, preset_definitions, toggle_preset},
    variables::{VariableDefinition, VariableStore, VariableValues, variable_definitions},
};

#[derive(Clone)]
struct ApiState {
    command_tx: mpsc::Sender<PanelCommand>,
    state_manager: BridgeStateManager,
    status_rx: watch::Receiver<ConnectionStatus>,
    config_tx: Arc<watch::Sender<BridgeConfig>>,
    event_tx: broadcast::Sender<UiEvent>,
}

pub fn create_api_router(handle: &BridgeHandle) -> Router {
    let state = ApiState {
        command_tx: handle.command_tx.clone(),
        state_manager: handle.state_manager.clone(),
        status_rx: handle.status_rx.clone(),
        config_tx: handle.config_tx.clone(),
        event_tx: handle.event_tx.clone(),
    };

    Router::new()
        // パネル用のWebSocketエンドポイント
        .route("/ws", get(websocket_handler))
        .route("/api/state", get(get_full_state_handler))
        .route("/api/definitions", get(get_definitions_handler))
        .route("/api/buttons/{cue_id}/style", get(get_button_style_handler))
        .route("/api/actions/{action_id}", post(press_button_handler))
        .route("/api/config", put(put_config_handler))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FullBridgeState {
    status: ConnectionStatus,
    mirror: CueMirror,
    variables: VariableStore,
}

async fn get_full_state_handler(State(state): State<ApiState>) -> Json<FullBridgeState> {
    let status = state.status_rx.borrow().clone();
    let bridge_state = state.state_manager.read().await.clone();

    Json(FullBridgeState {
        status,
        mirror: bridge_state.mirror,
        variables: bridge_state.variables,
    })
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Definitions {
    actions: Vec<ActionDefinition>,
    feedbacks: Vec<FeedbackDefinition>,
    presets: Vec<ButtonPreset>,
    variables: Vec<VariableDefinition>,
}

async fn get_definitions_handler(State(state): State<ApiState>) -> Json<Definitions> {
    let bridge_state = state.state_manager.read().await;
    let cues = &bridge_state.mirror.cues;

    Json(Definitions {
        actions: action_definitions(cues),
        feedbacks: feedback_definitions(),
        presets: preset_definitions(cues),
        variables: variable_definitions(),
    })
}

async fn get_button_style_handler(
    State(state): State<ApiState>,
    Path(cue_id): Path<String>,
) -> Result<Json<ButtonStyle>, StatusCode> {
    let bridge_state = state.state_manager.read().await;
    let mirror = &bridge_state.mirror;
    let cue = mirror
        .cues
        .iter()
        .find(|c| c.id == cue_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    let preset = toggle_preset(cue);
    Ok(Json(preset.style.resolve(&preset.feedbacks, mirror)))
}

async fn press_button_handler(
    State(state): State<ApiState>,
    Path(action_id): Path<String>,
) -> StatusCode {
    let Ok(action) = action_id.parse::<ActionId>() else {
        return StatusCode::NOT_FOUND;
    };
    if action
        .to_command(&state.state_manager.read().await.mirror)
        .is_none()
    {
        return StatusCode::NOT_FOUND;
    }

    match state
        .command_tx
        .send(PanelCommand::PressButton { action_id })
        .await
    {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            log::error!("Failed to send button press to BridgeController: {}", e);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn put_config_handler(
    State(state): State<ApiState>,
    Json(config): Json<BridgeConfig>,
) -> StatusCode {
    log::info!("Config updated, soundboard target is now {}", config.url());
    state.config_tx.send_replace(config);
    StatusCode::NO_CONTENT
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: ApiState) {
    let session_id = Uuid::new_v4();
    let mut event_rx = state.event_tx.subscribe();

    log::info!("Panel {} connected.", session_id);

    let status = state.status_rx.borrow().clone();
    if send_event(&mut socket, &UiEvent::ConnectionStatusChanged { status })
        .await
        .is_err()
    {
        log::info!("Panel {} disconnected (send error).", session_id);
        return;
    }

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Ok(event) => {
                    if send_event(&mut socket, &event).await.is_err() {
                        log::info!("Panel {} disconnected (send error).", session_id);
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Panel {} lagged behind, {} events skipped.", session_id, skipped);
                    let mut failed = false;
                    for event in snapshot_events(&state).await {
                        if send_event(&mut socket, &event).await.is_err() {
                            failed = true;
                            break;
                        }
                    }
                    if failed {
                        log::info!("Panel {} disconnected (send error).", session_id);
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            incoming = socket.recv() => {
                let Some(Ok(msg)) = incoming else {
                    log::info!("Panel {} disconnected.", session_id);
                    break;
                };
                if let Message::Text(text) = msg {
                    if let Ok(command) = serde_json::from_str::<PanelCommand>(&text) {
                        if state.command_tx.send(command).await.is_err() {
                            log::error!("Failed to send panel command to BridgeController.");
                            break;
                        }
                    } else {
                        log::error!("Invalid command received from panel {}.", session_id)
                    }
                } else if let Message::Close(_) = msg {
                    log::info!("Panel {} sent close message.", session_id);
                    break;
                }
            }
        }
    }
}

/// Events that bring a panel that missed broadcasts back in line with the current state.
async fn snapshot_events(state: &ApiState) -> Vec<UiEvent> {
    let status = state.status_rx.borrow().clone();
    let bridge_state = state.state_manager.read().await;
    let values: VariableValues = bridge_state
        .variables
        .iter()
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect();

    vec![
        UiEvent::ConnectionStatusChanged { status },
        UiEvent::CueListUpdated {
            cues: bridge_state.mirror.cues.clone(),
        },
        UiEvent::DefinitionsChanged,
        UiEvent::VariablesChanged { values },
        UiEvent::FeedbacksInvalidated {
            feedback_ids: FeedbackId::ALL.to_vec(),
        },
    ]
}

async fn send_event(socket: &mut WebSocket, event: &UiEvent) -> Result<(), anyhow::Error> {
    let payload = serde_json::to_string(event)?;
    socket.send(Message::Text(payload.into())).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{net::SocketAddr, time::Duration};

    use futures_util::{SinkExt, Stream, StreamExt};
    use serde_json::{Value, json};
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message as ClientMessage;

    use crate::{
        model::cue::{CueDescriptor, PlaybackStatus},
        protocol::{InboundMessage, PlaybackUpdate},
    };

    const WAIT: Duration = Duration::from_secs(5);

    async fn serve(state: ApiState) -> SocketAddr {
        let router = Router::new()
            .route("/ws", get(websocket_handler))
            .with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn api_state() -> (ApiState, mpsc::Receiver<PanelCommand>, watch::Receiver<BridgeConfig>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (_status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);
        let (config_tx, config_rx) = watch::channel(BridgeConfig::default());
        let (event_tx, _) = broadcast::channel(32);

        let state = ApiState {
            command_tx,
            state_manager: BridgeStateManager::new(),
            status_rx,
            config_tx: Arc::new(config_tx),
            event_tx,
        };
        (state, command_rx, config_rx)
    }

    async fn next_json<S>(stream: &mut S) -> Value
    where
        S: Stream<Item = Result<ClientMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        let msg = timeout(WAIT, stream.next()).await.unwrap().unwrap().unwrap();
        serde_json::from_str(msg.to_text().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn panel_socket_round_trip() {
        let (state, mut command_rx, _) = api_state();
        let event_tx = state.event_tx.clone();
        let addr = serve(state).await;

        let (mut panel, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
            .await
            .unwrap();

        assert_eq!(
            next_json(&mut panel).await,
            json!({
                "type": "ConnectionStatusChanged",
                "param": { "status": { "state": "connecting" } }
            })
        );

        event_tx.send(UiEvent::DefinitionsChanged).unwrap();
        assert_eq!(next_json(&mut panel).await, json!({ "type": "DefinitionsChanged" }));

        panel
            .send(ClientMessage::Text(
                r#"{"type":"PressButton","param":{"actionId":"stop_all"}}"#
                    .to_string()
                    .into(),
            ))
            .await
            .unwrap();
        let command = timeout(WAIT, command_rx.recv()).await.unwrap().unwrap();
        assert_eq!(
            command,
            PanelCommand::PressButton {
                action_id: "stop_all".to_string()
            }
        );
    }

    #[tokio::test]
    async fn lagging_panel_gets_snapshot() {
        let (state, _, _) = api_state();
        state
            .state_manager
            .write_with(|s| {
                s.apply(InboundMessage::CuesListUpdate(vec![CueDescriptor::new("c1", "Intro")]))
            })
            .await;
        let event_tx = state.event_tx.clone();
        let addr = serve(state).await;

        let (mut panel, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
            .await
            .unwrap();
        next_json(&mut panel).await;

        // More events than the channel holds, sent before the session task can drain them.
        for _ in 0..40 {
            event_tx.send(UiEvent::DefinitionsChanged).unwrap();
        }

        let status = next_json(&mut panel).await;
        assert_eq!(status["type"], "ConnectionStatusChanged");
        let cue_list = next_json(&mut panel).await;
        assert_eq!(cue_list["type"], "CueListUpdated");
        assert_eq!(cue_list["param"]["cues"][0]["id"], "c1");
        assert_eq!(next_json(&mut panel).await["type"], "DefinitionsChanged");
        let variables = next_json(&mut panel).await;
        assert_eq!(variables["type"], "VariablesChanged");
        assert_eq!(variables["param"]["values"].as_object().unwrap().len(), 189);
        assert_eq!(variables["param"]["values"]["cue_1_name"], "Intro");
        let feedbacks = next_json(&mut panel).await;
        assert_eq!(
            feedbacks["param"]["feedbackIds"],
            json!(["cue_is_playing", "cue_is_paused", "cue_is_stopped"])
        );
    }

    #[tokio::test]
    async fn full_state_reports_mirror_and_variables() {
        let (state, _, _) = api_state();
        state
            .state_manager
            .write_with(|s| {
                s.apply(InboundMessage::CuesListUpdate(vec![
                    CueDescriptor::new("c1", "Intro"),
                    CueDescriptor::new("c2", "Outro"),
                ]));
                let mut update = PlaybackUpdate::new("c2", PlaybackStatus::Playing);
                update.cue_name = Some("Outro".to_string());
                s.apply(InboundMessage::PlaybackTimeUpdate(update))
            })
            .await;

        let Json(full) = get_full_state_handler(State(state)).await;
        let full = serde_json::to_value(&full).unwrap();

        assert_eq!(full["status"], json!({ "state": "connecting" }));
        assert_eq!(
            full["mirror"]["cues"],
            json!([{ "id": "c1", "name": "Intro" }, { "id": "c2", "name": "Outro" }])
        );
        assert_eq!(full["mirror"]["playStates"], json!({ "c2": "playing" }));
        assert_eq!(full["mirror"]["currentCueId"], "c2");
        assert_eq!(full["variables"]["current_cue_name"], "Outro");
        assert_eq!(full["variables"]["cue_2_status"], "playing");
    }

    #[tokio::test]
    async fn press_button_checks_action() {
        let (state, mut command_rx, _) = api_state();
        state
            .state_manager
            .write_with(|s| {
                s.apply(InboundMessage::CuesListUpdate(vec![CueDescriptor::new("c1", "Intro")]))
            })
            .await;

        let status =
            press_button_handler(State(state.clone()), Path("play_cue_c1".to_string())).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(
            command_rx.recv().await,
            Some(PanelCommand::PressButton {
                action_id: "play_cue_c1".to_string()
            })
        );

        let status =
            press_button_handler(State(state.clone()), Path("play_cue_c9".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let status = press_button_handler(State(state), Path("jump".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn button_style_and_config() {
        let (state, _, mut config_rx) = api_state();
        state
            .state_manager
            .write_with(|s| {
                s.apply(InboundMessage::CuesListUpdate(vec![CueDescriptor::new("c1", "Intro")]))
            })
            .await;

        let Json(style) =
            get_button_style_handler(State(state.clone()), Path("c1".to_string()))
                .await
                .unwrap();
        assert_eq!(style.text, "TOGGLE\nIntro");
        assert_eq!(style.bgcolor, 0);

        let missing = get_button_style_handler(State(state.clone()), Path("zz".to_string())).await;
        assert_eq!(missing.unwrap_err(), StatusCode::NOT_FOUND);

        let config = BridgeConfig {
            host: "10.1.1.1".to_string(),
            ..BridgeConfig::default()
        };
        let status = put_config_handler(State(state.clone()), Json(config.clone())).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        config_rx.changed().await.unwrap();
        assert_eq!(*config_rx.borrow(), config);

        let Json(definitions) = get_definitions_handler(State(state)).await;
        assert_eq!(definitions.actions.len(), 4);
        assert_eq!(definitions.presets.len(), 2);
        assert_eq!(definitions.feedbacks.len(), 3);
        assert_eq!(definitions.variables.len(), 189);
    }
}
