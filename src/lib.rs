use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

use crate::{
    config::BridgeConfig,
    connection::{ConnectionStatus, SoundboardConnection},
    controller::{BridgeController, PanelCommand},
    event::UiEvent,
    manager::BridgeStateManager,
    protocol::{InboundMessage, OutboundCommand},
};

pub mod actions;
pub mod apiserver;
pub mod config;
pub mod connection;
pub mod controller;
pub mod event;
pub mod feedback;
pub mod manager;
pub mod model;
pub mod presets;
pub mod protocol;
pub mod sync;
pub mod variables;

pub struct BridgeHandle {
    pub state_manager: BridgeStateManager,

    pub command_tx: mpsc::Sender<PanelCommand>,
    pub config_tx: Arc<watch::Sender<BridgeConfig>>,
    pub status_rx: watch::Receiver<ConnectionStatus>,
    pub event_tx: broadcast::Sender<UiEvent>,
    shutdown_tx: watch::Sender<bool>,
}

impl BridgeHandle {
    /// Replaces the config; the connection drops and reconnects to the new target.
    pub fn update_config(&self, config: BridgeConfig) {
        self.config_tx.send_replace(config);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.event_tx.subscribe()
    }

    /// Closes the soundboard socket and stops reconnecting.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

/// Spawns the connection and controller tasks. Must be called inside a tokio runtime.
pub fn start_bridge(config: BridgeConfig) -> BridgeHandle {
    let (command_tx, command_rx) = mpsc::channel::<PanelCommand>(32);
    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundMessage>(32);
    let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundCommand>(32);
    let (config_tx, config_rx) = watch::channel::<BridgeConfig>(config);
    let (status_tx, status_rx) = watch::channel::<ConnectionStatus>(ConnectionStatus::Connecting);
    let (event_tx, _) = broadcast::channel::<UiEvent>(64);
    let (shutdown_tx, shutdown_rx) = watch::channel::<bool>(false);

    let state_manager = BridgeStateManager::new();
    let controller = BridgeController::new(
        state_manager.clone(),
        outbound_tx,
        command_rx,
        inbound_rx,
        event_tx.clone(),
    );

    let connection = SoundboardConnection::new(
        config_rx,
        outbound_rx,
        inbound_tx,
        status_tx,
        event_tx.clone(),
        shutdown_rx,
    );

    tokio::spawn(controller.run());
    tokio::spawn(connection.run());

    BridgeHandle {
        state_manager,
        command_tx,
        config_tx: Arc::new(config_tx),
        status_rx,
        event_tx,
        shutdown_tx,
    }
}
