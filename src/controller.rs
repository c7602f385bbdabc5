use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::{
    actions::ActionId,
    event::UiEvent,
    manager::BridgeStateManager,
    protocol::{InboundMessage, OutboundCommand},
};

/// Input from a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "param", rename_all_fields = "camelCase")]
pub enum PanelCommand {
    PressButton { action_id: String },
}

pub struct BridgeController {
    state_manager: BridgeStateManager,
    outbound_tx: mpsc::Sender<OutboundCommand>, // SoundboardConnectionへの送信用
    command_rx: mpsc::Receiver<PanelCommand>,
    inbound_rx: mpsc::Receiver<InboundMessage>,
    event_tx: broadcast::Sender<UiEvent>,
}

impl BridgeController {
    pub fn new(
        state_manager: BridgeStateManager,
        outbound_tx: mpsc::Sender<OutboundCommand>,
        command_rx: mpsc::Receiver<PanelCommand>,
        inbound_rx: mpsc::Receiver<InboundMessage>,
        event_tx: broadcast::Sender<UiEvent>,
    ) -> Self {
        Self {
            state_manager,
            outbound_tx,
            command_rx,
            inbound_rx,
            event_tx,
        }
    }

    pub async fn run(mut self) {
        log::info!("BridgeController run loop started.");
        loop {
            tokio::select! {
                Some(command) = self.command_rx.recv() => {
                    if let Err(e) = self.handle_command(command).await {
                        log::error!("Error handling panel command: {:?}", e);
                    }
                },
                Some(message) = self.inbound_rx.recv() => {
                    self.handle_inbound(message).await;
                },
                else => break,
            }
        }
        log::info!("BridgeController run loop finished.");
    }

    async fn handle_command(&self, command: PanelCommand) -> Result<(), anyhow::Error> {
        match command {
            PanelCommand::PressButton { action_id } => self.handle_press(&action_id).await,
        }
    }

    async fn handle_press(&self, action_id: &str) -> Result<(), anyhow::Error> {
        let action: ActionId = action_id.parse()?;
        let command = action.to_command(&self.state_manager.read().await.mirror);

        match command {
            Some(command) => {
                log::debug!("Button '{}' pressed, sending {:?}", action_id, command);
                self.outbound_tx.send(command).await?;
            }
            None => log::warn!("Button '{}' refers to a cue not in the cue list.", action_id),
        }
        Ok(())
    }

    async fn handle_inbound(&self, message: InboundMessage) {
        let events = self
            .state_manager
            .write_with(|state| state.apply(message))
            .await;

        for event in events {
            if self.event_tx.send(event).is_err() {
                log::trace!("No panel clients are listening to bridge events.");
            }
        }
    }
}
