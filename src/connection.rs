use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::{
    net::TcpStream,
    sync::{broadcast, mpsc, watch},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::{
    config::BridgeConfig,
    event::UiEvent,
    protocol::{InboundMessage, OutboundCommand, decode_inbound},
};

type SoundboardSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CONNECTION_CLOSED: &str = "Connection closed";
const CONNECTION_ERROR: &str = "Connection error";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", content = "message", rename_all = "camelCase")]
pub enum ConnectionStatus {
    Connecting,
    Ok,
    BadConfig(String),
    Disconnected(String),
    ConnectionFailure(String),
}

enum SessionEnd {
    /// The socket never opened.
    Failed,
    /// The socket opened and was later lost.
    Closed,
    Reconfigure,
    Shutdown,
}

impl SessionEnd {
    fn after_config_change(sender_alive: bool) -> Self {
        if sender_alive {
            SessionEnd::Reconfigure
        } else {
            SessionEnd::Shutdown
        }
    }
}

/// Owns the single WebSocket to the soundboard and keeps it alive.
pub struct SoundboardConnection {
    config_rx: watch::Receiver<BridgeConfig>,
    outbound_rx: mpsc::Receiver<OutboundCommand>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    status_tx: watch::Sender<ConnectionStatus>,
    event_tx: broadcast::Sender<UiEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SoundboardConnection {
    pub fn new(
        config_rx: watch::Receiver<BridgeConfig>,
        outbound_rx: mpsc::Receiver<OutboundCommand>,
        inbound_tx: mpsc::Sender<InboundMessage>,
        status_tx: watch::Sender<ConnectionStatus>,
        event_tx: broadcast::Sender<UiEvent>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config_rx,
            outbound_rx,
            inbound_tx,
            status_tx,
            event_tx,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        log::info!("SoundboardConnection run loop started.");
        loop {
            let config = self.config_rx.borrow_and_update().clone();
            self.set_status(ConnectionStatus::Connecting);

            let end = match config.validate() {
                Ok(()) => self.session(&config).await,
                Err(e) => {
                    log::warn!("Not connecting to soundboard: {}", e);
                    self.set_status(ConnectionStatus::BadConfig(e.to_string()));
                    if self.wait_for_config().await {
                        continue;
                    }
                    break;
                }
            };

            let proceed = match end {
                SessionEnd::Shutdown => false,
                SessionEnd::Reconfigure => true,
                SessionEnd::Failed | SessionEnd::Closed if config.reconnect => {
                    self.wait_before_retry(config.reconnect_interval()).await
                }
                SessionEnd::Failed | SessionEnd::Closed => self.wait_for_config().await,
            };
            if !proceed {
                break;
            }
        }
        log::info!("SoundboardConnection run loop finished.");
    }

    /// Connects once and serves the socket until it is lost or no longer wanted.
    async fn session(&mut self, config: &BridgeConfig) -> SessionEnd {
        let url = config.url();
        log::info!("Connecting to soundboard at {}", url);

        let connect = connect_async(url.as_str());
        tokio::pin!(connect);
        let connected = loop {
            tokio::select! {
                result = &mut connect => break result,
                changed = self.config_rx.changed() => {
                    return SessionEnd::after_config_change(changed.is_ok());
                }
                _ = self.shutdown_rx.changed() => return SessionEnd::Shutdown,
                command = self.outbound_rx.recv() => match command {
                    Some(command) => drop_outbound(&command),
                    None => return SessionEnd::Shutdown,
                },
            }
        };

        let mut socket = match connected {
            Ok((socket, _)) => socket,
            Err(e) => {
                log::error!("WebSocket error: {}", e);
                self.set_status(ConnectionStatus::ConnectionFailure(
                    CONNECTION_ERROR.to_string(),
                ));
                return SessionEnd::Failed;
            }
        };
        log::info!("Connected to soundboard");
        self.set_status(ConnectionStatus::Ok);

        loop {
            tokio::select! {
                incoming = socket.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.forward_inbound(text.as_str()).await,
                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => self.forward_inbound(text).await,
                        Err(e) => log::error!("Failed to parse message from soundboard: {}", e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        match frame {
                            Some(frame) => log::info!(
                                "Connection closed. Code: {}, Reason: {}",
                                u16::from(frame.code),
                                frame.reason.as_str()
                            ),
                            None => log::info!("Connection closed."),
                        }
                        self.set_disconnected();
                        return SessionEnd::Closed;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        log::error!("WebSocket error: {}", e);
                        self.set_disconnected();
                        return SessionEnd::Closed;
                    }
                    None => {
                        log::info!("Connection closed.");
                        self.set_disconnected();
                        return SessionEnd::Closed;
                    }
                },
                command = self.outbound_rx.recv() => match command {
                    Some(command) => {
                        if let Err(e) = send_command(&mut socket, &command).await {
                            log::error!("Failed to send {:?} to soundboard: {}", command, e);
                            self.set_disconnected();
                            return SessionEnd::Closed;
                        }
                    }
                    None => {
                        close_socket(&mut socket).await;
                        return SessionEnd::Shutdown;
                    }
                },
                changed = self.config_rx.changed() => {
                    close_socket(&mut socket).await;
                    return SessionEnd::after_config_change(changed.is_ok());
                }
                _ = self.shutdown_rx.changed() => {
                    close_socket(&mut socket).await;
                    return SessionEnd::Shutdown;
                }
            }
        }
    }

    /// Sleeps for the reconnect interval. Returns false if the bridge is shutting down.
    async fn wait_before_retry(&mut self, interval: Duration) -> bool {
        let sleep = tokio::time::sleep(interval);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => {
                    log::info!("Attempting to reconnect...");
                    return true;
                }
                changed = self.config_rx.changed() => return changed.is_ok(),
                _ = self.shutdown_rx.changed() => return false,
                command = self.outbound_rx.recv() => match command {
                    Some(command) => drop_outbound(&command),
                    None => return false,
                },
            }
        }
    }

    /// Idles until a new config arrives. Returns false if the bridge is shutting down.
    async fn wait_for_config(&mut self) -> bool {
        loop {
            tokio::select! {
                changed = self.config_rx.changed() => return changed.is_ok(),
                _ = self.shutdown_rx.changed() => return false,
                command = self.outbound_rx.recv() => match command {
                    Some(command) => drop_outbound(&command),
                    None => return false,
                },
            }
        }
    }

    async fn forward_inbound(&self, text: &str) {
        log::debug!("Received message: {}", text);
        match decode_inbound(text) {
            Ok(InboundMessage::Unknown) => log::debug!("Ignoring unrecognised message."),
            Ok(message) => {
                if self.inbound_tx.send(message).await.is_err() {
                    log::error!("Failed to forward soundboard message to BridgeController.");
                }
            }
            Err(e) => log::error!("Failed to parse message from soundboard: {}", e),
        }
    }

    fn set_disconnected(&self) {
        self.set_status(ConnectionStatus::Disconnected(CONNECTION_CLOSED.to_string()));
    }

    fn set_status(&self, status: ConnectionStatus) {
        let changed = self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status.clone();
                true
            }
        });
        if changed {
            log::debug!("Connection status: {:?}", status);
            if self
                .event_tx
                .send(UiEvent::ConnectionStatusChanged { status })
                .is_err()
            {
                log::trace!("No panel clients are listening to status updates.");
            }
        }
    }
}

fn drop_outbound(command: &OutboundCommand) {
    log::warn!("Not connected to soundboard, dropping {:?}", command);
}

async fn send_command(
    socket: &mut SoundboardSocket,
    command: &OutboundCommand,
) -> Result<(), anyhow::Error> {
    let payload = command.encode()?;
    log::debug!("Sending message: {}", payload);
    socket.send(Message::Text(payload.into())).await?;
    Ok(())
}

async fn close_socket(socket: &mut SoundboardSocket) {
    if let Err(e) = socket.close(None).await {
        log::debug!("Error while closing soundboard socket: {}", e);
    }
}
