//! Flow nodes: `knx-out` sends telegrams, `knx-in` forwards bus data.
//!
//! Both nodes share the bus connection of their [`Controller`] and publish a
//! [`NodeStatus`] through a `watch` channel.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::timeout;

use crate::controller::{BusConnection, BusNotification, Controller, NodeStatus};
use crate::error::{KnxError, Result};
use crate::message::{InboundKind, InboundMessage, OutboundRequest};
use crate::types::{resolve_action, Telegram};

/// Sends outgoing telegrams built from flow messages.
#[derive(Debug)]
pub struct OutNode {
    name: String,
    controller: Arc<Controller>,
    status: watch::Sender<NodeStatus>,
}

impl OutNode {
    /// Create a new out node. Status starts as [`NodeStatus::Inactive`].
    pub fn new(name: impl Into<String>, controller: Arc<Controller>) -> Self {
        let (status, _) = watch::channel(NodeStatus::Inactive);
        Self {
            name: name.into(),
            controller,
            status,
        }
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Watch the node status.
    pub fn status(&self) -> watch::Receiver<NodeStatus> {
        self.status.subscribe()
    }

    /// Handle one input message.
    ///
    /// The action comes from the topic (see [`resolve_action`]); the payload is a
    /// request object or a JSON string holding one. Nothing is sent when the
    /// request cannot be encoded.
    pub async fn handle_input(&self, topic: &str, payload: &Value) -> Result<Telegram> {
        debug!("{}: input topic={} payload={}", self.name, topic, payload);
        let request = OutboundRequest::from_payload(payload)?;
        let action = resolve_action(topic, request.has_value());
        let telegram = request.to_telegram(action).map_err(|e| {
            warn!("{}: cannot build telegram: {}", self.name, e);
            e
        })?;
        self.send(telegram).await
    }

    /// Send a prepared telegram over the controller's connection.
    pub async fn send(&self, telegram: Telegram) -> Result<Telegram> {
        let connection = match self.controller.initialize().await {
            Ok(connection) => connection,
            Err(e) => {
                self.status.send_replace(NodeStatus::Disconnected);
                return Err(e);
            }
        };
        self.status
            .send_replace(NodeStatus::from_connected(connection.is_connected()));

        debug!("{}: sending {}", self.name, telegram);
        let send_timeout = self.controller.config().send_timeout;
        match timeout(send_timeout, connection.send(telegram.clone())).await {
            Ok(Ok(())) => Ok(telegram),
            Ok(Err(e)) => {
                error!("{}: sending {} failed: {}", self.name, telegram, e);
                if e.is_connection_error() {
                    self.status.send_replace(NodeStatus::Disconnected);
                }
                Err(e)
            }
            Err(_) => {
                error!("{}: sending {} timed out", self.name, telegram);
                Err(KnxError::SendTimeout)
            }
        }
    }
}

/// Forwards inbound bus data as flow messages.
#[derive(Debug)]
pub struct InNode {
    name: String,
    controller: Arc<Controller>,
    status: watch::Sender<NodeStatus>,
    subscription: Option<broadcast::Receiver<BusNotification>>,
}

impl InNode {
    /// Create a new in node. Call [`InNode::attach`] to start receiving.
    pub fn new(name: impl Into<String>, controller: Arc<Controller>) -> Self {
        let (status, _) = watch::channel(NodeStatus::Inactive);
        Self {
            name: name.into(),
            controller,
            status,
            subscription: None,
        }
    }

    /// Node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Watch the node status.
    pub fn status(&self) -> watch::Receiver<NodeStatus> {
        self.status.subscribe()
    }

    /// Check if the node holds a subscription.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribe to the controller's connection, replacing any previous subscription.
    ///
    /// Calling this again after a reconnect never leaves two handlers registered.
    pub async fn attach(&mut self) -> Result<()> {
        self.status.send_replace(NodeStatus::Connecting);
        let connection: Arc<dyn BusConnection> = match self.controller.initialize().await {
            Ok(connection) => connection,
            Err(e) => {
                self.status.send_replace(NodeStatus::Disconnected);
                return Err(e);
            }
        };

        if self.subscription.replace(connection.subscribe()).is_some() {
            debug!("{}: replaced previous subscription", self.name);
        }
        self.status
            .send_replace(NodeStatus::from_connected(connection.is_connected()));
        Ok(())
    }

    /// Drop the subscription.
    pub fn detach(&mut self) {
        self.subscription = None;
    }

    /// Wait for the next inbound message.
    ///
    /// Lifecycle notifications update the status and are not returned.
    /// Returns `Ok(None)` once the connection stops publishing.
    pub async fn recv(&mut self) -> Result<Option<InboundMessage>> {
        let subscription = self.subscription.as_mut().ok_or(KnxError::NotConnected)?;

        loop {
            let notification = match subscription.recv().await {
                Ok(notification) => notification,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("{}: dropped {} notifications", self.name, skipped);
                    continue;
                }
                Err(RecvError::Closed) => {
                    self.subscription = None;
                    self.status.send_replace(NodeStatus::Disconnected);
                    return Ok(None);
                }
            };

            let (kind, data) = match notification {
                BusNotification::Event(data) => (InboundKind::Event, data),
                BusNotification::Status(data) => (InboundKind::Status, data),
                lifecycle => {
                    if let Some(status) = NodeStatus::from_notification(&lifecycle) {
                        info!("{}: {}", self.name, status);
                        self.status.send_replace(status);
                    }
                    continue;
                }
            };

            debug!(
                "{}: knx {:?} gad[{}] data[{}]",
                self.name,
                kind,
                data.destination,
                hex(&data.data)
            );
            return Ok(Some(InboundMessage::new(
                kind,
                &data.source,
                data.destination,
                &data.data,
            )));
        }
    }

    /// Forward inbound messages into a channel until the connection closes.
    pub async fn forward(&mut self, output: mpsc::Sender<InboundMessage>) -> Result<()> {
        while let Some(message) = self.recv().await? {
            output
                .send(message)
                .await
                .map_err(|_| KnxError::ChannelClosed)?;
        }
        Ok(())
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
