//! Bus connection controller.
//!
//! One [`Controller`] per gateway. It owns the shared bus connection: the
//! first node that needs the bus opens it, later nodes reuse it, and
//! [`Controller::close`] tears it down. The transport itself is external and
//! plugged in through the [`Connector`] and [`BusConnection`] traits.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::{broadcast, Mutex};
use tokio::time::timeout;

use crate::error::{KnxError, Result};
use crate::types::{GroupAddress, Telegram};

/// Default KNXnet/IP port.
pub const DEFAULT_PORT: u16 = 3671;

/// Default connection mode.
pub const DEFAULT_MODE: &str = "tunnel/unicast";

/// Default connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Default send timeout in seconds.
pub const DEFAULT_SEND_TIMEOUT: u64 = 5;

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Gateway host
    pub host: String,
    /// Gateway port
    pub port: u16,
    /// Connection mode, only `tunnel/unicast` is supported
    pub mode: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Time the transport gets to accept one telegram
    pub send_timeout: Duration,
}

impl ControllerConfig {
    /// Create a new configuration for the given gateway host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            mode: DEFAULT_MODE.to_owned(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT),
        }
    }

    /// Set gateway port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set connection mode.
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set send timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Gateway address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Supported connection modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// KNXnet/IP tunnelling over unicast UDP
    TunnelUnicast,
}

impl FromStr for ConnectionMode {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tunnel/unicast" => Ok(Self::TunnelUnicast),
            other => Err(KnxError::UnsupportedMode(other.to_owned())),
        }
    }
}

/// Raw data seen on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusData {
    /// Source physical address, e.g. `"1.1.5"`
    pub source: String,
    /// Destination group address
    pub destination: GroupAddress,
    /// Undecoded payload
    pub data: Bytes,
}

/// Notifications emitted by a bus connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusNotification {
    /// Connection attempt started
    Connecting,
    /// Connection established
    Connected,
    /// Connection lost or closed
    Disconnected,
    /// Group write observed on the bus
    Event(BusData),
    /// Response to a status request
    Status(BusData),
}

/// An open connection to the bus, provided by the transport.
pub trait BusConnection: Send + Sync {
    /// Check if the connection is currently up.
    fn is_connected(&self) -> bool;

    /// Put a telegram on the bus. Reads carry no payload.
    fn send(&self, telegram: Telegram) -> BoxFuture<'_, Result<()>>;

    /// Subscribe to lifecycle and data notifications.
    ///
    /// Each call returns an independent receiver; dropping it unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<BusNotification>;

    /// Close the connection.
    fn disconnect(&self) -> BoxFuture<'_, Result<()>>;
}

/// Opens bus connections.
pub trait Connector: Send + Sync {
    /// Connect to the gateway described by `config`.
    fn connect<'a>(
        &'a self,
        config: &'a ControllerConfig,
    ) -> BoxFuture<'a, Result<Arc<dyn BusConnection>>>;
}

/// Status shown by a flow node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    /// No connection requested yet
    #[default]
    Inactive,
    /// Connection attempt in progress
    Connecting,
    /// Connected to the bus
    Connected,
    /// Not connected
    Disconnected,
}

impl NodeStatus {
    /// Indicator colour.
    pub const fn fill(&self) -> &'static str {
        match self {
            Self::Inactive | Self::Connecting => "yellow",
            Self::Connected => "green",
            Self::Disconnected => "red",
        }
    }

    /// Status from a connection's current state.
    #[inline]
    pub const fn from_connected(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }

    /// Status change carried by a notification, if any.
    pub const fn from_notification(notification: &BusNotification) -> Option<Self> {
        match notification {
            BusNotification::Connecting => Some(Self::Connecting),
            BusNotification::Connected => Some(Self::Connected),
            BusNotification::Disconnected => Some(Self::Disconnected),
            BusNotification::Event(_) | BusNotification::Status(_) => None,
        }
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Inactive => "inactive",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        })
    }
}

/// Owner of the shared bus connection.
pub struct Controller {
    config: ControllerConfig,
    connector: Arc<dyn Connector>,
    connection: Mutex<Option<Arc<dyn BusConnection>>>,
}

impl Controller {
    /// Create a controller. No connection is opened until first use.
    pub fn new(config: ControllerConfig, connector: Arc<dyn Connector>) -> Self {
        Self {
            config,
            connector,
            connection: Mutex::new(None),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Return the shared connection, opening it on first use.
    pub async fn initialize(&self) -> Result<Arc<dyn BusConnection>> {
        let mut slot = self.connection.lock().await;
        if let Some(connection) = slot.as_ref() {
            debug!(
                "already connected to {} in mode[{}]",
                self.config.address(),
                self.config.mode
            );
            return Ok(Arc::clone(connection));
        }

        let mode: ConnectionMode = self.config.mode.parse()?;

        info!("connecting to {} in mode {:?}", self.config.address(), mode);
        let connection = timeout(
            self.config.connect_timeout,
            self.connector.connect(&self.config),
        )
        .await
        .map_err(|_| KnxError::ConnectionTimeout)?
        .map_err(|e| {
            warn!("connecting to {} failed: {}", self.config.address(), e);
            e
        })?;

        info!("connected to {}", self.config.address());
        *slot = Some(Arc::clone(&connection));
        Ok(connection)
    }

    /// Current connection without opening one.
    pub async fn connection(&self) -> Option<Arc<dyn BusConnection>> {
        self.connection.lock().await.clone()
    }

    /// Check if a connection has been opened.
    pub async fn is_open(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    /// Disconnect and drop the shared connection.
    pub async fn close(&self) -> Result<()> {
        let connection = self.connection.lock().await.take();
        if let Some(connection) = connection {
            info!("disconnecting from {}", self.config.address());
            connection.disconnect().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport for tests.

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    use futures::FutureExt;

    use super::*;

    pub struct FakeConnection {
        pub connected: AtomicBool,
        pub sent: StdMutex<Vec<Telegram>>,
        pub fail_sends: AtomicBool,
        notifications: StdMutex<Option<broadcast::Sender<BusNotification>>>,
    }

    impl FakeConnection {
        pub fn new() -> Arc<Self> {
            let (notifications, _) = broadcast::channel(16);
            Arc::new(Self {
                connected: AtomicBool::new(true),
                sent: StdMutex::new(Vec::new()),
                fail_sends: AtomicBool::new(false),
                notifications: StdMutex::new(Some(notifications)),
            })
        }

        pub fn sent(&self) -> Vec<Telegram> {
            self.sent.lock().unwrap().clone()
        }

        /// Publish a notification to all subscribers.
        pub fn notify(&self, notification: BusNotification) {
            if let Some(tx) = self.notifications.lock().unwrap().as_ref() {
                let _ = tx.send(notification);
            }
        }

        /// Stop publishing; subscribers see the backlog, then a closed channel.
        pub fn hang_up(&self) {
            self.notifications.lock().unwrap().take();
        }

        pub fn subscriber_count(&self) -> usize {
            self.notifications
                .lock()
                .unwrap()
                .as_ref()
                .map_or(0, |tx| tx.receiver_count())
        }
    }

    impl BusConnection for FakeConnection {
        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }

        fn send(&self, telegram: Telegram) -> BoxFuture<'_, Result<()>> {
            async move {
                if self.fail_sends.load(Ordering::SeqCst) {
                    return Err(KnxError::transport("bus busy"));
                }
                self.sent.lock().unwrap().push(telegram);
                Ok(())
            }
            .boxed()
        }

        fn subscribe(&self) -> broadcast::Receiver<BusNotification> {
            match self.notifications.lock().unwrap().as_ref() {
                Some(tx) => tx.subscribe(),
                None => broadcast::channel(1).1,
            }
        }

        fn disconnect(&self) -> BoxFuture<'_, Result<()>> {
            async move {
                self.connected.store(false, Ordering::SeqCst);
                self.notify(BusNotification::Disconnected);
                Ok(())
            }
            .boxed()
        }
    }

    pub struct FakeConnector {
        pub connection: Arc<FakeConnection>,
        pub connects: AtomicUsize,
        pub refuse: AtomicBool,
    }

    impl FakeConnector {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                connection: FakeConnection::new(),
                connects: AtomicUsize::new(0),
                refuse: AtomicBool::new(false),
            })
        }
    }

    impl Connector for FakeConnector {
        fn connect<'a>(
            &'a self,
            _config: &'a ControllerConfig,
        ) -> BoxFuture<'a, Result<Arc<dyn BusConnection>>> {
            async move {
                self.connects.fetch_add(1, Ordering::SeqCst);
                if self.refuse.load(Ordering::SeqCst) {
                    return Err(KnxError::transport("gateway refused tunnel"));
                }
                let connection: Arc<dyn BusConnection> = self.connection.clone();
                Ok(connection)
            }
            .boxed()
        }
    }

    /// Connector that never completes.
    pub struct StalledConnector;

    impl Connector for StalledConnector {
        fn connect<'a>(
            &'a self,
            _config: &'a ControllerConfig,
        ) -> BoxFuture<'a, Result<Arc<dyn BusConnection>>> {
            futures::future::pending().boxed()
        }
    }
}
