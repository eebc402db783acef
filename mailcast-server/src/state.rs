//! Application state shared across all request handlers.

use crate::config::runtime::SharedConfig;
use mailcast_core::broadcast::ChannelRegistry;
use mailcast_core::events::StatusUpdateSender;
use std::sync::Arc;
use tokio::sync::watch;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Campaign channels, alive for the whole process.
    pub channels: Arc<ChannelRegistry>,
    /// Runtime configuration (publisher and subscriber sections reload on SIGHUP).
    pub config: SharedConfig,
    /// Write-back queue feeding the `StatusWriter`.
    pub status_tx: StatusUpdateSender,
    /// Flips to `true` once shutdown starts; sessions close when it does.
    pub shutdown_rx: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        channels: Arc<ChannelRegistry>,
        config: SharedConfig,
        status_tx: StatusUpdateSender,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            channels,
            config,
            status_tx,
            shutdown_rx,
        }
    }
}
