use std::time::Duration;

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `host:port` to bind. A bare `:port` means every interface.
    pub listen: String,
    /// Upper bound on graceful shutdown once a signal arrives.
    pub shutdown_grace: Duration,
}
