use std::time::Duration;

use memstore_common::DEFAULT_CLEANUP_INTERVAL_MS;

/// Configuração do store.
///
/// ```rust
/// use memstore_storage::StoreConfig;
/// use std::time::Duration;
///
/// let config = StoreConfig::default()
///     .with_cleanup_interval(Duration::from_secs(30))
///     .with_auto_start(false);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Intervalo entre varreduras do sweeper (padrão: 60s).
    pub cleanup_interval: Duration,
    /// Inicia o sweeper na construção (padrão: true).
    pub auto_start: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_millis(DEFAULT_CLEANUP_INTERVAL_MS),
            auto_start: true,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }
}
