use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration describing how to reach the ledger server.
#[derive(Debug, Clone)]
pub struct HttpLedgerConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpLedgerConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
