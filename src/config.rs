use std::time::Duration;

/// Knobs shared by the transport and ref-discovery layers.
///
/// There is no persistent daemon state here, so this is a plain struct built
/// from CLI flags rather than a config-file layer.
#[derive(Debug, Clone)]
pub struct Config {
    pub user_agent: String,
    pub connect_timeout: Duration,
    /// Capability string appended to the `want` line, e.g. `"multi_ack"`.
    pub want_capabilities: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: "git/gitlite-rust".to_string(),
            connect_timeout: Duration::from_secs(30),
            want_capabilities: "multi_ack".to_string(),
        }
    }
}
