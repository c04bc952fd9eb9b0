use serde::{Deserialize, Serialize};

use tably_protocol::DEFAULT_PORT;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TablyConfig {
    pub gateway: GatewayConfig,
}

/// Gateway listen settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Interface to bind. Defaults to loopback.
    pub bind: String,

    /// Listen port. Defaults to 3000.
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loopback_3000() {
        let cfg = TablyConfig::default();
        assert_eq!(cfg.gateway.bind, "127.0.0.1");
        assert_eq!(cfg.gateway.port, 3000);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: TablyConfig = toml::from_str("[gateway]\nport = 4010\n").unwrap();
        assert_eq!(cfg.gateway.port, 4010);
        assert_eq!(cfg.gateway.bind, "127.0.0.1");
    }
}
