use std::fs;
use std::path::PathBuf;

use alloy_primitives::Address;
use serde::Deserialize;

use crate::infrastructure::ethereum::ProviderConfig;

/// Endpoint selection; the first populated transport wins (rpc, ws, ipc)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointConfig {
    pub name: Option<String>,
    pub rpc: Option<String>,
    pub ws: Option<String>,
    pub ipc: Option<PathBuf>,
}

impl EndpointConfig {
    pub fn provider_config(&self) -> Option<ProviderConfig> {
        if let Some(rpc) = &self.rpc {
            return Some(ProviderConfig::Http(rpc.clone()));
        }
        if let Some(ws) = &self.ws {
            return Some(ProviderConfig::WebSocket(ws.clone()));
        }
        #[cfg(unix)]
        if let Some(ipc) = &self.ipc {
            return Some(ProviderConfig::Ipc(ipc.clone()));
        }
        None
    }
}

/// Default call overrides merged under every contract operation's options
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Overrides {
    pub from: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<u128>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default)]
    pub overrides: Overrides,
}

pub fn load() -> Config {
    let mut config = read_config();
    // SIGIL_RPC overrides whatever the file says.
    if let Ok(rpc) = std::env::var("SIGIL_RPC") {
        if !rpc.trim().is_empty() {
            config.endpoint.rpc = Some(rpc);
        }
    }
    config
}

fn read_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(_) => return Config::default(),
    };
    toml::from_str::<Config>(&content).unwrap_or_default()
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("SIGIL_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("sigil").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("sigil").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "sigil", "sigil")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [endpoint]
            name = "local"
            rpc = "http://localhost:8545"

            [overrides]
            from = "0x1111111111111111111111111111111111111111"
            gas = 30000000
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoint.rpc.as_deref(), Some("http://localhost:8545"));
        assert!(matches!(config.endpoint.provider_config(), Some(ProviderConfig::Http(_))));
        assert_eq!(config.overrides.from, Some(Address::from([0x11; 20])));
        assert_eq!(config.overrides.gas, Some(30_000_000));
        assert_eq!(config.overrides.gas_price, None);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.endpoint.provider_config().is_none());
        assert!(config.overrides.from.is_none());
    }

    #[test]
    fn test_ws_endpoint_when_no_rpc() {
        let config: Config = toml::from_str(
            r#"
            [endpoint]
            ws = "ws://localhost:8546"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.endpoint.provider_config(),
            Some(ProviderConfig::WebSocket(_))
        ));
    }
}
