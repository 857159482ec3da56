// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and handed
//! to [`crate::state::AppState`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `RPC_URL` | JSON-RPC endpoint of the target chain | Required |
//! | `REGISTRY_ADDRESS` | EthereumDIDRegistry contract | `0x03d5003bf0e79C5F5223588F347ebA39AfbC3818` |
//! | `DID_NETWORK` | Network segment of issued DIDs | `sepolia` |
//! | `ADMIN_PRIVATE_KEY` | Key that relays and pays for registry writes | Required |
//! | `ENTRY_POINT_ADDRESS` | EIP-4337 EntryPoint | `0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789` |
//! | `PAYMASTER_ADDRESS` | Verifying paymaster; enables sponsorship | Optional |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;

use alloy::primitives::Address;

use crate::blockchain::{DEFAULT_DID_NETWORK, DEFAULT_ENTRY_POINT, DEFAULT_REGISTRY_ADDRESS};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const REGISTRY_ADDRESS_ENV: &str = "REGISTRY_ADDRESS";
pub const DID_NETWORK_ENV: &str = "DID_NETWORK";

/// Environment variable name for the admin signing key.
///
/// Hex, with or without `0x`. The admin identity must own every identity
/// this service writes to.
pub const ADMIN_PRIVATE_KEY_ENV: &str = "ADMIN_PRIVATE_KEY";
pub const ENTRY_POINT_ADDRESS_ENV: &str = "ENTRY_POINT_ADDRESS";
pub const PAYMASTER_ADDRESS_ENV: &str = "PAYMASTER_ADDRESS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rpc_url: String,
    pub registry_address: Address,
    pub did_network: String,
    pub admin_private_key: String,
    pub entry_point: Address,
    pub paymaster_address: Option<Address>,
    pub log_format: LogFormat,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("rpc_url", &self.rpc_url)
            .field("registry_address", &self.registry_address)
            .field("did_network", &self.did_network)
            .field("admin_private_key", &"<redacted>")
            .field("entry_point", &self.entry_point)
            .field("paymaster_address", &self.paymaster_address)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let port = match get(PORT_ENV) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            rpc_url: required(RPC_URL_ENV)?,
            registry_address: parse_address(REGISTRY_ADDRESS_ENV, get(REGISTRY_ADDRESS_ENV))?
                .unwrap_or(DEFAULT_REGISTRY_ADDRESS),
            did_network: get(DID_NETWORK_ENV).unwrap_or_else(|| DEFAULT_DID_NETWORK.to_string()),
            admin_private_key: required(ADMIN_PRIVATE_KEY_ENV)?,
            entry_point: parse_address(ENTRY_POINT_ADDRESS_ENV, get(ENTRY_POINT_ADDRESS_ENV))?
                .unwrap_or(DEFAULT_ENTRY_POINT),
            paymaster_address: parse_address(PAYMASTER_ADDRESS_ENV, get(PAYMASTER_ADDRESS_ENV))?,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_address(name: &'static str, value: Option<String>) -> Result<Option<Address>, ConfigError> {
    value
        .map(|raw| {
            raw.parse::<Address>()
                .map_err(|_| ConfigError::Invalid { name, value: raw })
        })
        .transpose()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        (RPC_URL_ENV, "http://localhost:8545"),
        (ADMIN_PRIVATE_KEY_ENV, "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"),
    ];

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_lookup(lookup(MINIMAL)).unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.registry_address, DEFAULT_REGISTRY_ADDRESS);
        assert_eq!(config.entry_point, DEFAULT_ENTRY_POINT);
        assert_eq!(config.did_network, "sepolia");
        assert_eq!(config.paymaster_address, None);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn required_variables_are_enforced() {
        let err = AppConfig::from_lookup(lookup(&[(RPC_URL_ENV, "http://x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(ADMIN_PRIVATE_KEY_ENV));

        let err = AppConfig::from_lookup(lookup(&[(RPC_URL_ENV, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(RPC_URL_ENV));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = MINIMAL.to_vec();
        vars.extend([
            (PORT_ENV, "9000"),
            (DID_NETWORK_ENV, "mainnet"),
            (PAYMASTER_ADDRESS_ENV, "0x9a9a9a9a9a9a9a9a9a9a9a9a9a9a9a9a9a9a9a9a"),
            (LOG_FORMAT_ENV, "json"),
        ]);
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.did_network, "mainnet");
        assert_eq!(config.paymaster_address, Some(Address::repeat_byte(0x9a)));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_values_are_reported() {
        let mut vars = MINIMAL.to_vec();
        vars.push((REGISTRY_ADDRESS_ENV, "0x1234"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: REGISTRY_ADDRESS_ENV, .. })
        ));

        let mut vars = MINIMAL.to_vec();
        vars.push((PORT_ENV, "http"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)),
            Err(ConfigError::Invalid { name: PORT_ENV, .. })
        ));
    }

    #[test]
    fn debug_redacts_private_key() {
        let config = AppConfig::from_lookup(lookup(MINIMAL)).unwrap();
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("ac0974"));
    }
}
