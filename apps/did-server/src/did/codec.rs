// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `did:ethr` string handling.
//!
//! Accepted forms are `did:ethr:<network>:<address>` and the legacy
//! `did:ethr:<address>`. The address is always the last `:`-separated
//! segment. A DID URL suffix (`#fragment`, `?query`, `/path`) and
//! surrounding whitespace or quoting are stripped before validation; any
//! other non-hex character inside the address is an error.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;

/// Method prefix of every DID this service handles.
pub const DID_ETHR_PREFIX: &str = "did:ethr:";

/// A parsed `did:ethr` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthrDid {
    network: Option<String>,
    address: Address,
    address_text: String,
}

impl EthrDid {
    /// Build a DID for `address` on `network`, checksumming the address.
    pub fn new(network: &str, address: Address) -> Self {
        Self {
            network: Some(network.to_string()),
            address,
            address_text: address.to_checksum(None),
        }
    }

    /// DID of another address in the same form (same network segment, or
    /// none for the legacy form).
    pub fn with_address(&self, address: Address) -> Self {
        Self {
            network: self.network.clone(),
            address,
            address_text: address.to_checksum(None),
        }
    }

    /// Network segment, `None` for the legacy form.
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    /// Identity address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Address exactly as it appeared in the DID (case preserved).
    pub fn address_text(&self) -> &str {
        &self.address_text
    }
}

impl fmt::Display for EthrDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.network {
            Some(network) => write!(f, "{DID_ETHR_PREFIX}{network}:{}", self.address_text),
            None => write!(f, "{DID_ETHR_PREFIX}{}", self.address_text),
        }
    }
}

impl FromStr for EthrDid {
    type Err = DidCodecError;

    fn from_str(did: &str) -> Result<Self, Self::Err> {
        let did = did.trim();
        if did.is_empty() {
            return Err(DidCodecError::Empty);
        }

        let segments: Vec<&str> = did.split(':').collect();
        if segments.len() < 3 || segments[0] != "did" {
            return Err(DidCodecError::NotADid(did.to_string()));
        }
        if segments[1] != "ethr" {
            return Err(DidCodecError::UnsupportedMethod(segments[1].to_string()));
        }

        let address_text = clean_address_segment(segments[segments.len() - 1])
            .ok_or_else(|| DidCodecError::MalformedAddress(did.to_string()))?;
        let address = Address::from_str(&address_text)
            .map_err(|_| DidCodecError::MalformedAddress(did.to_string()))?;

        let network = if segments.len() > 3 {
            Some(segments[2..segments.len() - 1].join(":"))
        } else {
            None
        };

        Ok(Self {
            network,
            address,
            address_text,
        })
    }
}

/// Extract the address of a `did:ethr` DID with its original casing.
pub fn address_from_did(did: &str) -> Result<String, DidCodecError> {
    Ok(did.parse::<EthrDid>()?.address_text)
}

fn clean_address_segment(segment: &str) -> Option<String> {
    let end = segment.find(['#', '?', '/']).unwrap_or(segment.len());
    let segment = segment[..end].trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'');

    let hex = segment
        .strip_prefix("0x")
        .or_else(|| segment.strip_prefix("0X"))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some(format!("0x{hex}"))
}

/// Errors raised while parsing a DID string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DidCodecError {
    #[error("DID must not be empty")]
    Empty,

    #[error("`{0}` is not a DID (expected did:ethr:<network>:<address>)")]
    NotADid(String),

    #[error("Unsupported DID method `{0}`; only did:ethr is supported")]
    UnsupportedMethod(String),

    #[error("DID `{0}` does not end in a valid Ethereum address")]
    MalformedAddress(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIXED: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

    #[test]
    fn test_address_extraction_preserves_case() {
        let did = format!("did:ethr:sepolia:{MIXED}");
        assert_eq!(address_from_did(&did).unwrap(), MIXED);

        let lower = MIXED.to_lowercase();
        let did = format!("did:ethr:sepolia:{lower}");
        assert_eq!(address_from_did(&did).unwrap(), lower);
    }

    #[test]
    fn test_legacy_form_without_network() {
        let did: EthrDid = format!("did:ethr:{MIXED}").parse().unwrap();
        assert_eq!(did.network(), None);
        assert_eq!(did.address_text(), MIXED);
        assert_eq!(did.to_string(), format!("did:ethr:{MIXED}"));
    }

    #[test]
    fn test_network_with_chain_id_segment() {
        let did: EthrDid = format!("did:ethr:0xaa36a7:{MIXED}").parse().unwrap();
        assert_eq!(did.network(), Some("0xaa36a7"));
    }

    #[test]
    fn test_fragment_and_whitespace_are_stripped() {
        let did = format!("  did:ethr:sepolia:{MIXED}#controller ");
        assert_eq!(address_from_did(&did).unwrap(), MIXED);
    }

    #[test]
    fn test_rejects_non_hex_address() {
        let did = "did:ethr:sepolia:0xZZ9Fd6e51aad88F6F4ce6aB8827279cffFb92266";
        assert!(matches!(
            address_from_did(did),
            Err(DidCodecError::MalformedAddress(_))
        ));
    }

    #[test]
    fn test_rejects_wrong_length_and_missing_prefix() {
        assert!(address_from_did("did:ethr:sepolia:0x1234").is_err());
        assert!(address_from_did("did:ethr:sepolia:f39Fd6e51aad88F6F4ce6aB8827279cffFb92266").is_err());
        assert!(address_from_did(&format!("did:ethr:sepolia:{MIXED}00")).is_err());
    }

    #[test]
    fn test_rejects_other_methods() {
        let err = address_from_did(&format!("did:web:{MIXED}")).unwrap_err();
        assert_eq!(err, DidCodecError::UnsupportedMethod("web".to_string()));
    }

    #[test]
    fn test_rejects_non_did() {
        assert_eq!(address_from_did(""), Err(DidCodecError::Empty));
        assert!(matches!(
            address_from_did(MIXED),
            Err(DidCodecError::NotADid(_))
        ));
    }

    #[test]
    fn test_new_checksums_address() {
        let address = Address::from_str(&MIXED.to_lowercase()).unwrap();
        let did = EthrDid::new("sepolia", address);
        assert_eq!(did.to_string(), format!("did:ethr:sepolia:{MIXED}"));
        assert_eq!(did.address(), address);
    }

    #[test]
    fn test_with_address_keeps_form() {
        let other = Address::repeat_byte(0xad);

        let legacy: EthrDid = format!("did:ethr:{MIXED}").parse().unwrap();
        assert_eq!(
            legacy.with_address(other).to_string(),
            format!("did:ethr:{}", other.to_checksum(None))
        );

        let sepolia: EthrDid = format!("did:ethr:sepolia:{MIXED}").parse().unwrap();
        assert_eq!(
            sepolia.with_address(other).to_string(),
            format!("did:ethr:sepolia:{}", other.to_checksum(None))
        );
    }
}
