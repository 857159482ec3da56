// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registry types and constants.

use alloy::primitives::{Address, Bytes, B256};

/// EthereumDIDRegistry deployment on Sepolia, used when `REGISTRY_ADDRESS`
/// is not set.
pub const DEFAULT_REGISTRY_ADDRESS: Address =
    alloy::primitives::address!("0x03d5003bf0e79C5F5223588F347ebA39AfbC3818");

/// Network segment written into generated DIDs when `DID_NETWORK` is unset.
pub const DEFAULT_DID_NETWORK: &str = "sepolia";

/// Canonical EIP-4337 EntryPoint (v0.6).
pub const DEFAULT_ENTRY_POINT: Address =
    alloy::primitives::address!("0x5FF137D4b0FDCD49DcA30c7CF57E578a026d2789");

/// Result of a mined registry write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    /// Transaction hash
    pub tx_hash: B256,
    /// Block the transaction was included in
    pub block_number: Option<u64>,
}

/// Signature over a `changeOwnerSigned` digest, split the way the registry
/// expects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnerChangeSignature {
    /// Recovery id, 27 or 28
    pub v: u8,
    pub r: B256,
    pub s: B256,
}

/// A decoded registry event for one identity.
///
/// `previous_change` is the block of the preceding change for the same
/// identity, or 0 for the first one. Resolution walks this chain backwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    OwnerChanged {
        owner: Address,
        previous_change: u64,
    },
    DelegateChanged {
        delegate_type: B256,
        delegate: Address,
        valid_to: u64,
        previous_change: u64,
    },
    AttributeChanged {
        name: B256,
        value: Bytes,
        valid_to: u64,
        previous_change: u64,
    },
}

impl RegistryEvent {
    /// Block of the preceding change for the same identity.
    pub fn previous_change(&self) -> u64 {
        match self {
            RegistryEvent::OwnerChanged {
                previous_change, ..
            }
            | RegistryEvent::DelegateChanged {
                previous_change, ..
            }
            | RegistryEvent::AttributeChanged {
                previous_change, ..
            } => *previous_change,
        }
    }
}

/// Encode a registry name (attribute name or delegate type) as `bytes32`,
/// right-padded with zeros.
///
/// Returns `None` when the name does not fit with a terminating zero byte,
/// i.e. when it is longer than 31 bytes.
pub fn name_to_bytes32(name: &str) -> Option<B256> {
    let bytes = name.as_bytes();
    if bytes.len() > 31 {
        return None;
    }
    let mut word = [0u8; 32];
    word[..bytes.len()].copy_from_slice(bytes);
    Some(B256::from(word))
}

/// Decode a `bytes32` registry name back to a string, dropping the zero
/// padding. Invalid UTF-8 is replaced lossily.
pub fn bytes32_to_name(word: &B256) -> String {
    let end = word.iter().position(|b| *b == 0).unwrap_or(32);
    String::from_utf8_lossy(&word[..end]).into_owned()
}
