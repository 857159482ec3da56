// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the EthereumDIDRegistry.
//!
//! This module provides:
//! - The registry contract binding and client
//! - Admin key parsing and identity key generation
//! - Meta-transaction (`changeOwnerSigned`) signing

#[cfg(test)]
pub mod memory;
pub mod registry;
pub mod signing;
pub mod types;

pub use registry::{DidRegistry, RegistryClient, RegistryError};
pub use signing::{generate_identity_key, parse_private_key, GeneratedKey};
pub use types::*;
