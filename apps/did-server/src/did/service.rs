// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DID orchestration.
//!
//! [`DidService`] composes the registry, the codec and the resolver into the
//! five operations exposed over HTTP. Every write is sent by the admin key
//! and awaited until mined; steps within one call run strictly in order.
//!
//! Before any write the admin identity must be its own registry owner.
//! This is checked on every mutating call and repaired when possible.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256};

use super::codec::{DidCodecError, EthrDid};
use super::document::DidDocument;
use super::resolver::Resolver;
use crate::blockchain::{
    generate_identity_key, name_to_bytes32,
    signing::{owner_change_digest, sign_registry_digest},
    DidRegistry, RegistryError, TxOutcome,
};

/// Attribute validity window: one year.
pub const ATTRIBUTE_VALIDITY_SECS: u64 = 365 * 24 * 60 * 60;

/// Gas ceiling for `setAttribute`.
pub const ATTRIBUTE_GAS_LIMIT: u64 = 150_000;

/// Longest attribute name that fits a zero-terminated `bytes32`.
pub const MAX_ATTRIBUTE_NAME_LEN: usize = 31;

/// Attribute under which a registered DID's public key is published.
pub const PUBLIC_KEY_ATTRIBUTE: &str = "did/pub/Secp256k1/veriKey/hex";

/// Result of [`DidService::register_did`].
#[derive(Debug, Clone)]
pub struct DidRegistration {
    pub did: String,
    pub address: Address,
    /// Uncompressed public key, `0x`-prefixed hex.
    pub public_key: String,
    /// Private key, `0x`-prefixed hex. Returned once and never stored.
    pub private_key: String,
    /// Hash of the `changeOwnerSigned` transaction.
    pub transaction_hash: B256,
    /// Hash of the public key attribute write, if it succeeded.
    pub public_key_transaction_hash: Option<B256>,
}

/// did:ethr registration and lifecycle service.
pub struct DidService {
    registry: Arc<dyn DidRegistry>,
    resolver: Resolver,
    network: String,
}

impl DidService {
    pub fn new(registry: Arc<dyn DidRegistry>, network: impl Into<String>) -> Self {
        let network = network.into();
        Self {
            resolver: Resolver::new(registry.clone(), network.clone()),
            registry,
            network,
        }
    }

    /// Network segment of DIDs issued by this service.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Registry this service writes to.
    pub fn registry(&self) -> &Arc<dyn DidRegistry> {
        &self.registry
    }

    /// Make sure the admin identity owns itself before writing.
    ///
    /// When another address owns the admin identity a `changeOwner` back to
    /// the admin is attempted; the registry rejects it unless the admin is
    /// still authorized, in which case the call fails.
    pub async fn ensure_admin_self_owned(&self) -> Result<(), DidError> {
        let admin = self.registry.admin();
        let owner = self.registry.identity_owner(admin).await?;
        if owner == admin {
            return Ok(());
        }

        tracing::warn!(
            admin = %admin,
            owner = %owner,
            "Admin identity is not self-owned, reclaiming"
        );

        self.registry
            .change_owner(admin, admin)
            .await
            .map_err(|source| DidError::AdminBootstrap {
                admin,
                owner,
                source,
            })?;

        Ok(())
    }

    /// Create a new identity and hand its ownership to the admin.
    ///
    /// The ownership transfer is signed by the new key and relayed by the
    /// admin. Publishing the public key afterwards is best effort: a failure
    /// is logged and the registration still succeeds.
    pub async fn register_did(&self) -> Result<DidRegistration, DidError> {
        self.ensure_admin_self_owned().await?;

        let admin = self.registry.admin();
        let key = generate_identity_key();
        let did = EthrDid::new(&self.network, key.address);

        let current_owner = self.registry.identity_owner(key.address).await?;
        let nonce = self.registry.nonce(current_owner).await?;
        let digest = owner_change_digest(self.registry.address(), nonce, key.address, admin);
        let signature = sign_registry_digest(&key.signer, &digest)?;

        let outcome = self
            .registry
            .change_owner_signed(key.address, signature, admin)
            .await?;

        tracing::info!(
            did = %did,
            tx_hash = %outcome.tx_hash,
            "Registered DID"
        );

        let public_key_transaction_hash = match self
            .publish_public_key(&key.address, &key.public_key)
            .await
        {
            Ok(attribute) => Some(attribute.tx_hash),
            Err(e) => {
                tracing::warn!(
                    did = %did,
                    error = %e,
                    "Failed to publish public key attribute, continuing"
                );
                None
            }
        };

        Ok(DidRegistration {
            did: did.to_string(),
            address: key.address,
            public_key: key.public_key_hex(),
            private_key: key.private_key_hex(),
            transaction_hash: outcome.tx_hash,
            public_key_transaction_hash,
        })
    }

    async fn publish_public_key(
        &self,
        identity: &Address,
        public_key: &Bytes,
    ) -> Result<TxOutcome, DidError> {
        let name = encode_attribute_name(PUBLIC_KEY_ATTRIBUTE)?;
        Ok(self
            .registry
            .set_attribute(
                *identity,
                name,
                public_key.clone(),
                ATTRIBUTE_VALIDITY_SECS,
                ATTRIBUTE_GAS_LIMIT,
            )
            .await?)
    }

    /// Set an attribute on an identity the admin owns.
    pub async fn add_attribute(
        &self,
        did: &str,
        name: &str,
        value: &str,
    ) -> Result<TxOutcome, DidError> {
        let did = self.parse_did(did)?;
        let name_word = encode_attribute_name(name)?;

        self.ensure_admin_self_owned().await?;

        let admin = self.registry.admin();
        let owner = self.registry.identity_owner(did.address()).await?;
        if owner != admin {
            return Err(DidError::NotOwner {
                admin,
                identity: did.address(),
                owner,
            });
        }

        let outcome = self
            .registry
            .set_attribute(
                did.address(),
                name_word,
                encode_attribute_value(value),
                ATTRIBUTE_VALIDITY_SECS,
                ATTRIBUTE_GAS_LIMIT,
            )
            .await?;

        tracing::info!(did = %did, attribute = name, tx_hash = %outcome.tx_hash, "Attribute added");
        Ok(outcome)
    }

    /// Revoke an attribute by name.
    ///
    /// Sends `revokeAttribute` with an empty value and leaves authorization
    /// to the registry's `onlyOwner` check.
    pub async fn remove_attribute(&self, did: &str, name: &str) -> Result<TxOutcome, DidError> {
        let did = self.parse_did(did)?;
        let name_word = encode_attribute_name(name)?;

        self.ensure_admin_self_owned().await?;

        let outcome = self
            .registry
            .revoke_attribute(did.address(), name_word, Bytes::new())
            .await?;

        tracing::info!(did = %did, attribute = name, tx_hash = %outcome.tx_hash, "Attribute revoked");
        Ok(outcome)
    }

    /// Deactivate a DID by transferring ownership to the zero address.
    pub async fn delete_did(&self, did: &str) -> Result<TxOutcome, DidError> {
        let did = self.parse_did(did)?;

        self.ensure_admin_self_owned().await?;

        let outcome = self
            .registry
            .change_owner(did.address(), Address::ZERO)
            .await?;

        tracing::info!(did = %did, tx_hash = %outcome.tx_hash, "DID deactivated");
        Ok(outcome)
    }

    /// Resolve a DID document; `None` when no document exists.
    pub async fn resolve_did(&self, did: &str) -> Result<Option<DidDocument>, DidError> {
        let did: EthrDid = did.parse()?;
        self.resolver.resolve(&did).await
    }

    fn parse_did(&self, did: &str) -> Result<EthrDid, DidError> {
        let did: EthrDid = did.parse()?;
        match did.network() {
            Some(network) if network != self.network => Err(DidError::UnknownNetwork {
                network: network.to_string(),
                expected: self.network.clone(),
            }),
            _ => Ok(did),
        }
    }
}

/// Validate and encode an attribute name as `bytes32`.
pub fn encode_attribute_name(name: &str) -> Result<B256, DidError> {
    if name.is_empty() {
        return Err(DidError::EmptyAttributeName);
    }
    if name.len() > MAX_ATTRIBUTE_NAME_LEN {
        return Err(DidError::AttributeNameTooLong {
            name: name.to_string(),
            len: name.len(),
        });
    }
    name_to_bytes32(name).ok_or_else(|| DidError::AttributeNameTooLong {
        name: name.to_string(),
        len: name.len(),
    })
}

/// Encode an attribute value: `0x` hex is decoded, anything else is UTF-8.
pub fn encode_attribute_value(value: &str) -> Bytes {
    if let Some(hex) = value.strip_prefix("0x") {
        if let Ok(bytes) = alloy::hex::decode(hex) {
            return Bytes::from(bytes);
        }
    }
    Bytes::copy_from_slice(value.as_bytes())
}

/// Errors returned by [`DidService`].
#[derive(Debug, thiserror::Error)]
pub enum DidError {
    #[error(transparent)]
    Codec(#[from] DidCodecError),

    #[error("DID network `{network}` is not served here (expected `{expected}`)")]
    UnknownNetwork { network: String, expected: String },

    #[error("Attribute name must not be empty")]
    EmptyAttributeName,

    #[error("Attribute name `{name}` is {len} bytes long; at most 31 are allowed")]
    AttributeNameTooLong { name: String, len: usize },

    #[error("Admin {admin} is not the owner of identity {identity} (owner is {owner})")]
    NotOwner {
        admin: Address,
        identity: Address,
        owner: Address,
    },

    #[error("Admin identity {admin} is owned by {owner} and could not be reclaimed: {source}")]
    AdminBootstrap {
        admin: Address,
        owner: Address,
        #[source]
        source: RegistryError,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
