// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Key handling and meta-transaction signing.
//!
//! This module parses the admin key, generates fresh identity keys, and
//! produces the raw-digest signature the registry's `changeOwnerSigned`
//! entry point verifies.

use alloy::{
    primitives::{keccak256, Address, Bytes, B256, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use k256::ecdsa::VerifyingKey;

use super::registry::RegistryError;
use super::types::OwnerChangeSignature;

/// A freshly generated secp256k1 identity key.
pub struct GeneratedKey {
    /// Signer holding the private key
    pub signer: PrivateKeySigner,
    /// Ethereum address derived from the public key
    pub address: Address,
    /// Uncompressed SEC1 public key (65 bytes, `0x04` prefix)
    pub public_key: Bytes,
}

impl GeneratedKey {
    /// Private key as `0x`-prefixed hex.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", alloy::hex::encode(self.signer.to_bytes()))
    }

    /// Public key as `0x`-prefixed hex.
    pub fn public_key_hex(&self) -> String {
        format!("0x{}", alloy::hex::encode(&self.public_key))
    }
}

/// Create a signer from a hex private key, with or without `0x` prefix.
pub fn parse_private_key(private_key_hex: &str) -> Result<PrivateKeySigner, RegistryError> {
    let trimmed = private_key_hex.trim();
    let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| RegistryError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| RegistryError::InvalidPrivateKey(e.to_string()))
}

/// Generate a new random identity key.
pub fn generate_identity_key() -> GeneratedKey {
    let signer = PrivateKeySigner::random();
    let public_key = public_key_bytes(&signer);
    let address = signer.address();

    GeneratedKey {
        signer,
        address,
        public_key,
    }
}

/// Uncompressed public key bytes for a signer.
pub fn public_key_bytes(signer: &PrivateKeySigner) -> Bytes {
    let verifying_key: &VerifyingKey = signer.credential().verifying_key();
    let encoded = verifying_key.to_encoded_point(false);
    Bytes::copy_from_slice(encoded.as_bytes())
}

/// Digest signed by the current owner to authorize `changeOwnerSigned`.
///
/// `keccak256(0x19 ‖ 0x00 ‖ registry ‖ nonce ‖ identity ‖ "changeOwner" ‖ newOwner)`,
/// where `nonce` is the registry nonce of the identity's current owner.
pub fn owner_change_digest(
    registry: Address,
    nonce: U256,
    identity: Address,
    new_owner: Address,
) -> B256 {
    let mut preimage = Vec::with_capacity(2 + 20 + 32 + 20 + 11 + 20);
    preimage.extend_from_slice(&[0x19, 0x00]);
    preimage.extend_from_slice(registry.as_slice());
    preimage.extend_from_slice(&nonce.to_be_bytes::<32>());
    preimage.extend_from_slice(identity.as_slice());
    preimage.extend_from_slice(b"changeOwner");
    preimage.extend_from_slice(new_owner.as_slice());
    keccak256(&preimage)
}

/// Sign a registry digest directly (no EIP-191 prefix).
pub fn sign_registry_digest(
    signer: &PrivateKeySigner,
    digest: &B256,
) -> Result<OwnerChangeSignature, RegistryError> {
    let signature = signer
        .sign_hash_sync(digest)
        .map_err(|e| RegistryError::Signing(e.to_string()))?;

    Ok(OwnerChangeSignature {
        v: 27 + u8::from(signature.v()),
        r: B256::from(signature.r().to_be_bytes::<32>()),
        s: B256::from(signature.s().to_be_bytes::<32>()),
    })
}

/// Recover the address that produced an [`OwnerChangeSignature`].
pub fn recover_registry_signer(
    digest: &B256,
    signature: &OwnerChangeSignature,
) -> Result<Address, RegistryError> {
    let parity = match signature.v {
        27 => false,
        28 => true,
        other => {
            return Err(RegistryError::Signing(format!(
                "invalid recovery id {other}"
            )))
        }
    };
    let sig = alloy::primitives::Signature::new(
        U256::from_be_bytes(signature.r.0),
        U256::from_be_bytes(signature.s.0),
        parity,
    );
    sig.recover_address_from_prehash(digest)
        .map_err(|e| RegistryError::Signing(e.to_string()))
}
