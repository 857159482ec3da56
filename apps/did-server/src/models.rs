// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response bodies of the REST API. Field names are camelCase
//! on the wire. All types derive `ToSchema` for the OpenAPI document.
//!
//! ## Model Categories
//!
//! - **DID**: registration, attribute and deactivation payloads
//! - **Paymaster**: user operation sponsorship

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::did::DidRegistration;

// =============================================================================
// DID Models
// =============================================================================

/// A newly registered DID and its key material.
///
/// The private key is only ever returned here; the service keeps no copy.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDidResponse {
    /// `did:ethr:<network>:<address>`.
    pub did: String,
    /// Checksummed identity address.
    pub address: String,
    /// Uncompressed secp256k1 public key, `0x`-prefixed hex.
    pub public_key: String,
    /// Private key, `0x`-prefixed hex.
    pub private_key: String,
    /// Hash of the ownership transfer transaction.
    pub transaction_hash: String,
    /// Hash of the public key attribute transaction, when it was published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_transaction_hash: Option<String>,
}

impl From<DidRegistration> for RegisterDidResponse {
    fn from(value: DidRegistration) -> Self {
        Self {
            did: value.did,
            address: value.address.to_checksum(None),
            public_key: value.public_key,
            private_key: value.private_key,
            transaction_hash: value.transaction_hash.to_string(),
            public_key_transaction_hash: value.public_key_transaction_hash.map(|h| h.to_string()),
        }
    }
}

/// Request to set an attribute on a DID.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAttributeRequest {
    pub did: String,
    /// At most 31 bytes, e.g. `did/svc/MessagingService`.
    pub attribute_name: String,
    /// `0x`-prefixed hex is stored as bytes, anything else as UTF-8.
    pub attribute_value: String,
}

/// Request to revoke an attribute from a DID.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAttributeRequest {
    pub did: String,
    pub attribute_name: String,
}

/// Request to deactivate a DID.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteDidRequest {
    pub did: String,
}

/// Outcome of a registry write.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub success: bool,
    pub transaction_hash: String,
}

impl TransactionResponse {
    pub fn mined(transaction_hash: impl ToString) -> Self {
        Self {
            success: true,
            transaction_hash: transaction_hash.to_string(),
        }
    }
}

// =============================================================================
// Paymaster Models
// =============================================================================

/// EIP-4337 v0.6 user operation in its JSON-RPC form.
///
/// Quantities accept decimal or `0x` hex; byte fields are `0x` hex.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserOperationDto {
    pub sender: String,
    pub nonce: String,
    #[serde(default)]
    pub init_code: String,
    #[serde(default)]
    pub call_data: String,
    pub call_gas_limit: String,
    pub verification_gas_limit: String,
    pub pre_verification_gas: String,
    pub max_fee_per_gas: String,
    pub max_priority_fee_per_gas: String,
    #[serde(default)]
    pub paymaster_and_data: String,
    #[serde(default)]
    pub signature: String,
}

/// Request to sponsor a user operation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SponsorRequest {
    pub user_operation: UserOperationDto,
    /// Unix timestamp after which the sponsorship expires. Defaults to one
    /// hour from now.
    #[serde(default)]
    pub valid_until: Option<u64>,
    /// Unix timestamp before which the sponsorship is not valid.
    #[serde(default)]
    pub valid_after: Option<u64>,
}

/// Signed sponsorship, ready to be placed in `paymasterAndData`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SponsorResponse {
    pub paymaster: String,
    pub paymaster_and_data: String,
    pub valid_until: u64,
    pub valid_after: u64,
    /// Hash signed by the paymaster signer.
    pub hash: String,
    /// EntryPoint `getUserOpHash` of the sponsored operation; the account
    /// owner signs this.
    pub user_op_hash: String,
}
