// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! did:ethr resolution from registry history.
//!
//! The registry stores, per identity, the block of its latest change, and
//! every event carries the block of the change before it. Resolution reads
//! `changed(identity)` and follows `previousChange` back to 0, then replays
//! the events oldest-first into a document.
//!
//! Replay rules:
//! - delegates and `did/pub/...` attributes become verification methods,
//!   `did/svc/<type>` attributes become services;
//! - an entry whose `validTo` is not after the current time removes the
//!   matching entry; an attribute revocation with an empty value removes
//!   every entry under that name;
//! - when the latest `DIDOwnerChanged` names the zero address the DID is
//!   deactivated and no document is produced. The registry's
//!   `identityOwner` cannot tell: it falls back to the identity itself.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use base64ct::Encoding;

use super::codec::EthrDid;
use super::document::{
    DidDocument, Service, VerificationMethod, DID_CONTEXT, SECP256K1_RECOVERY_CONTEXT,
};
use super::service::DidError;
use crate::blockchain::{bytes32_to_name, DidRegistry, RegistryError, RegistryEvent};

const RECOVERY_METHOD: &str = "EcdsaSecp256k1RecoveryMethod2020";

/// Resolves `did:ethr` DIDs against one registry.
#[derive(Clone)]
pub struct Resolver {
    registry: Arc<dyn DidRegistry>,
    network: String,
}

impl Resolver {
    pub fn new(registry: Arc<dyn DidRegistry>, network: impl Into<String>) -> Self {
        Self {
            registry,
            network: network.into(),
        }
    }

    /// Network name this resolver serves.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// All registry events for an identity, oldest first.
    pub async fn history(&self, identity: Address) -> Result<Vec<RegistryEvent>, RegistryError> {
        let mut blocks: Vec<Vec<RegistryEvent>> = Vec::new();
        let mut next = self.registry.changed(identity).await?;

        while next > 0 {
            let block = next;
            let events = self.registry.events_at(identity, block).await?;
            next = 0;
            for event in &events {
                let previous = event.previous_change();
                // Pointers only ever go backwards; anything else is ignored to
                // guarantee termination.
                if previous < block && previous > next {
                    next = previous;
                }
            }
            blocks.push(events);
        }

        Ok(blocks.into_iter().rev().flatten().collect())
    }

    /// Resolve a DID. Returns `None` for deactivated identities.
    pub async fn resolve(&self, did: &EthrDid) -> Result<Option<DidDocument>, DidError> {
        if let Some(network) = did.network() {
            if network != self.network {
                return Err(DidError::UnknownNetwork {
                    network: network.to_string(),
                    expected: self.network.clone(),
                });
            }
        }

        let identity = did.address();
        let history = self.history(identity).await?;
        if is_deactivated(&history) {
            tracing::debug!(did = %did, "DID is deactivated");
            return Ok(None);
        }

        let owner = self.registry.identity_owner(identity).await?;
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        Ok(Some(build_document(
            &did.to_string(),
            self.registry.chain_id(),
            owner,
            &did.with_address(owner).to_string(),
            &history,
            now,
        )))
    }
}

/// Verification relationship of an attribute key.
#[derive(Clone, Copy, PartialEq, Eq)]
enum KeyPurpose {
    VeriKey,
    SigAuth,
    Enc,
}

enum Entry {
    Key {
        method: VerificationMethod,
        purpose: KeyPurpose,
    },
    Service(Service),
}

struct Tracked {
    /// Event kind, name, and value; a later event with the same key replaces
    /// or revokes this entry.
    key: String,
    name: String,
    entry: Entry,
}

/// Whether the most recent owner change handed the identity to the zero
/// address.
fn is_deactivated(history: &[RegistryEvent]) -> bool {
    history
        .iter()
        .rev()
        .find_map(|event| match event {
            RegistryEvent::OwnerChanged { owner, .. } => Some(*owner == Address::ZERO),
            _ => None,
        })
        .unwrap_or(false)
}

fn build_document(
    did: &str,
    chain_id: u64,
    owner: Address,
    owner_did: &str,
    history: &[RegistryEvent],
    now: u64,
) -> DidDocument {
    let mut tracked: Vec<Tracked> = Vec::new();
    let mut delegate_count = 0u32;
    let mut service_count = 0u32;

    for event in history {
        match event {
            RegistryEvent::OwnerChanged { .. } => {}
            RegistryEvent::DelegateChanged {
                delegate_type,
                delegate,
                valid_to,
                ..
            } => {
                let delegate_type = bytes32_to_name(delegate_type);
                let key = format!("delegate-{delegate_type}-{delegate}");
                tracked.retain(|t| t.key != key);
                if *valid_to <= now {
                    continue;
                }
                let purpose = match delegate_type.as_str() {
                    "veriKey" | "Secp256k1VerificationKey2018" => KeyPurpose::VeriKey,
                    "sigAuth" | "Secp256k1SignatureAuthentication2018" => KeyPurpose::SigAuth,
                    _ => continue,
                };
                delegate_count += 1;
                tracked.push(Tracked {
                    key,
                    name: delegate_type,
                    entry: Entry::Key {
                        method: VerificationMethod {
                            id: format!("{did}#delegate-{delegate_count}"),
                            method_type: RECOVERY_METHOD.to_string(),
                            controller: did.to_string(),
                            blockchain_account_id: Some(format!(
                                "eip155:{chain_id}:{}",
                                delegate.to_checksum(None)
                            )),
                            public_key_hex: None,
                            public_key_base64: None,
                        },
                        purpose,
                    },
                });
            }
            RegistryEvent::AttributeChanged {
                name,
                value,
                valid_to,
                ..
            } => {
                let name = bytes32_to_name(name);
                let key = format!("attribute-{name}-{value}");
                if *valid_to <= now {
                    if value.is_empty() {
                        tracked.retain(|t| t.name != name);
                    } else {
                        tracked.retain(|t| t.key != key);
                    }
                    continue;
                }
                tracked.retain(|t| t.key != key);

                let parts: Vec<&str> = name.split('/').collect();
                match parts.as_slice() {
                    ["did", "pub", algorithm, purpose, encoding] => {
                        let Some((method_type, purpose)) = attribute_key_type(algorithm, purpose)
                        else {
                            continue;
                        };
                        delegate_count += 1;
                        let (public_key_hex, public_key_base64) = encode_key(encoding, value);
                        tracked.push(Tracked {
                            key,
                            name: name.clone(),
                            entry: Entry::Key {
                                method: VerificationMethod {
                                    id: format!("{did}#delegate-{delegate_count}"),
                                    method_type: method_type.to_string(),
                                    controller: did.to_string(),
                                    blockchain_account_id: None,
                                    public_key_hex,
                                    public_key_base64,
                                },
                                purpose,
                            },
                        });
                    }
                    ["did", "svc", service_type] => {
                        service_count += 1;
                        tracked.push(Tracked {
                            key,
                            name: name.clone(),
                            entry: Entry::Service(Service {
                                id: format!("{did}#service-{service_count}"),
                                service_type: service_type.to_string(),
                                service_endpoint: service_endpoint(value),
                            }),
                        });
                    }
                    _ => {}
                }
            }
        }
    }

    let controller_id = format!("{did}#controller");
    let mut verification_method = vec![VerificationMethod {
        id: controller_id.clone(),
        method_type: RECOVERY_METHOD.to_string(),
        controller: did.to_string(),
        blockchain_account_id: Some(format!("eip155:{chain_id}:{}", owner.to_checksum(None))),
        public_key_hex: None,
        public_key_base64: None,
    }];
    let mut authentication = vec![controller_id.clone()];
    let mut assertion_method = vec![controller_id];
    let mut key_agreement = Vec::new();
    let mut service = Vec::new();

    for tracked in tracked {
        match tracked.entry {
            Entry::Key { method, purpose } => {
                match purpose {
                    KeyPurpose::Enc => key_agreement.push(method.id.clone()),
                    KeyPurpose::SigAuth => {
                        authentication.push(method.id.clone());
                        assertion_method.push(method.id.clone());
                    }
                    KeyPurpose::VeriKey => assertion_method.push(method.id.clone()),
                }
                verification_method.push(method);
            }
            Entry::Service(entry) => service.push(entry),
        }
    }

    DidDocument {
        context: vec![
            DID_CONTEXT.to_string(),
            SECP256K1_RECOVERY_CONTEXT.to_string(),
        ],
        id: did.to_string(),
        controller: owner_did.to_string(),
        verification_method,
        authentication,
        assertion_method,
        key_agreement,
        service,
    }
}

fn attribute_key_type(algorithm: &str, purpose: &str) -> Option<(&'static str, KeyPurpose)> {
    let purpose = match purpose {
        "veriKey" => KeyPurpose::VeriKey,
        "sigAuth" => KeyPurpose::SigAuth,
        "enc" => KeyPurpose::Enc,
        _ => return None,
    };
    let method_type = match (algorithm, purpose) {
        ("Secp256k1", KeyPurpose::SigAuth) => "EcdsaSecp256k1SignatureAuthentication2018",
        ("Secp256k1", _) => "EcdsaSecp256k1VerificationKey2019",
        ("Ed25519", _) => "Ed25519VerificationKey2018",
        ("X25519", _) => "X25519KeyAgreementKey2019",
        _ => return None,
    };
    Some((method_type, purpose))
}

fn encode_key(encoding: &str, value: &Bytes) -> (Option<String>, Option<String>) {
    match encoding {
        "base64" => (
            None,
            Some(base64ct::Base64::encode_string(value)),
        ),
        _ => (Some(alloy::hex::encode(value)), None),
    }
}

fn service_endpoint(value: &Bytes) -> serde_json::Value {
    let text = String::from_utf8_lossy(value).into_owned();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => json,
        _ => serde_json::Value::String(text),
    }
}
