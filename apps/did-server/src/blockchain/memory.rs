// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory registry used by tests.
//!
//! Mirrors the contract's rules: `onlyOwner` writes, per-owner nonces for
//! signed owner changes, `changed` block pointers and per-block event logs.
//! Every successful write mines its own block.

use std::collections::HashMap;
use std::sync::Mutex;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;

use super::registry::{DidRegistry, RegistryError};
use super::signing::{owner_change_digest, recover_registry_signer};
use super::types::{OwnerChangeSignature, RegistryEvent, TxOutcome};

#[derive(Default)]
struct Chain {
    block: u64,
    owners: HashMap<Address, Address>,
    nonces: HashMap<Address, U256>,
    changed: HashMap<Address, u64>,
    logs: HashMap<(Address, u64), Vec<RegistryEvent>>,
    writes: usize,
    fail_attribute_writes: bool,
}

impl Chain {
    /// `identityOwner`: an unset or zero owner falls back to the identity.
    fn owner_of(&self, identity: Address) -> Address {
        match self.owners.get(&identity) {
            Some(owner) if *owner != Address::ZERO => *owner,
            _ => identity,
        }
    }

    fn mine(&mut self, identity: Address, event: RegistryEvent) -> TxOutcome {
        self.block += 1;
        self.writes += 1;
        self.changed.insert(identity, self.block);
        self.logs
            .entry((identity, self.block))
            .or_default()
            .push(event);

        TxOutcome {
            tx_hash: keccak256(self.block.to_be_bytes()),
            block_number: Some(self.block),
        }
    }

    fn previous_change(&self, identity: Address) -> u64 {
        self.changed.get(&identity).copied().unwrap_or(0)
    }

    fn only_owner(&self, identity: Address, actor: Address) -> Result<(), RegistryError> {
        if self.owner_of(identity) == actor {
            Ok(())
        } else {
            Err(RegistryError::Contract("bad_actor".to_string()))
        }
    }

    fn now() -> u64 {
        chrono::Utc::now().timestamp().max(0) as u64
    }
}

pub struct InMemoryRegistry {
    address: Address,
    admin: Address,
    chain_id: u64,
    chain: Mutex<Chain>,
}

impl InMemoryRegistry {
    pub fn new(admin: Address) -> Self {
        Self {
            address: Address::repeat_byte(0xd1),
            admin,
            chain_id: 11_155_111,
            chain: Mutex::new(Chain::default()),
        }
    }

    /// Number of transactions mined so far.
    pub fn writes(&self) -> usize {
        self.chain.lock().unwrap().writes
    }

    /// Make every subsequent `setAttribute` revert.
    pub fn fail_attribute_writes(&self, fail: bool) {
        self.chain.lock().unwrap().fail_attribute_writes = fail;
    }

    /// Force an owner, bypassing access control.
    pub fn force_owner(&self, identity: Address, owner: Address) {
        let mut chain = self.chain.lock().unwrap();
        let previous_change = chain.previous_change(identity);
        chain.owners.insert(identity, owner);
        chain.mine(
            identity,
            RegistryEvent::OwnerChanged {
                owner,
                previous_change,
            },
        );
    }

    /// Append a delegate event, bypassing access control.
    pub fn force_delegate(&self, identity: Address, delegate_type: B256, delegate: Address, validity: u64) {
        let mut chain = self.chain.lock().unwrap();
        let previous_change = chain.previous_change(identity);
        chain.mine(
            identity,
            RegistryEvent::DelegateChanged {
                delegate_type,
                delegate,
                valid_to: Chain::now() + validity,
                previous_change,
            },
        );
    }
}

#[async_trait]
impl DidRegistry for InMemoryRegistry {
    fn address(&self) -> Address {
        self.address
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn admin(&self) -> Address {
        self.admin
    }

    async fn block_number(&self) -> Result<u64, RegistryError> {
        Ok(self.chain.lock().unwrap().block)
    }

    async fn identity_owner(&self, identity: Address) -> Result<Address, RegistryError> {
        Ok(self.chain.lock().unwrap().owner_of(identity))
    }

    async fn nonce(&self, owner: Address) -> Result<U256, RegistryError> {
        Ok(self
            .chain
            .lock()
            .unwrap()
            .nonces
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn changed(&self, identity: Address) -> Result<u64, RegistryError> {
        Ok(self.chain.lock().unwrap().previous_change(identity))
    }

    async fn events_at(
        &self,
        identity: Address,
        block: u64,
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        Ok(self
            .chain
            .lock()
            .unwrap()
            .logs
            .get(&(identity, block))
            .cloned()
            .unwrap_or_default())
    }

    async fn change_owner(
        &self,
        identity: Address,
        new_owner: Address,
    ) -> Result<TxOutcome, RegistryError> {
        let mut chain = self.chain.lock().unwrap();
        chain.only_owner(identity, self.admin)?;
        let previous_change = chain.previous_change(identity);
        chain.owners.insert(identity, new_owner);
        Ok(chain.mine(
            identity,
            RegistryEvent::OwnerChanged {
                owner: new_owner,
                previous_change,
            },
        ))
    }

    async fn change_owner_signed(
        &self,
        identity: Address,
        signature: OwnerChangeSignature,
        new_owner: Address,
    ) -> Result<TxOutcome, RegistryError> {
        let mut chain = self.chain.lock().unwrap();
        let owner = chain.owner_of(identity);
        let nonce = chain.nonces.get(&owner).copied().unwrap_or_default();
        let digest = owner_change_digest(self.address, nonce, identity, new_owner);
        let signer = recover_registry_signer(&digest, &signature)?;
        chain.only_owner(identity, signer)?;

        chain.nonces.insert(owner, nonce + U256::from(1));
        let previous_change = chain.previous_change(identity);
        chain.owners.insert(identity, new_owner);
        Ok(chain.mine(
            identity,
            RegistryEvent::OwnerChanged {
                owner: new_owner,
                previous_change,
            },
        ))
    }

    async fn set_attribute(
        &self,
        identity: Address,
        name: B256,
        value: Bytes,
        validity: u64,
        _gas_limit: u64,
    ) -> Result<TxOutcome, RegistryError> {
        let mut chain = self.chain.lock().unwrap();
        if chain.fail_attribute_writes {
            return Err(RegistryError::Reverted {
                action: "setAttribute".to_string(),
                tx_hash: B256::ZERO,
            });
        }
        chain.only_owner(identity, self.admin)?;
        let previous_change = chain.previous_change(identity);
        Ok(chain.mine(
            identity,
            RegistryEvent::AttributeChanged {
                name,
                value,
                valid_to: Chain::now() + validity,
                previous_change,
            },
        ))
    }

    async fn revoke_attribute(
        &self,
        identity: Address,
        name: B256,
        value: Bytes,
    ) -> Result<TxOutcome, RegistryError> {
        let mut chain = self.chain.lock().unwrap();
        chain.only_owner(identity, self.admin)?;
        let previous_change = chain.previous_change(identity);
        Ok(chain.mine(
            identity,
            RegistryEvent::AttributeChanged {
                name,
                value,
                valid_to: 0,
                previous_change,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_owner_falls_back_to_identity() {
        let admin = Address::repeat_byte(0xad);
        let registry = InMemoryRegistry::new(admin);
        let identity = Address::repeat_byte(0x42);
        assert_eq!(registry.identity_owner(identity).await.unwrap(), identity);

        registry.force_owner(identity, admin);
        assert_eq!(registry.identity_owner(identity).await.unwrap(), admin);

        registry.change_owner(identity, Address::ZERO).await.unwrap();
        assert_eq!(registry.identity_owner(identity).await.unwrap(), identity);

        let block = registry.changed(identity).await.unwrap();
        assert_eq!(
            registry.events_at(identity, block).await.unwrap(),
            vec![RegistryEvent::OwnerChanged {
                owner: Address::ZERO,
                previous_change: block - 1,
            }]
        );
    }
}
