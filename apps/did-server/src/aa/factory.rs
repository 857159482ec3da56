// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Counterfactual account factory.
//!
//! Accounts are ERC-1967 proxies deployed with CREATE2, so an account's
//! address is known before deployment from `(owner, salt)` alone.

use std::collections::HashMap;

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::{SolCall, SolValue},
};

use super::{
    account::SimpleAccount,
    user_op::ISimpleAccount,
};

/// Deploys [`SimpleAccount`]s at deterministic addresses.
#[derive(Debug, Clone)]
pub struct AccountFactory {
    address: Address,
    entry_point: Address,
    implementation: Address,
    proxy_creation_code: Bytes,
    accounts: HashMap<Address, SimpleAccount>,
    deployments: usize,
}

impl AccountFactory {
    /// `proxy_creation_code` is the ERC1967Proxy creation bytecode; the
    /// constructor arguments `(implementation, initialize(owner))` are
    /// appended per account.
    pub fn new(
        address: Address,
        entry_point: Address,
        implementation: Address,
        proxy_creation_code: Bytes,
    ) -> Self {
        Self {
            address,
            entry_point,
            implementation,
            proxy_creation_code,
            accounts: HashMap::new(),
            deployments: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Number of accounts actually deployed.
    pub fn deployments(&self) -> usize {
        self.deployments
    }

    /// Full init code of the proxy for `owner`.
    pub fn init_code(&self, owner: Address) -> Vec<u8> {
        let initialize = ISimpleAccount::initializeCall { anOwner: owner }.abi_encode();
        let constructor_args = (self.implementation, Bytes::from(initialize)).abi_encode_params();

        let mut code = Vec::with_capacity(self.proxy_creation_code.len() + constructor_args.len());
        code.extend_from_slice(&self.proxy_creation_code);
        code.extend_from_slice(&constructor_args);
        code
    }

    /// Counterfactual address of the account for `(owner, salt)`.
    pub fn get_address(&self, owner: Address, salt: U256) -> Address {
        self.address
            .create2_from_code(salt.to_be_bytes::<32>(), self.init_code(owner))
    }

    /// Deploy the account for `(owner, salt)`, or return the existing one.
    pub fn create_account(&mut self, owner: Address, salt: U256) -> &mut SimpleAccount {
        let address = self.get_address(owner, salt);
        let entry_point = self.entry_point;

        if !self.accounts.contains_key(&address) {
            tracing::info!(account = %address, owner = %owner, "Deploying account");
            self.deployments += 1;
        }

        self.accounts
            .entry(address)
            .or_insert_with(|| SimpleAccount::new(address, owner, entry_point))
    }

    /// Account previously deployed at `address`.
    pub fn account(&self, address: Address) -> Option<&SimpleAccount> {
        self.accounts.get(&address)
    }

    pub fn account_mut(&mut self, address: Address) -> Option<&mut SimpleAccount> {
        self.accounts.get_mut(&address)
    }
}
