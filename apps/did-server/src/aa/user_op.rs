// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-4337 user operations (EntryPoint v0.6 layout).

use alloy::{
    primitives::{keccak256, Address, B256, U256},
    sol,
    sol_types::SolValue,
};

sol! {
    /// User operation as submitted to the EntryPoint.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct UserOperation {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        uint256 callGasLimit;
        uint256 verificationGasLimit;
        uint256 preVerificationGas;
        uint256 maxFeePerGas;
        uint256 maxPriorityFeePerGas;
        bytes paymasterAndData;
        bytes signature;
    }

    /// Calls understood by the simple account.
    interface ISimpleAccount {
        function initialize(address anOwner) external;
        function execute(address dest, uint256 value, bytes func) external;
        function executeBatch(address[] dest, bytes[] func) external;
    }
}

impl UserOperation {
    /// ABI encoding of every field except the signature, with dynamic
    /// fields replaced by their hashes.
    pub fn pack(&self) -> Vec<u8> {
        (
            self.sender,
            self.nonce,
            keccak256(&self.initCode),
            keccak256(&self.callData),
            self.callGasLimit,
            self.verificationGasLimit,
            self.preVerificationGas,
            self.maxFeePerGas,
            self.maxPriorityFeePerGas,
            keccak256(&self.paymasterAndData),
        )
            .abi_encode_params()
    }

    /// Hash the account signs: binds the operation to one EntryPoint and chain.
    pub fn hash(&self, entry_point: Address, chain_id: u64) -> B256 {
        keccak256(
            (keccak256(self.pack()), entry_point, U256::from(chain_id)).abi_encode_params(),
        )
    }
}
