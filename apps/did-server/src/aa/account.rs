// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Single-owner smart-contract account.
//!
//! State model of the reference EIP-4337 account: one ECDSA owner, a
//! monotonic nonce, and an EntryPoint fixed at construction. Execution is
//! allowed from the EntryPoint or the owner; validation only from the
//! EntryPoint.

use alloy::primitives::{Address, Bytes, Signature, B256, U256};

use super::user_op::UserOperation;

/// Validation data returned when the signature does not match the owner.
pub const SIG_VALIDATION_FAILED: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Validation data for an accepted operation with no time range.
pub const SIG_VALIDATION_SUCCEEDED: U256 = U256::ZERO;

/// A call made by the account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Smart-contract wallet state.
#[derive(Debug, Clone)]
pub struct SimpleAccount {
    address: Address,
    owner: Address,
    entry_point: Address,
    nonce: U256,
    calls: Vec<Call>,
}

impl SimpleAccount {
    pub fn new(address: Address, owner: Address, entry_point: Address) -> Self {
        Self {
            address,
            owner,
            entry_point,
            nonce: U256::ZERO,
            calls: Vec::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    /// Nonce the next operation must carry.
    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    /// Calls executed so far, oldest first.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Validate a user operation on behalf of the EntryPoint.
    ///
    /// `op_hash` is [`UserOperation::hash`]; the owner signs it with the
    /// EIP-191 prefix. A wrong signer yields [`SIG_VALIDATION_FAILED`] and
    /// leaves the nonce untouched; an accepted operation advances the nonce
    /// by one.
    pub fn validate_user_op(
        &mut self,
        caller: Address,
        op: &UserOperation,
        op_hash: B256,
    ) -> Result<U256, AccountError> {
        if caller != self.entry_point {
            return Err(AccountError::NotFromEntryPoint(caller));
        }
        if op.sender != self.address {
            return Err(AccountError::WrongSender {
                expected: self.address,
                got: op.sender,
            });
        }
        if op.nonce != self.nonce {
            return Err(AccountError::InvalidNonce {
                expected: self.nonce,
                got: op.nonce,
            });
        }

        let signature = Signature::from_raw(&op.signature)
            .map_err(|e| AccountError::InvalidSignature(e.to_string()))?;
        let signer = signature
            .recover_address_from_msg(op_hash.as_slice())
            .map_err(|e| AccountError::InvalidSignature(e.to_string()))?;

        if signer != self.owner {
            tracing::debug!(
                account = %self.address,
                signer = %signer,
                "User operation signed by non-owner"
            );
            return Ok(SIG_VALIDATION_FAILED);
        }

        self.nonce += U256::from(1);
        Ok(SIG_VALIDATION_SUCCEEDED)
    }

    /// Execute a single call.
    pub fn execute(
        &mut self,
        caller: Address,
        target: Address,
        value: U256,
        data: Bytes,
    ) -> Result<&Call, AccountError> {
        self.require_from_entry_point_or_owner(caller)?;
        self.calls.push(Call {
            target,
            value,
            data,
        });
        Ok(&self.calls[self.calls.len() - 1])
    }

    /// Execute a sequence of zero-value calls.
    pub fn execute_batch(
        &mut self,
        caller: Address,
        targets: Vec<Address>,
        data: Vec<Bytes>,
    ) -> Result<(), AccountError> {
        self.require_from_entry_point_or_owner(caller)?;
        if targets.len() != data.len() {
            return Err(AccountError::WrongArrayLengths {
                targets: targets.len(),
                data: data.len(),
            });
        }
        self.calls
            .extend(targets.into_iter().zip(data).map(|(target, data)| Call {
                target,
                value: U256::ZERO,
                data,
            }));
        Ok(())
    }

    fn require_from_entry_point_or_owner(&self, caller: Address) -> Result<(), AccountError> {
        if caller == self.entry_point || caller == self.owner {
            Ok(())
        } else {
            Err(AccountError::NotOwnerOrEntryPoint(caller))
        }
    }
}

/// Errors raised by [`SimpleAccount`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("account: not Owner or EntryPoint (caller {0})")]
    NotOwnerOrEntryPoint(Address),

    #[error("account: not from EntryPoint (caller {0})")]
    NotFromEntryPoint(Address),

    #[error("account: operation sender {got} is not this account ({expected})")]
    WrongSender { expected: Address, got: Address },

    #[error("account: invalid nonce, expected {expected}, got {got}")]
    InvalidNonce { expected: U256, got: U256 },

    #[error("account: invalid signature: {0}")]
    InvalidSignature(String),

    #[error("wrong array lengths: {targets} targets, {data} calls")]
    WrongArrayLengths { targets: usize, data: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    const ENTRY_POINT: Address = Address::repeat_byte(0xee);
    const CHAIN_ID: u64 = 11_155_111;

    fn account(owner: &PrivateKeySigner) -> SimpleAccount {
        SimpleAccount::new(Address::repeat_byte(0xac), owner.address(), ENTRY_POINT)
    }

    fn signed_op(account: &SimpleAccount, signer: &PrivateKeySigner, nonce: u64) -> (UserOperation, B256) {
        let mut op = UserOperation {
            sender: account.address(),
            nonce: U256::from(nonce),
            ..Default::default()
        };
        let hash = op.hash(ENTRY_POINT, CHAIN_ID);
        let signature = signer.sign_message_sync(hash.as_slice()).unwrap();
        op.signature = Bytes::copy_from_slice(&signature.as_bytes());
        (op, hash)
    }

    #[test]
    fn owner_signature_is_accepted_and_nonce_advances() {
        let owner = PrivateKeySigner::random();
        let mut account = account(&owner);
        let (op, hash) = signed_op(&account, &owner, 0);

        let result = account.validate_user_op(ENTRY_POINT, &op, hash).unwrap();
        assert_eq!(result, SIG_VALIDATION_SUCCEEDED);
        assert_eq!(account.nonce(), U256::from(1));
    }

    #[test]
    fn foreign_signature_fails_validation_without_consuming_nonce() {
        let owner = PrivateKeySigner::random();
        let stranger = PrivateKeySigner::random();
        let mut account = account(&owner);
        let (op, hash) = signed_op(&account, &stranger, 0);

        let result = account.validate_user_op(ENTRY_POINT, &op, hash).unwrap();
        assert_eq!(result, SIG_VALIDATION_FAILED);
        assert_eq!(account.nonce(), U256::ZERO);
    }

    #[test]
    fn mismatched_nonce_is_rejected() {
        let owner = PrivateKeySigner::random();
        let mut account = account(&owner);
        let (op, hash) = signed_op(&account, &owner, 5);

        let err = account.validate_user_op(ENTRY_POINT, &op, hash).unwrap_err();
        assert_eq!(
            err,
            AccountError::InvalidNonce {
                expected: U256::ZERO,
                got: U256::from(5)
            }
        );
    }

    #[test]
    fn replayed_operation_is_rejected() {
        let owner = PrivateKeySigner::random();
        let mut account = account(&owner);
        let (op, hash) = signed_op(&account, &owner, 0);

        account.validate_user_op(ENTRY_POINT, &op, hash).unwrap();
        assert!(matches!(
            account.validate_user_op(ENTRY_POINT, &op, hash),
            Err(AccountError::InvalidNonce { .. })
        ));
    }

    #[test]
    fn validation_only_from_entry_point() {
        let owner = PrivateKeySigner::random();
        let mut account = account(&owner);
        let (op, hash) = signed_op(&account, &owner, 0);

        let err = account
            .validate_user_op(owner.address(), &op, hash)
            .unwrap_err();
        assert_eq!(err, AccountError::NotFromEntryPoint(owner.address()));
    }

    #[test]
    fn execute_allowed_for_owner_and_entry_point() {
        let owner = PrivateKeySigner::random();
        let mut account = account(&owner);
        let target = Address::repeat_byte(0x70);

        account
            .execute(owner.address(), target, U256::from(1), Bytes::new())
            .unwrap();
        account
            .execute(ENTRY_POINT, target, U256::ZERO, Bytes::from_static(&[1]))
            .unwrap();
        assert_eq!(account.calls().len(), 2);
    }

    #[test]
    fn execute_rejects_other_callers() {
        let owner = PrivateKeySigner::random();
        let mut account = account(&owner);
        let intruder = Address::repeat_byte(0x13);

        let err = account
            .execute(intruder, Address::ZERO, U256::ZERO, Bytes::new())
            .unwrap_err();
        assert_eq!(err, AccountError::NotOwnerOrEntryPoint(intruder));
        assert!(account.calls().is_empty());
    }

    #[test]
    fn execute_batch_checks_lengths() {
        let owner = PrivateKeySigner::random();
        let mut account = account(&owner);

        let err = account
            .execute_batch(owner.address(), vec![Address::ZERO], vec![])
            .unwrap_err();
        assert_eq!(err, AccountError::WrongArrayLengths { targets: 1, data: 0 });

        account
            .execute_batch(
                ENTRY_POINT,
                vec![Address::ZERO, Address::repeat_byte(1)],
                vec![Bytes::new(), Bytes::new()],
            )
            .unwrap();
        assert_eq!(account.calls().len(), 2);
    }
}
