// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verifying paymaster.
//!
//! An off-chain sponsor signs the hash of a user operation together with a
//! validity window; the paymaster contract pays gas for any operation
//! carrying such a signature from its `verifying_signer`.
//!
//! `paymasterAndData` layout:
//!
//! ```text
//! [0..20)   paymaster address
//! [20..84)  abi.encode(uint48 validUntil, uint48 validAfter)
//! [84..)    signature, 64 (EIP-2098) or 65 bytes
//! ```

use alloy::{
    primitives::{keccak256, Address, Bytes, Signature, B256, U256},
    signers::{local::PrivateKeySigner, SignerSync},
    sol_types::SolValue,
};

use super::user_op::UserOperation;

const ADDRESS_LEN: usize = 20;
const VALIDITY_OFFSET: usize = ADDRESS_LEN;
const SIGNATURE_OFFSET: usize = VALIDITY_OFFSET + 64;
const UINT48_MAX: u64 = (1 << 48) - 1;

/// Decoded `paymasterAndData`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymasterData {
    pub paymaster: Address,
    pub valid_until: u64,
    pub valid_after: u64,
    pub signature: Signature,
}

/// Hash the verifying signer signs for `op`.
///
/// Covers everything except `paymasterAndData` and the account signature,
/// plus the chain id, the paymaster address and the validity window.
pub fn get_hash(
    op: &UserOperation,
    chain_id: u64,
    paymaster: Address,
    valid_until: u64,
    valid_after: u64,
) -> B256 {
    keccak256(
        (
            op.sender,
            op.nonce,
            keccak256(&op.initCode),
            keccak256(&op.callData),
            op.callGasLimit,
            op.verificationGasLimit,
            op.preVerificationGas,
            op.maxFeePerGas,
            op.maxPriorityFeePerGas,
            U256::from(chain_id),
            paymaster,
            U256::from(valid_until),
            U256::from(valid_after),
        )
            .abi_encode_params(),
    )
}

/// Split `paymasterAndData` into its parts.
pub fn parse_paymaster_and_data(data: &[u8]) -> Result<PaymasterData, PaymasterError> {
    if data.len() < SIGNATURE_OFFSET {
        return Err(PaymasterError::TooShort(data.len()));
    }

    let paymaster = Address::from_slice(&data[..ADDRESS_LEN]);
    let valid_until = decode_uint48(&data[VALIDITY_OFFSET..VALIDITY_OFFSET + 32])?;
    let valid_after = decode_uint48(&data[VALIDITY_OFFSET + 32..SIGNATURE_OFFSET])?;
    let signature = decode_signature(&data[SIGNATURE_OFFSET..])?;

    Ok(PaymasterData {
        paymaster,
        valid_until,
        valid_after,
        signature,
    })
}

/// Assemble `paymasterAndData`. The signature is always written in its
/// 65-byte form.
pub fn encode_paymaster_and_data(
    paymaster: Address,
    valid_until: u64,
    valid_after: u64,
    signature: &Signature,
) -> Bytes {
    let mut out = Vec::with_capacity(SIGNATURE_OFFSET + 65);
    out.extend_from_slice(paymaster.as_slice());
    out.extend_from_slice(&(U256::from(valid_until), U256::from(valid_after)).abi_encode_params());
    out.extend_from_slice(&signature.as_bytes());
    out.into()
}

/// Pack validation data for the EntryPoint:
/// `sigFailed | validUntil << 160 | validAfter << 208`.
pub fn pack_validation_data(sig_failed: bool, valid_until: u64, valid_after: u64) -> U256 {
    U256::from(sig_failed as u8)
        | (U256::from(valid_until) << 160)
        | (U256::from(valid_after) << 208)
}

fn decode_uint48(word: &[u8]) -> Result<u64, PaymasterError> {
    let value = U256::from_be_slice(word);
    u64::try_from(value)
        .ok()
        .filter(|v| *v <= UINT48_MAX)
        .ok_or(PaymasterError::TimestampOutOfRange)
}

fn decode_signature(bytes: &[u8]) -> Result<Signature, PaymasterError> {
    match bytes.len() {
        65 => Signature::from_raw(bytes).map_err(|e| PaymasterError::InvalidSignature(e.to_string())),
        64 => {
            // EIP-2098: the top bit of `vs` carries the y parity.
            let r = U256::from_be_slice(&bytes[..32]);
            let vs = U256::from_be_slice(&bytes[32..]);
            let y_parity = vs.bit(255);
            let s = vs & (U256::MAX >> 1);
            Ok(Signature::new(r, s, y_parity))
        }
        len => Err(PaymasterError::InvalidSignatureLength(len)),
    }
}

/// On-chain side of the paymaster.
#[derive(Debug, Clone)]
pub struct VerifyingPaymaster {
    address: Address,
    verifying_signer: Address,
    chain_id: u64,
}

impl VerifyingPaymaster {
    pub fn new(address: Address, verifying_signer: Address, chain_id: u64) -> Self {
        Self {
            address,
            verifying_signer,
            chain_id,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn verifying_signer(&self) -> Address {
        self.verifying_signer
    }

    pub fn get_hash(&self, op: &UserOperation, valid_until: u64, valid_after: u64) -> B256 {
        get_hash(op, self.chain_id, self.address, valid_until, valid_after)
    }

    /// Validate the sponsorship in `op.paymasterAndData`.
    ///
    /// A signature from anyone but the verifying signer is not an error: it
    /// yields validation data with the failure bit set.
    pub fn validate_paymaster_user_op(&self, op: &UserOperation) -> Result<U256, PaymasterError> {
        let data = parse_paymaster_and_data(&op.paymasterAndData)?;
        if data.paymaster != self.address {
            return Err(PaymasterError::WrongPaymaster {
                expected: self.address,
                got: data.paymaster,
            });
        }

        let hash = self.get_hash(op, data.valid_until, data.valid_after);
        let signer = data
            .signature
            .recover_address_from_msg(hash.as_slice())
            .map_err(|e| PaymasterError::InvalidSignature(e.to_string()))?;

        let sig_failed = signer != self.verifying_signer;
        if sig_failed {
            tracing::debug!(
                sender = %op.sender,
                signer = %signer,
                "Paymaster signature from unexpected signer"
            );
        }
        Ok(pack_validation_data(sig_failed, data.valid_until, data.valid_after))
    }
}

/// Result of a sponsorship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sponsorship {
    pub paymaster_and_data: Bytes,
    pub valid_until: u64,
    pub valid_after: u64,
    pub hash: B256,
    /// EntryPoint hash of the operation with `paymasterAndData` filled in.
    pub user_op_hash: B256,
}

/// Off-chain signer of sponsorships.
#[derive(Debug, Clone)]
pub struct PaymasterSigner {
    signer: PrivateKeySigner,
    paymaster: Address,
    entry_point: Address,
    chain_id: u64,
}

impl PaymasterSigner {
    pub fn new(
        signer: PrivateKeySigner,
        paymaster: Address,
        entry_point: Address,
        chain_id: u64,
    ) -> Self {
        Self {
            signer,
            paymaster,
            entry_point,
            chain_id,
        }
    }

    pub fn paymaster(&self) -> Address {
        self.paymaster
    }

    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn entry_point(&self) -> Address {
        self.entry_point
    }

    /// Sign `op` for the window `[valid_after, valid_until]`.
    pub fn sponsor(
        &self,
        op: &UserOperation,
        valid_until: u64,
        valid_after: u64,
    ) -> Result<Sponsorship, PaymasterError> {
        if valid_until > UINT48_MAX || valid_after > UINT48_MAX {
            return Err(PaymasterError::TimestampOutOfRange);
        }
        if valid_until != 0 && valid_after > valid_until {
            return Err(PaymasterError::EmptyWindow {
                valid_after,
                valid_until,
            });
        }

        let hash = get_hash(op, self.chain_id, self.paymaster, valid_until, valid_after);
        let signature = self
            .signer
            .sign_message_sync(hash.as_slice())
            .map_err(|e| PaymasterError::Signing(e.to_string()))?;

        let paymaster_and_data =
            encode_paymaster_and_data(self.paymaster, valid_until, valid_after, &signature);
        let sponsored = UserOperation {
            paymasterAndData: paymaster_and_data.clone(),
            ..op.clone()
        };
        let user_op_hash = sponsored.hash(self.entry_point, self.chain_id);

        tracing::info!(
            sender = %op.sender,
            nonce = %op.nonce,
            user_op_hash = %user_op_hash,
            valid_until,
            valid_after,
            "Sponsored user operation"
        );

        Ok(Sponsorship {
            paymaster_and_data,
            valid_until,
            valid_after,
            hash,
            user_op_hash,
        })
    }
}

/// Errors raised while handling `paymasterAndData`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymasterError {
    #[error("paymasterAndData too short: {0} bytes")]
    TooShort(usize),

    #[error("VerifyingPaymaster: invalid signature length in paymasterAndData ({0} bytes)")]
    InvalidSignatureLength(usize),

    #[error("invalid paymaster signature: {0}")]
    InvalidSignature(String),

    #[error("validity timestamp does not fit in uint48")]
    TimestampOutOfRange,

    #[error("validAfter {valid_after} is later than validUntil {valid_until}")]
    EmptyWindow { valid_after: u64, valid_until: u64 },

    #[error("paymasterAndData targets {got}, expected {expected}")]
    WrongPaymaster { expected: Address, got: Address },

    #[error("signing failed: {0}")]
    Signing(String),
}
