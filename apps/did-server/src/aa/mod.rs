// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EIP-4337 account abstraction: user operations, the single-owner
//! account, its CREATE2 factory and the verifying paymaster.

pub mod account;
pub mod factory;
pub mod paymaster;
pub mod user_op;

pub use account::{AccountError, SimpleAccount, SIG_VALIDATION_FAILED};
pub use factory::AccountFactory;
pub use paymaster::{PaymasterError, PaymasterSigner, Sponsorship, VerifyingPaymaster};
pub use user_op::UserOperation;
