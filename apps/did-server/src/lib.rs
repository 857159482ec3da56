// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ethr DID Server - did:ethr Registry Service
//!
//! This crate exposes the EthereumDIDRegistry over HTTP: DID registration
//! through admin-relayed meta-transactions, attribute management,
//! deactivation and resolution. It also carries an EIP-4337 account
//! abstraction model with a verifying paymaster signer.
//!
//! ## Modules
//!
//! - `aa` - EIP-4337 user operations, account, factory and paymaster
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Registry contract client (alloy)
//! - `did` - did:ethr codec, documents, resolver and orchestration

pub mod aa;
pub mod api;
pub mod blockchain;
pub mod config;
pub mod did;
pub mod error;
pub mod models;
pub mod state;
