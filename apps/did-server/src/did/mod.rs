// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! did:ethr identifiers, documents, resolution and lifecycle.

pub mod codec;
pub mod document;
pub mod resolver;
pub mod service;

pub use codec::{address_from_did, DidCodecError, EthrDid};
pub use document::{DidDocument, Service, VerificationMethod};
pub use resolver::Resolver;
pub use service::{DidError, DidRegistration, DidService};
