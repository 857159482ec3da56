// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::{aa::PaymasterSigner, blockchain::DidRegistry, did::DidService};

#[derive(Clone)]
pub struct AppState {
    pub did: Arc<DidService>,
    /// Present only when a paymaster address is configured.
    pub paymaster: Option<Arc<PaymasterSigner>>,
}

impl AppState {
    pub fn new(did: DidService, paymaster: Option<PaymasterSigner>) -> Self {
        Self {
            did: Arc::new(did),
            paymaster: paymaster.map(Arc::new),
        }
    }

    pub fn registry(&self) -> &Arc<dyn DidRegistry> {
        self.did.registry()
    }
}
