// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EthereumDIDRegistry client.
//!
//! [`DidRegistry`] is the seam between the DID service and the chain.
//! [`RegistryClient`] implements it over an alloy HTTP provider whose wallet
//! filler holds the admin key, so every write is signed and paid for by the
//! admin. Writes wait for the receipt before returning.

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, B256, U256},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, PendingTransactionBuilder, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::Filter,
    signers::local::PrivateKeySigner,
    sol,
    sol_types::SolEvent,
};
use async_trait::async_trait;

use super::types::{OwnerChangeSignature, RegistryEvent, TxOutcome};

sol! {
    #[sol(rpc)]
    interface EthereumDIDRegistry {
        event DIDOwnerChanged(address indexed identity, address owner, uint256 previousChange);
        event DIDDelegateChanged(address indexed identity, bytes32 delegateType, address delegate, uint256 validTo, uint256 previousChange);
        event DIDAttributeChanged(address indexed identity, bytes32 name, bytes value, uint256 validTo, uint256 previousChange);

        function identityOwner(address identity) external view returns (address);
        function changed(address identity) external view returns (uint256);
        function nonce(address identity) external view returns (uint256);
        function changeOwner(address identity, address newOwner) external;
        function changeOwnerSigned(address identity, uint8 sigV, bytes32 sigR, bytes32 sigS, address newOwner) external;
        function setAttribute(address identity, bytes32 name, bytes value, uint256 validity) external;
        function revokeAttribute(address identity, bytes32 name, bytes value) external;
    }
}

/// HTTP provider with the admin wallet attached.
type SigningProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Operations the DID service needs from the on-chain registry.
///
/// Writes are always sent from [`DidRegistry::admin`].
#[async_trait]
pub trait DidRegistry: Send + Sync {
    /// Registry contract address.
    fn address(&self) -> Address;

    /// Chain id the registry lives on.
    fn chain_id(&self) -> u64;

    /// Address of the admin key that signs every write.
    fn admin(&self) -> Address;

    /// Current chain head.
    async fn block_number(&self) -> Result<u64, RegistryError>;

    /// Registered owner of an identity (the identity itself when never changed).
    async fn identity_owner(&self, identity: Address) -> Result<Address, RegistryError>;

    /// Meta-transaction nonce of an owner.
    async fn nonce(&self, owner: Address) -> Result<U256, RegistryError>;

    /// Block of the most recent change for an identity, 0 if none.
    async fn changed(&self, identity: Address) -> Result<u64, RegistryError>;

    /// Registry events for an identity emitted in one block, in log order.
    async fn events_at(
        &self,
        identity: Address,
        block: u64,
    ) -> Result<Vec<RegistryEvent>, RegistryError>;

    /// `changeOwner`, sent by the admin.
    async fn change_owner(
        &self,
        identity: Address,
        new_owner: Address,
    ) -> Result<TxOutcome, RegistryError>;

    /// `changeOwnerSigned`, authorized by `signature` and relayed by the admin.
    async fn change_owner_signed(
        &self,
        identity: Address,
        signature: OwnerChangeSignature,
        new_owner: Address,
    ) -> Result<TxOutcome, RegistryError>;

    /// `setAttribute` with an explicit gas limit.
    async fn set_attribute(
        &self,
        identity: Address,
        name: B256,
        value: Bytes,
        validity: u64,
        gas_limit: u64,
    ) -> Result<TxOutcome, RegistryError>;

    /// `revokeAttribute`.
    async fn revoke_attribute(
        &self,
        identity: Address,
        name: B256,
        value: Bytes,
    ) -> Result<TxOutcome, RegistryError>;
}

/// Alloy-backed registry client.
pub struct RegistryClient {
    provider: SigningProvider,
    contract: EthereumDIDRegistry::EthereumDIDRegistryInstance<SigningProvider>,
    admin: Address,
    chain_id: u64,
}

impl RegistryClient {
    /// Connect to the registry at `registry` through `rpc_url`, signing with `admin`.
    ///
    /// Queries the chain id once; the connection is otherwise lazy.
    pub async fn connect(
        rpc_url: &str,
        registry: Address,
        admin: PrivateKeySigner,
    ) -> Result<Self, RegistryError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| RegistryError::InvalidRpcUrl(e.to_string()))?;

        let admin_address = admin.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(admin))
            .connect_http(url);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| RegistryError::Rpc(format!("Failed to get chain id: {}", e)))?;

        let contract = EthereumDIDRegistry::new(registry, provider.clone());

        tracing::info!(
            registry = %registry,
            admin = %admin_address,
            chain_id,
            "Connected to DID registry"
        );

        Ok(Self {
            provider,
            contract,
            admin: admin_address,
            chain_id,
        })
    }

    /// Wait for a submitted transaction to be mined and check its status.
    async fn confirm(
        &self,
        action: &str,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<TxOutcome, RegistryError> {
        let tx_hash = *pending.tx_hash();
        tracing::info!(action, tx_hash = %tx_hash, "Registry transaction submitted");

        let receipt = pending.get_receipt().await.map_err(|e| {
            RegistryError::TransactionFailed(format!("{action} {tx_hash}: {e}"))
        })?;

        if !receipt.status() {
            return Err(RegistryError::Reverted {
                action: action.to_string(),
                tx_hash,
            });
        }

        tracing::info!(
            action,
            tx_hash = %tx_hash,
            block_number = ?receipt.block_number,
            "Registry transaction mined"
        );

        Ok(TxOutcome {
            tx_hash,
            block_number: receipt.block_number,
        })
    }
}

#[async_trait]
impl DidRegistry for RegistryClient {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn admin(&self) -> Address {
        self.admin
    }

    async fn block_number(&self) -> Result<u64, RegistryError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| RegistryError::Rpc(e.to_string()))
    }

    async fn identity_owner(&self, identity: Address) -> Result<Address, RegistryError> {
        self.contract
            .identityOwner(identity)
            .call()
            .await
            .map_err(|e| call_error("identityOwner", e))
    }

    async fn nonce(&self, owner: Address) -> Result<U256, RegistryError> {
        self.contract
            .nonce(owner)
            .call()
            .await
            .map_err(|e| call_error("nonce", e))
    }

    async fn changed(&self, identity: Address) -> Result<u64, RegistryError> {
        let block: U256 = self
            .contract
            .changed(identity)
            .call()
            .await
            .map_err(|e| call_error("changed", e))?;
        Ok(block.saturating_to::<u64>())
    }

    async fn events_at(
        &self,
        identity: Address,
        block: u64,
    ) -> Result<Vec<RegistryEvent>, RegistryError> {
        let filter = Filter::new()
            .address(self.address())
            .topic1(identity.into_word())
            .from_block(block)
            .to_block(block);

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| RegistryError::Rpc(e.to_string()))?;

        let mut events = Vec::with_capacity(logs.len());
        for log in &logs {
            let Some(topic) = log.topic0() else {
                continue;
            };

            if *topic == EthereumDIDRegistry::DIDOwnerChanged::SIGNATURE_HASH {
                let event = log
                    .log_decode::<EthereumDIDRegistry::DIDOwnerChanged>()
                    .map_err(|e| RegistryError::Contract(format!("DIDOwnerChanged: {}", e)))?
                    .inner
                    .data;
                events.push(RegistryEvent::OwnerChanged {
                    owner: event.owner,
                    previous_change: event.previousChange.saturating_to(),
                });
            } else if *topic == EthereumDIDRegistry::DIDDelegateChanged::SIGNATURE_HASH {
                let event = log
                    .log_decode::<EthereumDIDRegistry::DIDDelegateChanged>()
                    .map_err(|e| RegistryError::Contract(format!("DIDDelegateChanged: {}", e)))?
                    .inner
                    .data;
                events.push(RegistryEvent::DelegateChanged {
                    delegate_type: event.delegateType,
                    delegate: event.delegate,
                    valid_to: event.validTo.saturating_to(),
                    previous_change: event.previousChange.saturating_to(),
                });
            } else if *topic == EthereumDIDRegistry::DIDAttributeChanged::SIGNATURE_HASH {
                let event = log
                    .log_decode::<EthereumDIDRegistry::DIDAttributeChanged>()
                    .map_err(|e| {
                        RegistryError::Contract(format!("DIDAttributeChanged: {}", e))
                    })?
                    .inner
                    .data;
                events.push(RegistryEvent::AttributeChanged {
                    name: event.name,
                    value: event.value,
                    valid_to: event.validTo.saturating_to(),
                    previous_change: event.previousChange.saturating_to(),
                });
            }
        }

        Ok(events)
    }

    async fn change_owner(
        &self,
        identity: Address,
        new_owner: Address,
    ) -> Result<TxOutcome, RegistryError> {
        let pending = self
            .contract
            .changeOwner(identity, new_owner)
            .send()
            .await
            .map_err(|e| RegistryError::TransactionFailed(format!("changeOwner: {}", e)))?;

        self.confirm("changeOwner", pending).await
    }

    async fn change_owner_signed(
        &self,
        identity: Address,
        signature: OwnerChangeSignature,
        new_owner: Address,
    ) -> Result<TxOutcome, RegistryError> {
        let pending = self
            .contract
            .changeOwnerSigned(identity, signature.v, signature.r, signature.s, new_owner)
            .send()
            .await
            .map_err(|e| {
                RegistryError::TransactionFailed(format!("changeOwnerSigned: {}", e))
            })?;

        self.confirm("changeOwnerSigned", pending).await
    }

    async fn set_attribute(
        &self,
        identity: Address,
        name: B256,
        value: Bytes,
        validity: u64,
        gas_limit: u64,
    ) -> Result<TxOutcome, RegistryError> {
        let pending = self
            .contract
            .setAttribute(identity, name, value, U256::from(validity))
            .gas(gas_limit)
            .send()
            .await
            .map_err(|e| RegistryError::TransactionFailed(format!("setAttribute: {}", e)))?;

        self.confirm("setAttribute", pending).await
    }

    async fn revoke_attribute(
        &self,
        identity: Address,
        name: B256,
        value: Bytes,
    ) -> Result<TxOutcome, RegistryError> {
        let pending = self
            .contract
            .revokeAttribute(identity, name, value)
            .send()
            .await
            .map_err(|e| {
                RegistryError::TransactionFailed(format!("revokeAttribute: {}", e))
            })?;

        self.confirm("revokeAttribute", pending).await
    }
}

/// Map a failed view call. A node that cannot be reached is an RPC outage;
/// a JSON-RPC error response or decode failure is a contract error.
fn call_error(action: &str, err: alloy::contract::Error) -> RegistryError {
    match err {
        alloy::contract::Error::TransportError(e) if !e.is_error_resp() => {
            RegistryError::Rpc(format!("{action}: {e}"))
        }
        other => RegistryError::Contract(format!("{action}: {other}")),
    }
}

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction reverted: {action} {tx_hash}")]
    Reverted { action: String, tx_hash: B256 },
}
