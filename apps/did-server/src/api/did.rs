// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    did::DidDocument,
    error::ApiError,
    models::{
        AddAttributeRequest, DeleteDidRequest, RegisterDidResponse, RemoveAttributeRequest,
        TransactionResponse,
    },
    state::AppState,
};

/// Generate a key pair and register its DID under the admin.
#[utoipa::path(
    post,
    path = "/did/register",
    tag = "DID",
    responses(
        (status = 200, body = RegisterDidResponse),
        (status = 500, description = "Registry transaction failed")
    )
)]
pub async fn register_did(
    State(state): State<AppState>,
) -> Result<Json<RegisterDidResponse>, ApiError> {
    let registration = state.did.register_did().await?;
    Ok(Json(registration.into()))
}

#[utoipa::path(
    post,
    path = "/did/attributes",
    request_body = AddAttributeRequest,
    tag = "DID",
    responses(
        (status = 200, body = TransactionResponse),
        (status = 400, description = "Malformed DID or attribute name"),
        (status = 403, description = "Admin does not own the identity")
    )
)]
pub async fn add_attribute(
    State(state): State<AppState>,
    Json(request): Json<AddAttributeRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let outcome = state
        .did
        .add_attribute(&request.did, &request.attribute_name, &request.attribute_value)
        .await?;
    Ok(Json(TransactionResponse::mined(outcome.tx_hash)))
}

#[utoipa::path(
    delete,
    path = "/did/attributes",
    request_body = RemoveAttributeRequest,
    tag = "DID",
    responses(
        (status = 200, body = TransactionResponse),
        (status = 400, description = "Malformed DID or attribute name")
    )
)]
pub async fn remove_attribute(
    State(state): State<AppState>,
    Json(request): Json<RemoveAttributeRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let outcome = state
        .did
        .remove_attribute(&request.did, &request.attribute_name)
        .await?;
    Ok(Json(TransactionResponse::mined(outcome.tx_hash)))
}

/// Deactivate a DID by handing its identity to the zero address.
#[utoipa::path(
    delete,
    path = "/",
    request_body = DeleteDidRequest,
    tag = "DID",
    responses(
        (status = 200, body = TransactionResponse),
        (status = 400, description = "Malformed DID")
    )
)]
pub async fn delete_did(
    State(state): State<AppState>,
    Json(request): Json<DeleteDidRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let outcome = state.did.delete_did(&request.did).await?;
    Ok(Json(TransactionResponse::mined(outcome.tx_hash)))
}

/// Resolve a DID document. A deactivated DID resolves to `null`.
#[utoipa::path(
    get,
    path = "/did/{did}",
    params(
        ("did" = String, Path, description = "did:ethr identifier")
    ),
    tag = "DID",
    responses(
        (status = 200, body = DidDocument, description = "Resolved document, or null when deactivated"),
        (status = 400, description = "Malformed DID")
    )
)]
pub async fn resolve_did(
    Path(did): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Option<DidDocument>>, ApiError> {
    Ok(Json(state.did.resolve_did(&did).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use alloy::primitives::Address;
    use axum::http::StatusCode;

    use crate::{
        blockchain::{memory::InMemoryRegistry, parse_private_key, DidRegistry, RegistryEvent},
        did::{DidService, EthrDid},
    };

    const ADMIN_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn setup() -> (Arc<InMemoryRegistry>, AppState) {
        let admin = parse_private_key(ADMIN_KEY).unwrap();
        let registry = Arc::new(InMemoryRegistry::new(admin.address()));
        let state = AppState::new(DidService::new(registry.clone(), "sepolia"), None);
        (registry, state)
    }

    #[tokio::test]
    async fn register_then_resolve() {
        let (_, state) = setup();

        let Json(registration) = register_did(State(state.clone())).await.unwrap();
        assert!(registration.did.starts_with("did:ethr:sepolia:0x"));
        assert!(registration.public_key_transaction_hash.is_some());

        let Json(document) = resolve_did(Path(registration.did.clone()), State(state))
            .await
            .unwrap();
        let document = document.expect("registered DID resolves");
        assert_eq!(document.id, registration.did);
    }

    #[tokio::test]
    async fn add_and_remove_attribute() {
        let (_, state) = setup();
        let Json(registration) = register_did(State(state.clone())).await.unwrap();

        let Json(added) = add_attribute(
            State(state.clone()),
            Json(AddAttributeRequest {
                did: registration.did.clone(),
                attribute_name: "did/svc/HubService".into(),
                attribute_value: "https://hub.example".into(),
            }),
        )
        .await
        .unwrap();
        assert!(added.success);
        assert!(added.transaction_hash.starts_with("0x"));

        let Json(removed) = remove_attribute(
            State(state),
            Json(RemoveAttributeRequest {
                did: registration.did,
                attribute_name: "did/svc/HubService".into(),
            }),
        )
        .await
        .unwrap();
        assert!(removed.success);
        assert_ne!(removed.transaction_hash, added.transaction_hash);
    }

    #[tokio::test]
    async fn add_attribute_to_foreign_identity_is_forbidden() {
        let (_, state) = setup();
        let did = EthrDid::new("sepolia", Address::repeat_byte(0x42)).to_string();

        let err = add_attribute(
            State(state),
            Json(AddAttributeRequest {
                did,
                attribute_name: "did/svc/HubService".into(),
                attribute_value: "x".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn long_attribute_name_is_bad_request() {
        let (registry, state) = setup();
        let Json(registration) = register_did(State(state.clone())).await.unwrap();
        let writes = registry.writes();

        let err = add_attribute(
            State(state),
            Json(AddAttributeRequest {
                did: registration.did,
                attribute_name: "a".repeat(32),
                attribute_value: "x".into(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(registry.writes(), writes);
    }

    #[tokio::test]
    async fn delete_did_deactivates() {
        let (registry, state) = setup();
        let Json(registration) = register_did(State(state.clone())).await.unwrap();

        let Json(response) = delete_did(
            State(state.clone()),
            Json(DeleteDidRequest {
                did: registration.did.clone(),
            }),
        )
        .await
        .unwrap();
        assert!(response.success);

        let address: Address = registration.address.parse().unwrap();
        let block = registry.changed(address).await.unwrap();
        let events = registry.events_at(address, block).await.unwrap();
        assert!(matches!(
            events.last(),
            Some(RegistryEvent::OwnerChanged { owner, .. }) if *owner == Address::ZERO
        ));

        let Json(document) = resolve_did(Path(registration.did), State(state)).await.unwrap();
        assert!(document.is_none());
    }

    #[tokio::test]
    async fn unsupported_method_is_bad_request() {
        let (_, state) = setup();
        let err = resolve_did(Path("did:web:example.com".into()), State(state))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
