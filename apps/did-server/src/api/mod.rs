// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{HeaderName, Request},
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api::health::{HealthChecks, HealthResponse, ReadyResponse},
    did::{DidDocument, Service, VerificationMethod},
    models::{
        AddAttributeRequest, DeleteDidRequest, RegisterDidResponse, RemoveAttributeRequest,
        SponsorRequest, SponsorResponse, TransactionResponse, UserOperationDto,
    },
    state::AppState,
};

pub mod did;
pub mod health;
pub mod paymaster;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let routes = Router::new()
        .route("/", delete(did::delete_did))
        .route("/did/register", post(did::register_did))
        .route(
            "/did/attributes",
            post(did::add_attribute).delete(did::remove_attribute),
        )
        .route("/did/{did}", get(did::resolve_did))
        .route("/aa/paymaster/sponsor", post(paymaster::sponsor_user_operation))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                        let request_id = request
                            .headers()
                            .get(REQUEST_ID_HEADER)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("-");
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        did::register_did,
        did::add_attribute,
        did::remove_attribute,
        did::delete_did,
        did::resolve_did,
        paymaster::sponsor_user_operation,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            RegisterDidResponse,
            AddAttributeRequest,
            RemoveAttributeRequest,
            DeleteDidRequest,
            TransactionResponse,
            DidDocument,
            VerificationMethod,
            Service,
            UserOperationDto,
            SponsorRequest,
            SponsorResponse,
            ReadyResponse,
            HealthChecks,
            HealthResponse
        )
    ),
    tags(
        (name = "DID", description = "did:ethr registration, attributes and resolution"),
        (name = "Paymaster", description = "EIP-4337 user operation sponsorship"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
