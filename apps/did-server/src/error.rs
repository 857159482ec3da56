// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{aa::PaymasterError, blockchain::RegistryError, did::DidError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        }
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Rpc(_) | RegistryError::InvalidRpcUrl(_) => {
                Self::service_unavailable(err.to_string())
            }
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<DidError> for ApiError {
    fn from(err: DidError) -> Self {
        match err {
            DidError::Codec(_)
            | DidError::UnknownNetwork { .. }
            | DidError::EmptyAttributeName
            | DidError::AttributeNameTooLong { .. } => Self::bad_request(err.to_string()),
            DidError::NotOwner { .. } => Self::forbidden(err.to_string()),
            DidError::AdminBootstrap { .. } => Self::internal(err.to_string()),
            DidError::Registry(inner) => inner.into(),
        }
    }
}

impl From<PaymasterError> for ApiError {
    fn from(err: PaymasterError) -> Self {
        match err {
            PaymasterError::Signing(_) => Self::internal(err.to_string()),
            _ => Self::bad_request(err.to_string()),
        }
    }
}
