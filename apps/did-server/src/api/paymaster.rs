// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, U256};
use axum::{extract::State, Json};

use crate::{
    aa::UserOperation,
    error::ApiError,
    models::{SponsorRequest, SponsorResponse, UserOperationDto},
    state::AppState,
};

/// Sponsorship lifetime when the request names no `validUntil`.
pub const DEFAULT_SPONSORSHIP_TTL_SECS: u64 = 60 * 60;

/// Sign a user operation with the paymaster key.
#[utoipa::path(
    post,
    path = "/aa/paymaster/sponsor",
    request_body = SponsorRequest,
    tag = "Paymaster",
    responses(
        (status = 200, body = SponsorResponse),
        (status = 400, description = "Malformed user operation or validity window"),
        (status = 503, description = "No paymaster configured")
    )
)]
pub async fn sponsor_user_operation(
    State(state): State<AppState>,
    Json(request): Json<SponsorRequest>,
) -> Result<Json<SponsorResponse>, ApiError> {
    let signer = state
        .paymaster
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Paymaster is not configured"))?;

    let op = parse_user_operation(&request.user_operation)?;
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let valid_until = request
        .valid_until
        .unwrap_or(now + DEFAULT_SPONSORSHIP_TTL_SECS);
    let valid_after = request.valid_after.unwrap_or(0);

    let sponsorship = signer.sponsor(&op, valid_until, valid_after)?;

    Ok(Json(SponsorResponse {
        paymaster: signer.paymaster().to_checksum(None),
        paymaster_and_data: sponsorship.paymaster_and_data.to_string(),
        valid_until: sponsorship.valid_until,
        valid_after: sponsorship.valid_after,
        hash: sponsorship.hash.to_string(),
        user_op_hash: sponsorship.user_op_hash.to_string(),
    }))
}

fn parse_user_operation(dto: &UserOperationDto) -> Result<UserOperation, ApiError> {
    Ok(UserOperation {
        sender: parse_field::<Address>("sender", &dto.sender)?,
        nonce: parse_field::<U256>("nonce", &dto.nonce)?,
        initCode: parse_bytes("initCode", &dto.init_code)?,
        callData: parse_bytes("callData", &dto.call_data)?,
        callGasLimit: parse_field::<U256>("callGasLimit", &dto.call_gas_limit)?,
        verificationGasLimit: parse_field::<U256>(
            "verificationGasLimit",
            &dto.verification_gas_limit,
        )?,
        preVerificationGas: parse_field::<U256>("preVerificationGas", &dto.pre_verification_gas)?,
        maxFeePerGas: parse_field::<U256>("maxFeePerGas", &dto.max_fee_per_gas)?,
        maxPriorityFeePerGas: parse_field::<U256>(
            "maxPriorityFeePerGas",
            &dto.max_priority_fee_per_gas,
        )?,
        paymasterAndData: parse_bytes("paymasterAndData", &dto.paymaster_and_data)?,
        signature: parse_bytes("signature", &dto.signature)?,
    })
}

fn parse_field<T: FromStr>(name: &str, value: &str) -> Result<T, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid userOperation.{name}: `{value}`")))
}

fn parse_bytes(name: &str, value: &str) -> Result<Bytes, ApiError> {
    match value.trim() {
        "" | "0x" => Ok(Bytes::new()),
        hex => parse_field(name, hex),
    }
}
