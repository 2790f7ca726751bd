//! Transaction ledger REST handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::application::services::PaymentService;
use crate::domain::payment::TransactionSummary;
use crate::domain::{Transaction, TransactionStatus, UserProfile};
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult};

#[derive(Clone)]
pub struct TransactionState {
    pub payments: Arc<PaymentService>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    /// `pending`, `completed`, `failed` or `refunded`
    #[param(value_type = Option<String>)]
    pub status: Option<TransactionStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: TransactionStatus,
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(TransactionQuery),
    responses(
        (status = 200, description = "Ledger, newest first", body = ApiResponse<Vec<Transaction>>)
    )
)]
pub async fn list_transactions(
    State(state): State<TransactionState>,
    Extension(user): Extension<UserProfile>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Vec<Transaction>> {
    ok(state.payments.list(&user.id, query.status).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/summary",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ledger summary", body = ApiResponse<TransactionSummary>)
    )
)]
pub async fn transaction_summary(
    State(state): State<TransactionState>,
    Extension(user): Extension<UserProfile>,
) -> ApiResult<TransactionSummary> {
    ok(state.payments.summary(&user.id).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction", body = ApiResponse<Transaction>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_transaction(
    State(state): State<TransactionState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> ApiResult<Transaction> {
    ok(state.payments.get(&user.id, &id).await?)
}

#[utoipa::path(
    put,
    path = "/api/v1/transactions/{id}/status",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Transaction ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<Transaction>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Transition not allowed")
    )
)]
pub async fn update_transaction_status(
    State(state): State<TransactionState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> ApiResult<Transaction> {
    ok(state.payments.update_status(&user.id, &id, req.status).await?)
}
