//! QR code endpoints.

use axum::extract::State;

use super::{error, success, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::qr::{BatchQrRequest, QrRequest, TableQr};
use crate::AppState;

/// POST /api/qr/generate - QR code for one table.
pub async fn generate_qr(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<QrRequest>,
) -> ApiResult<TableQr> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    match state.qr.generate(request.table_number, request.language) {
        Ok(qr) => success(qr, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/qr/generate-batch - QR codes for a list or range of tables.
pub async fn generate_qr_batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BatchQrRequest>,
) -> ApiResult<Vec<TableQr>> {
    let revision_id = state.catalog.revision_id().await.unwrap_or(0);

    // Rendering up to a few hundred PNGs is CPU bound
    let generator = state.qr.clone();
    let result = tokio::task::spawn_blocking(move || generator.generate_batch(&request))
        .await
        .map_err(|e| AppError::Internal(format!("QR rendering task failed: {}", e)))
        .and_then(|r| r);

    match result {
        Ok(codes) => {
            tracing::info!("Generated {} table QR codes", codes.len());
            success(codes, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}
