use super::protocol::BackupAck;
use crate::executor::PartitionOperationExecutor;

use axum::{body::Bytes, extract::Path, http::StatusCode, Extension, Json};
use std::sync::Arc;

pub async fn handle_backup(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
    Path((partition, replica_index)): Path<(u32, u8)>,
    frame: Bytes,
) -> (StatusCode, Json<BackupAck>) {
    tracing::debug!(
        "Received backup frame ({} bytes) for partition {} as replica {}",
        frame.len(),
        partition,
        replica_index
    );

    let outcome = match executor.receive_backup(partition, replica_index, frame) {
        Ok(handle) => handle.await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(_) => (
            StatusCode::OK,
            Json(BackupAck {
                partition,
                replica_index,
                applied: true,
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!("Backup for partition {} not applied: {}", partition, e);
            (
                e.status_code(),
                Json(BackupAck {
                    partition,
                    replica_index,
                    applied: false,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
