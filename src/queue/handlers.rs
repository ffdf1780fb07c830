use super::protocol::*;
use super::proxy::QueueProxy;
use crate::error::ClusterError;
use crate::executor::PartitionOperationExecutor;

use axum::{
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use std::sync::Arc;

fn error_response(call: &str, name: &str, e: ClusterError) -> Response {
    tracing::error!("Queue '{}' {} failed: {}", name, call, e);
    (e.status_code(), Json(ErrorResponse { error: e.to_string() })).into_response()
}

pub async fn handle_offer(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
    Path(name): Path<String>,
    Json(req): Json<OfferRequest>,
) -> Response {
    let proxy = QueueProxy::new(&name, executor);
    match proxy.offer(to_data(req.item)).await {
        Ok(accepted) => (StatusCode::OK, Json(AcceptedResponse { accepted })).into_response(),
        Err(e) => error_response("offer", &name, e),
    }
}

pub async fn handle_add_all(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
    Path(name): Path<String>,
    Json(req): Json<AddAllRequest>,
) -> Response {
    let proxy = QueueProxy::new(&name, executor);
    let items = req.items.into_iter().map(to_data).collect();
    match proxy.add_all(items).await {
        Ok(accepted) => (StatusCode::OK, Json(AcceptedResponse { accepted })).into_response(),
        Err(e) => error_response("add_all", &name, e),
    }
}

pub async fn handle_poll(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
    Path(name): Path<String>,
) -> Response {
    let proxy = QueueProxy::new(&name, executor);
    match proxy.poll().await {
        Ok(item) => (StatusCode::OK, Json(item_response(item))).into_response(),
        Err(e) => error_response("poll", &name, e),
    }
}

pub async fn handle_peek(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
    Path(name): Path<String>,
) -> Response {
    let proxy = QueueProxy::new(&name, executor);
    match proxy.peek().await {
        Ok(item) => (StatusCode::OK, Json(item_response(item))).into_response(),
        Err(e) => error_response("peek", &name, e),
    }
}

pub async fn handle_size(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
    Path(name): Path<String>,
) -> Response {
    let proxy = QueueProxy::new(&name, executor);
    match proxy.size().await {
        Ok(count) => (StatusCode::OK, Json(CountResponse { count })).into_response(),
        Err(e) => error_response("size", &name, e),
    }
}

pub async fn handle_clear(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
    Path(name): Path<String>,
) -> Response {
    let proxy = QueueProxy::new(&name, executor);
    match proxy.clear().await {
        Ok(count) => (StatusCode::OK, Json(CountResponse { count })).into_response(),
        Err(e) => error_response("clear", &name, e),
    }
}

pub async fn handle_node_stats(
    Extension(executor): Extension<Arc<PartitionOperationExecutor>>,
) -> Json<NodeStatsResponse> {
    let health = executor.health();
    Json(NodeStatsResponse {
        pools: executor.all_pool_stats(),
        containers: executor.containers().container_count(),
        pending_backups: health.pending_backups(),
        delivered_backups: health.delivered_count(),
        backup_send_failures: health.send_failure_count(),
        backup_apply_failures: health.apply_failure_count(),
    })
}

fn item_response(item: Option<super::container::QueueItem>) -> ItemResponse {
    match item {
        Some(item) => ItemResponse {
            found: true,
            item: from_data(item),
        },
        None => ItemResponse {
            found: false,
            item: None,
        },
    }
}
