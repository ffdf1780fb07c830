//! Queue HTTP Protocol
//!
//! JSON request/response bodies for the client-facing queue endpoints. Elements are
//! carried as UTF-8 strings; `null` is a null element.

use crate::executor::PoolStats;
use crate::serialization::Data;
use serde::{Deserialize, Serialize};

pub const ENDPOINT_QUEUE_OFFER: &str = "/queue/:name/offer";
pub const ENDPOINT_QUEUE_ADD_ALL: &str = "/queue/:name/add_all";
pub const ENDPOINT_QUEUE_POLL: &str = "/queue/:name/poll";
pub const ENDPOINT_QUEUE_PEEK: &str = "/queue/:name/peek";
pub const ENDPOINT_QUEUE_SIZE: &str = "/queue/:name/size";
pub const ENDPOINT_QUEUE_CLEAR: &str = "/queue/:name/clear";
pub const ENDPOINT_NODE_STATS: &str = "/stats";

#[derive(Debug, Serialize, Deserialize)]
pub struct OfferRequest {
    pub item: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddAllRequest {
    pub items: Vec<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemResponse {
    /// `false` if the queue was empty.
    pub found: bool,
    pub item: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct NodeStatsResponse {
    pub pools: Vec<PoolStats>,
    pub containers: usize,
    pub pending_backups: usize,
    pub delivered_backups: u64,
    pub backup_send_failures: u64,
    pub backup_apply_failures: u64,
}

pub fn to_data(item: Option<String>) -> Option<Data> {
    item.map(Data::from)
}

pub fn from_data(item: Option<Data>) -> Option<String> {
    item.map(|data| String::from_utf8_lossy(data.as_bytes()).into_owned())
}
