//! Backup Endpoint Definitions
//!
//! The backup frame travels as the raw request body (`application/octet-stream`);
//! only the acknowledgement is JSON.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_BACKUP: &str = "/internal/backup/:partition/:replica_index";

/// Concrete path for one backup delivery.
pub fn backup_path(partition_id: u32, replica_index: u8) -> String {
    format!("/internal/backup/{}/{}", partition_id, replica_index)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackupAck {
    pub partition: u32,
    pub replica_index: u8,
    pub applied: bool,
    pub error: Option<String>,
}
