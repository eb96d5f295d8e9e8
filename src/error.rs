use crate::parking::RecordId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("parking record {0} not found")]
    RecordNotFound(RecordId),
    #[error("parking record {0} already has a leave time")]
    AlreadyLeft(RecordId),
    #[error("user {0} already has an active parking session")]
    ActiveSession(String),
    #[error("leave time precedes arrival for record {0}")]
    LeaveBeforeArrival(RecordId),
    #[error("parking record id {0} appears more than once")]
    DuplicateRecordId(RecordId),
    #[error("no parking record ids left to allocate")]
    IdExhausted,
    #[error("failed to read store snapshot: {0}")]
    SnapshotRead(#[from] std::io::Error),
    #[error("failed to parse store snapshot: {0}")]
    SnapshotParse(#[from] serde_json::Error),
    #[error("store lock poisoned")]
    StoreLock,
}
