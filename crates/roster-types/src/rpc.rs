use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{SortKey, UserId, UserRecord};

/// Field name to message, for form submissions the daemon rejected.
pub type FieldErrors = BTreeMap<String, String>;

// ============================================================================
// RPC Protocol
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest<P> {
    pub method: String,
    pub params: P,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcResponse<R> {
    Success { result: R },
    Error { error: String },
}

impl<R> RpcResponse<R> {
    pub fn success(result: R) -> Self {
        RpcResponse::Success { result }
    }

    pub fn error(message: impl Into<String>) -> Self {
        RpcResponse::Error {
            error: message.into(),
        }
    }

    pub fn into_result(self) -> Result<R, String> {
        match self {
            RpcResponse::Success { result } => Ok(result),
            RpcResponse::Error { error } => Err(error),
        }
    }
}

// ============================================================================
// Shutdown
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShutdownParams {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownResult {
    pub status: String,
}

// ============================================================================
// Describe Session
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescribeSessionParams {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeSessionResult {
    pub daemon_pid: u32,
    pub api_base_url: String,
    pub loaded: bool,
    pub user_count: u32,
    pub default_sort: SortKey,
}

// ============================================================================
// List (collection view)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersParams {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUsersResult {
    pub users: Vec<UserRecord>,
    pub total: u32,
    pub query: String,
    pub sort: SortKey,
}

// ============================================================================
// Show (detail view)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowUserParams {
    pub id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailSource {
    Store,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowUserResult {
    pub id: UserId,
    /// `None` when the id matched neither the store nor the remote API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<DetailSource>,
}

// ============================================================================
// Add / Edit / Delete
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddUserParams {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddUserResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditUserParams {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditUserResult {
    pub id: UserId,
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserParams {
    pub id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserResult {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<UserRecord>,
}

// ============================================================================
// Reload
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReloadUsersParams {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadUsersResult {
    pub loaded: u32,
    /// Set when a newer load superseded this one before it finished.
    #[serde(default)]
    pub discarded: bool,
}
