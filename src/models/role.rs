//! Per-account role record.

use serde::{Deserialize, Serialize};

/// Admin privilege flag for one account.
///
/// Created lazily with `isAdmin = false` on first login and mutated only by
/// an explicit promote operation. Never deleted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub is_admin: bool,
}

/// Request body for promoting an account to admin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    pub account_id: String,
}
