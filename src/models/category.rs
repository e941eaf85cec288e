//! Category model.
//!
//! Categories are named tags grouping tools. The API surface only ever deals
//! in names: uniqueness is advisory (pre-checked case-insensitively before
//! insert, not enforced by the store) and deleting a category does not touch
//! tools that reference it.

use serde::Deserialize;

/// Request body for adding a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Default set seeded into an empty categories collection.
pub const DEFAULT_CATEGORIES: [&str; 6] = [
    "content",
    "productivity",
    "data",
    "marketing",
    "design",
    "development",
];
