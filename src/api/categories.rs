//! Category API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::CreateCategoryRequest;
use crate::AppState;

/// GET /api/categories - List all category names.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    let categories = state.repo.list_categories().await?;
    success(categories)
}

/// POST /api/categories - Add a category.
pub async fn add_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<()> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Category name is required".to_string(),
        ));
    }

    // Duplicate prevention is case-insensitive; storage keeps the cased name
    let existing = state.repo.list_categories().await?;
    let lowered = name.to_lowercase();
    if existing.iter().any(|c| c.to_lowercase() == lowered) {
        return Err(AppError::Validation(
            "This category already exists".to_string(),
        ));
    }

    state.repo.add_category(name).await?;
    success(())
}

/// DELETE /api/categories/:name - Delete a category. No-ops when absent.
///
/// Tools referencing the deleted category keep their dangling reference.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<()> {
    state.repo.delete_category(&name).await?;
    success(())
}
