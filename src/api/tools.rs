//! Tool API endpoints.

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{slugify, CreateToolRequest, Tool, UpdateToolRequest};
use crate::storage;
use crate::AppState;

/// GET /api/tools - List all tools.
pub async fn list_tools(State(state): State<AppState>) -> ApiResult<Vec<Tool>> {
    let tools = state.repo.list_tools().await?;
    success(tools)
}

/// GET /api/tools/:id - Get a single tool.
pub async fn get_tool(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Tool> {
    match state.repo.get_tool(&id).await? {
        Some(tool) => success(tool),
        None => Err(AppError::NotFound(format!("Tool {} not found", id))),
    }
}

/// GET /api/tools/slug/:slug - Get a single tool by its slug.
pub async fn get_tool_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Tool> {
    match state.repo.get_tool_by_slug(&slug).await? {
        Some(tool) => success(tool),
        None => Err(AppError::NotFound(format!(
            "No tool with slug '{}'",
            slug
        ))),
    }
}

/// POST /api/tools - Create a new tool.
pub async fn create_tool(
    State(state): State<AppState>,
    Json(request): Json<CreateToolRequest>,
) -> ApiResult<Tool> {
    // Validate required fields before touching the store
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("Description is required".to_string()));
    }
    if request.category.trim().is_empty() {
        return Err(AppError::Validation("Category is required".to_string()));
    }

    // An omitted slug is derived from the name
    let slug = match request.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(&request.name),
    };
    if slug.is_empty() {
        return Err(AppError::Validation(
            "A URL slug could not be derived from the name".to_string(),
        ));
    }

    if state.repo.slug_exists(&slug, None).await? {
        return Err(AppError::Validation(format!(
            "Slug '{}' is already in use",
            slug
        )));
    }

    let tool = state.repo.create_tool(&request, &slug).await?;
    success(tool)
}

/// PUT /api/tools/:id - Update a tool.
pub async fn update_tool(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut request): Json<UpdateToolRequest>,
) -> ApiResult<Tool> {
    if let Some(slug) = request.slug.take() {
        let slug = slug.trim().to_string();
        if slug.is_empty() {
            return Err(AppError::Validation("Slug cannot be empty".to_string()));
        }
        // The tool being edited is excluded from the uniqueness check
        if state.repo.slug_exists(&slug, Some(&id)).await? {
            return Err(AppError::Validation(format!(
                "Slug '{}' is already in use",
                slug
            )));
        }
        request.slug = Some(slug);
    }

    let tool = state.repo.update_tool(&id, &request).await?;
    success(tool)
}

/// DELETE /api/tools/:id - Delete a tool. Idempotent.
pub async fn delete_tool(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    state.repo.delete_tool(&id).await?;
    success(())
}

/// POST /api/tools/:id/logo - Upload a logo and persist its URL.
pub async fn upload_tool_logo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<String> {
    if state.repo.get_tool(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Tool {} not found", id)));
    }

    let path = storage::logo_path(&id);
    state.blobs.upload(&path, body).await?;
    let url = state.blobs.download_url(&path);

    let update = UpdateToolRequest {
        logo: Some(url.clone()),
        ..Default::default()
    };
    state.repo.update_tool(&id, &update).await?;

    success(url)
}

/// POST /api/tools/:id/screenshots/:index - Upload a screenshot and append its URL.
pub async fn upload_tool_screenshot(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
    body: Bytes,
) -> ApiResult<String> {
    let tool = state
        .repo
        .get_tool(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))?;

    let path = storage::screenshot_path(&id, index);
    state.blobs.upload(&path, body).await?;
    let url = state.blobs.download_url(&path);

    let mut screenshots = tool.screenshots;
    if !screenshots.contains(&url) {
        screenshots.push(url.clone());
    }
    let update = UpdateToolRequest {
        screenshots: Some(screenshots),
        ..Default::default()
    };
    state.repo.update_tool(&id, &update).await?;

    success(url)
}
