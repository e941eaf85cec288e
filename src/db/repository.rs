//! Catalog repository for CRUD operations over tools and categories.
//!
//! Sole writer of tool and category documents. Every read goes to the store;
//! nothing is cached between calls.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    sanitize_features, CreateToolRequest, Pricing, Review, Tool, UpdateToolRequest,
    DEFAULT_CATEGORIES,
};

/// Repository for all catalog data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== TOOL OPERATIONS ====================

    /// List all tools in store order.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, name, slug, description, category, pricing, rating,
                      features, screenshots, logo, official_url, reviews,
                      created_at, updated_at
               FROM tools"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(tool_from_row).collect())
    }

    /// Get a tool by ID. Absence is `None`, not an error.
    pub async fn get_tool(&self, id: &str) -> Result<Option<Tool>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, name, slug, description, category, pricing, rating,
                      features, screenshots, logo, official_url, reviews,
                      created_at, updated_at
               FROM tools WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(tool_from_row))
    }

    /// Get a tool by its slug (equality query, first match).
    pub async fn get_tool_by_slug(&self, slug: &str) -> Result<Option<Tool>, AppError> {
        let row = sqlx::query(
            r#"SELECT id, name, slug, description, category, pricing, rating,
                      features, screenshots, logo, official_url, reviews,
                      created_at, updated_at
               FROM tools WHERE slug = ?"#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(tool_from_row))
    }

    /// Check whether a slug is taken by a tool other than `exclude_id`.
    ///
    /// Used as a pre-check before create/update; the unique index on the slug
    /// column is the transactional backstop for the inherent check-then-act
    /// race between two concurrent writers.
    pub async fn slug_exists(
        &self,
        slug: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT id FROM tools WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(false),
            Some(row) => {
                let existing_id: String = row.get("id");
                match exclude_id {
                    Some(exclude) => Ok(existing_id != exclude),
                    None => Ok(true),
                }
            }
        }
    }

    /// Create a new tool with a store-assigned id and creation timestamps.
    ///
    /// Rating starts at 0 and reviews empty; empty feature entries are dropped.
    pub async fn create_tool(
        &self,
        request: &CreateToolRequest,
        slug: &str,
    ) -> Result<Tool, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let features = sanitize_features(&request.features);
        let logo = request
            .logo
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| crate::storage::DEFAULT_LOGO_PLACEHOLDER.to_string());
        let features_json = serde_json::to_string(&features).unwrap_or_default();
        let screenshots_json = serde_json::to_string(&request.screenshots).unwrap_or_default();

        let result = sqlx::query(
            r#"INSERT INTO tools (
                id, name, slug, description, category, pricing, rating,
                features, screenshots, logo, official_url, reviews,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, '[]', ?, ?)"#,
        )
        .bind(&id)
        .bind(&request.name)
        .bind(slug)
        .bind(&request.description)
        .bind(&request.category)
        .bind(request.pricing.as_str())
        .bind(&features_json)
        .bind(&screenshots_json)
        .bind(&logo)
        .bind(&request.official_url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            return Err(map_slug_violation(err, slug));
        }

        Ok(Tool {
            id,
            name: request.name.clone(),
            slug: slug.to_string(),
            description: request.description.clone(),
            category: request.category.clone(),
            pricing: request.pricing,
            rating: 0.0,
            features,
            screenshots: request.screenshots.clone(),
            logo,
            official_url: request.official_url.clone(),
            reviews: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a tool with partial-field merge semantics.
    ///
    /// Unset fields are left untouched; `updated_at` is re-stamped. Fails with
    /// `NotFound` when the id does not exist.
    pub async fn update_tool(
        &self,
        id: &str,
        request: &UpdateToolRequest,
    ) -> Result<Tool, AppError> {
        let existing = self
            .get_tool(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Tool {} not found", id)))?;

        let now = Utc::now().to_rfc3339();

        let name = request.name.clone().unwrap_or(existing.name);
        let slug = request.slug.clone().unwrap_or(existing.slug);
        let description = request.description.clone().unwrap_or(existing.description);
        let category = request.category.clone().unwrap_or(existing.category);
        let pricing = request.pricing.unwrap_or(existing.pricing);
        let rating = request.rating.unwrap_or(existing.rating);
        let features = request
            .features
            .as_ref()
            .map(|f| sanitize_features(f))
            .unwrap_or(existing.features);
        let screenshots = request.screenshots.clone().unwrap_or(existing.screenshots);
        let logo = request.logo.clone().unwrap_or(existing.logo);
        let official_url = request.official_url.clone().or(existing.official_url);

        let features_json = serde_json::to_string(&features).unwrap_or_default();
        let screenshots_json = serde_json::to_string(&screenshots).unwrap_or_default();

        let result = sqlx::query(
            r#"UPDATE tools SET
                name = ?, slug = ?, description = ?, category = ?, pricing = ?,
                rating = ?, features = ?, screenshots = ?, logo = ?,
                official_url = ?, updated_at = ?
            WHERE id = ?"#,
        )
        .bind(&name)
        .bind(&slug)
        .bind(&description)
        .bind(&category)
        .bind(pricing.as_str())
        .bind(rating)
        .bind(&features_json)
        .bind(&screenshots_json)
        .bind(&logo)
        .bind(&official_url)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(result) => result,
            Err(err) => return Err(map_slug_violation(err, &slug)),
        };

        if result.rows_affected() == 0 {
            // Deleted between the read and the write
            return Err(AppError::NotFound(format!("Tool {} not found", id)));
        }

        Ok(Tool {
            id: id.to_string(),
            name,
            slug,
            description,
            category,
            pricing,
            rating,
            features,
            screenshots,
            logo,
            official_url,
            reviews: existing.reviews,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a tool. Idempotent: deleting a missing id is not an error.
    pub async fn delete_tool(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tools WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("delete_tool: no document with id {}", id);
        }

        Ok(())
    }

    // ==================== CATEGORY OPERATIONS ====================

    /// List all category names in store order.
    pub async fn list_categories(&self) -> Result<Vec<String>, AppError> {
        let rows = sqlx::query("SELECT name FROM categories")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    /// Add a category. The case-insensitive duplicate check is the caller's
    /// responsibility; the store write itself performs none.
    pub async fn add_category(&self, name: &str) -> Result<(), AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(name.trim())
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete the first category matching `name`. No-ops when absent.
    ///
    /// Tools referencing the category keep their dangling reference.
    pub async fn delete_category(&self, name: &str) -> Result<(), AppError> {
        let row = sqlx::query("SELECT id FROM categories WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = row {
            let id: String = row.get("id");
            sqlx::query("DELETE FROM categories WHERE id = ?")
                .bind(&id)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Seed the default category set when the collection is empty.
    ///
    /// The emptiness check gates the whole loop: re-running against a
    /// non-empty collection is a no-op and does not re-seed missing entries.
    pub async fn bootstrap_default_categories(&self) -> Result<(), AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM categories")
            .fetch_one(&self.pool)
            .await?;
        let count: i64 = row.get("count");

        if count > 0 {
            return Ok(());
        }

        tracing::info!("Seeding default categories");
        for name in DEFAULT_CATEGORIES {
            self.add_category(name).await?;
        }

        Ok(())
    }
}

/// Map a unique-index violation on the slug column to a validation error.
fn map_slug_violation(err: sqlx::Error, slug: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Validation(format!("Slug '{}' is already in use", slug))
        }
        _ => err.into(),
    }
}

// Helper functions for row conversion

fn tool_from_row(row: &sqlx::sqlite::SqliteRow) -> Tool {
    let pricing_str: String = row.get("pricing");
    let features_str: Option<String> = row.get("features");
    let screenshots_str: Option<String> = row.get("screenshots");
    let reviews_str: Option<String> = row.get("reviews");

    Tool {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        category: row.get("category"),
        pricing: Pricing::from_str(&pricing_str).unwrap_or(Pricing::Free),
        rating: row.get("rating"),
        features: features_str.map(|s| parse_json_array(&s)).unwrap_or_default(),
        screenshots: screenshots_str
            .map(|s| parse_json_array(&s))
            .unwrap_or_default(),
        logo: row.get("logo"),
        official_url: row.get("official_url"),
        reviews: reviews_str.map(|s| parse_reviews(&s)).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn parse_json_array(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

fn parse_reviews(s: &str) -> Vec<Review> {
    serde_json::from_str(s).unwrap_or_default()
}
