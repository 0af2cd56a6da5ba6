//! Category endpoints.

use crate::api::{
    AppState,
    error::ApiError,
    types::{
        CategoryUpdateResponse, CategoryView, CreateCategoryRequest, UpdateCategoryRequest,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use badgetrack_core::{Actor, Category, CategoryId, CategoryInput, CategoryUpdate};

/// `GET /api/categories`
pub async fn list_categories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    let summaries = state.tracker.read().await.list_categories()?;
    Ok(Json(summaries.into_iter().map(CategoryView::from).collect()))
}

/// `POST /api/categories`
pub async fn create_category_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.tracker.write().await.create_category(
        &actor,
        CategoryInput {
            name: request.name,
            color: request.color,
            description: request.description,
        },
    )?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/categories/{id}`
///
/// With `updateBadges` a rename is carried over to badges; the cascade
/// report comes back in the response.
pub async fn update_category_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<CategoryUpdateResponse>, ApiError> {
    let outcome = state.tracker.write().await.update_category(
        &actor,
        CategoryId(id),
        CategoryUpdate {
            name: request.name,
            color: request.color,
            description: request.description,
            update_badges: request.update_badges,
        },
    )?;

    if let Some(report) = &outcome.cascade {
        if report.fallback_used {
            tracing::warn!(
                event = "cascade_fallback",
                category_id = id,
                bulk_error = report.bulk_error.as_deref().unwrap_or("none"),
                failed = report.failed.len(),
                "Bulk badge update left documents behind; per-document fallback ran"
            );
        }
        if report.is_complete() {
            tracing::info!(
                event = "category_renamed",
                category_id = id,
                matched = report.matched,
                updated = report.updated,
                "Category renamed"
            );
        } else {
            tracing::error!(
                event = "cascade_incomplete",
                category_id = id,
                remaining = report.remaining,
                "Badges still reference the old category name"
            );
        }
    }

    Ok(Json(CategoryUpdateResponse {
        category: outcome.category,
        cascade: outcome.cascade,
    }))
}

/// `DELETE /api/categories/{id}`
pub async fn delete_category_handler(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<u64>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .tracker
        .write()
        .await
        .delete_category(&actor, CategoryId(id))?;
    Ok(Json(category))
}
