//! Category routes: two-level CRUD and the default tree import.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use centime_db::entities::{categories, sea_orm_active_enums::CategoryType};
use centime_db::repositories::{
    CategoryError, CategoryRepository, CategoryWithRelations, CreateCategoryInput,
    UpdateCategoryInput,
};

use crate::AppState;
use crate::middleware::AuthUser;
use crate::routes::double_option;

/// Creates the category routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category).get(list_categories))
        .route("/categories/import-default", post(import_default))
        .route(
            "/categories/{id}",
            get(get_category).patch(update_category).delete(delete_category),
        )
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCategoryRequest {
    name: String,
    /// Classification, `expense` when omitted.
    #[serde(rename = "type", default)]
    category_type: Option<CategoryType>,
    parent_id: Option<Uuid>,
}

/// Request body for updating a category. The classification is fixed at
/// creation; entries already booked rely on it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCategoryRequest {
    name: Option<String>,
    /// Absent keeps the parent, `null` detaches the category into a root.
    #[serde(default, deserialize_with = "double_option")]
    parent_id: Option<Option<Uuid>>,
}

/// Plain category payload without relations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryNode {
    id: Uuid,
    user_id: Uuid,
    name: String,
    #[serde(rename = "type")]
    category_type: CategoryType,
    parent_id: Option<Uuid>,
    created_at: DateTime<FixedOffset>,
    updated_at: DateTime<FixedOffset>,
}

impl From<categories::Model> for CategoryNode {
    fn from(model: categories::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            category_type: model.category_type,
            parent_id: model.parent_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Category payload with its parent and name-ordered children attached.
#[derive(Debug, Serialize)]
struct CategoryResponse {
    #[serde(flatten)]
    category: CategoryNode,
    parent: Option<CategoryNode>,
    children: Vec<CategoryNode>,
}

impl From<CategoryWithRelations> for CategoryResponse {
    fn from(with: CategoryWithRelations) -> Self {
        Self {
            category: CategoryNode::from(with.category),
            parent: with.parent.map(CategoryNode::from),
            children: with.children.into_iter().map(CategoryNode::from).collect(),
        }
    }
}

/// POST /categories - Create a category, optionally under a root parent.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() {
        return validation_error("Category name must not be empty");
    }
    if payload.name.chars().count() > 100 {
        return validation_error("Category name must not exceed 100 characters");
    }

    let repo = CategoryRepository::new((*state.db).clone());

    let input = CreateCategoryInput {
        user_id: auth.user_id(),
        name: payload.name,
        category_type: payload.category_type.unwrap_or(CategoryType::Expense),
        parent_id: payload.parent_id,
    };

    match repo.create_category(input).await {
        Ok(category) => {
            info!(user_id = %auth.user_id(), category_id = %category.category.id, "Category created");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Category created successfully",
                    "data": CategoryResponse::from(category),
                })),
            )
                .into_response()
        }
        Err(e) => category_error_response(e),
    }
}

/// GET /categories - List the user's categories with their relations.
async fn list_categories(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.list_categories(auth.user_id()).await {
        Ok(categories) => {
            let data: Vec<CategoryResponse> = categories
                .into_iter()
                .map(CategoryResponse::from)
                .collect();
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Categories retrieved successfully",
                    "data": data,
                })),
            )
                .into_response()
        }
        Err(e) => category_error_response(e),
    }
}

/// GET /categories/{id} - Fetch one category with its relations.
async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.find_category(auth.user_id(), id).await {
        Ok(category) => (
            StatusCode::OK,
            Json(json!({
                "message": "Category retrieved successfully",
                "data": CategoryResponse::from(category),
            })),
        )
            .into_response(),
        Err(e) => category_error_response(e),
    }
}

/// PATCH /categories/{id} - Rename or reparent a category.
async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return validation_error("Category name must not be empty");
        }
        if name.chars().count() > 100 {
            return validation_error("Category name must not exceed 100 characters");
        }
    }

    let repo = CategoryRepository::new((*state.db).clone());

    let input = UpdateCategoryInput {
        name: payload.name,
        parent_id: payload.parent_id,
    };

    match repo.update_category(auth.user_id(), id, input).await {
        Ok(category) => (
            StatusCode::OK,
            Json(json!({
                "message": "Category updated successfully",
                "data": CategoryResponse::from(category),
            })),
        )
            .into_response(),
        Err(e) => category_error_response(e),
    }
}

/// DELETE /categories/{id} - Delete a category nothing references.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.delete_category(auth.user_id(), id).await {
        Ok(()) => {
            info!(user_id = %auth.user_id(), category_id = %id, "Category deleted");
            (
                StatusCode::OK,
                Json(json!({ "message": "Category deleted successfully" })),
            )
                .into_response()
        }
        Err(e) => category_error_response(e),
    }
}

/// POST /categories/import-default - Materialize the default tree for a
/// user with no categories yet.
async fn import_default(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = CategoryRepository::new((*state.db).clone());

    match repo.import_defaults(auth.user_id()).await {
        Ok(count) => {
            info!(user_id = %auth.user_id(), count, "Default categories imported");
            (
                StatusCode::OK,
                Json(json!({
                    "message": "Default categories imported successfully",
                    "count": count,
                })),
            )
                .into_response()
        }
        Err(e) => category_error_response(e),
    }
}

/// Maps category repository errors onto HTTP responses.
fn category_error_response(err: CategoryError) -> Response {
    let (status, code, message) = match err {
        CategoryError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "category_not_found",
            "Category not found".to_string(),
        ),
        CategoryError::ParentNotFound(_) => (
            StatusCode::NOT_FOUND,
            "parent_not_found",
            "Parent category not found".to_string(),
        ),
        CategoryError::NestingTooDeep => (
            StatusCode::CONFLICT,
            "nesting_too_deep",
            "Categories cannot nest more than two levels".to_string(),
        ),
        CategoryError::SelfParent => (
            StatusCode::CONFLICT,
            "self_parent",
            "A category cannot be its own parent".to_string(),
        ),
        CategoryError::ChildAsParent => (
            StatusCode::CONFLICT,
            "child_as_parent",
            "A category cannot have one of its children as parent".to_string(),
        ),
        CategoryError::Duplicate(name) => (
            StatusCode::CONFLICT,
            "duplicate_name",
            format!("A category named '{name}' already exists here"),
        ),
        CategoryError::InUse(count) => (
            StatusCode::CONFLICT,
            "category_in_use",
            format!("Cannot delete category: {count} entries still reference it"),
        ),
        CategoryError::HasChildren(count) => (
            StatusCode::CONFLICT,
            "category_has_children",
            format!("Cannot delete category: it still has {count} child categories"),
        ),
        CategoryError::DefaultsNotEmpty(_) => (
            StatusCode::CONFLICT,
            "categories_not_empty",
            "Delete existing categories before importing the defaults".to_string(),
        ),
        CategoryError::InvalidAsset(e) => {
            error!(error = %e, "Default category asset failed to parse");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred".to_string(),
            )
        }
        CategoryError::Database(e) => {
            error!(error = %e, "Database error in category operation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An error occurred".to_string(),
            )
        }
    };

    (status, Json(json!({ "error": code, "message": message }))).into_response()
}

/// Shared 400 response for request validation failures.
fn validation_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation_error", "message": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_reads_type_and_defaults_to_expense() {
        let with_type: CreateCategoryRequest =
            serde_json::from_str(r#"{"name":"Salary","type":"income"}"#).expect("deserialize");
        assert_eq!(with_type.category_type, Some(CategoryType::Income));

        let without: CreateCategoryRequest =
            serde_json::from_str(r#"{"name":"Groceries"}"#).expect("deserialize");
        assert!(without.category_type.is_none());
    }

    #[test]
    fn test_update_request_distinguishes_absent_from_null_parent() {
        let absent: UpdateCategoryRequest =
            serde_json::from_str(r#"{"name":"Food"}"#).expect("deserialize");
        assert!(absent.parent_id.is_none());

        let cleared: UpdateCategoryRequest =
            serde_json::from_str(r#"{"parentId":null}"#).expect("deserialize");
        assert_eq!(cleared.parent_id, Some(None));
    }

    #[test]
    fn test_response_flattens_category_fields() {
        let now = chrono::Utc::now().fixed_offset();
        let model = categories::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Salary".to_string(),
            category_type: CategoryType::Income,
            parent_id: None,
            created_at: now,
            updated_at: now,
        };

        let response = CategoryResponse {
            category: CategoryNode::from(model),
            parent: None,
            children: Vec::new(),
        };

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["name"], "Salary");
        assert_eq!(json["type"], "income");
        assert!(json["parent"].is_null());
        assert_eq!(json["children"], serde_json::json!([]));
    }
}
