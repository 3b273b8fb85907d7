//! Product catalog endpoints. Reads are public; writes are admin actions.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Product, ProductResponse, UpdateProductRequest};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ok, ApiError, ApiResponse};
use super::uploads;
use super::validation::validate_required;

/// Scalar fields collected from the multipart create request.
#[derive(Default)]
struct ProductForm {
    name: String,
    brand: String,
    category: String,
    description: String,
    price: Option<i64>,
    discount_percent: Option<i64>,
    sizes: Vec<String>,
    stock: i64,
    images: Vec<String>,
}

/// GET /products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ProductResponse>>>, ApiError> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(ok(products.iter().map(Product::to_response).collect()))
}

/// GET /products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(ok(product.to_response()))
}

/// POST /products (admin, multipart)
///
/// Scalar fields arrive as text parts; any number of file parts become
/// stored images. Sizes may repeat (`sizes=41&sizes=42`) or come as one
/// comma-separated value.
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ApiError> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() {
            let original_name = field.file_name().map(|s| s.to_string());
            let content_type = field.content_type().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
            let url = uploads::store_file(
                &state.config.server.data_dir,
                original_name.as_deref(),
                content_type.as_deref(),
                &bytes,
            )
            .await?;
            form.images.push(url);
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid field value: {}", e)))?;

        match name.as_str() {
            "name" => form.name = value,
            "brand" => form.brand = value,
            "category" => form.category = value,
            "description" => form.description = value,
            "price" => {
                form.price =
                    Some(value.parse().map_err(|_| {
                        ApiError::bad_request("price must be an integer amount")
                    })?)
            }
            "discount_percent" => {
                form.discount_percent = Some(
                    value
                        .parse()
                        .map_err(|_| ApiError::bad_request("discount_percent must be an integer"))?,
                )
            }
            "stock" => {
                form.stock = value
                    .parse()
                    .map_err(|_| ApiError::bad_request("stock must be an integer"))?
            }
            "sizes" => form
                .sizes
                .extend(value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty())),
            _ => {}
        }
    }

    validate_required(&form.name, "name").map_err(ApiError::bad_request)?;
    let price = form
        .price
        .ok_or_else(|| ApiError::bad_request("price is required"))?;
    if price < 0 {
        return Err(ApiError::bad_request("price must not be negative"));
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let images_json = serde_json::to_string(&form.images)
        .map_err(|e| ApiError::internal(format!("Failed to encode images: {}", e)))?;
    let sizes_json = serde_json::to_string(&form.sizes)
        .map_err(|e| ApiError::internal(format!("Failed to encode sizes: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO products (id, name, brand, category, description, price, discount_percent, images, sizes, stock, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&form.name)
    .bind(&form.brand)
    .bind(&form.category)
    .bind(&form.description)
    .bind(price)
    .bind(form.discount_percent)
    .bind(&images_json)
    .bind(&sizes_json)
    .bind(form.stock)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(product = %product.name, "Product created");
    Ok((StatusCode::CREATED, ok(product.to_response())))
}

/// PUT /products/:id (admin)
///
/// Overwrites in place; there is no versioning.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    if let Some(price) = req.price {
        if price < 0 {
            return Err(ApiError::bad_request("price must not be negative"));
        }
    }

    let _existing = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    let images_json = match &req.images {
        Some(images) => Some(
            serde_json::to_string(images)
                .map_err(|e| ApiError::internal(format!("Failed to encode images: {}", e)))?,
        ),
        None => None,
    };
    let sizes_json = match &req.sizes {
        Some(sizes) => Some(
            serde_json::to_string(sizes)
                .map_err(|e| ApiError::internal(format!("Failed to encode sizes: {}", e)))?,
        ),
        None => None,
    };
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE products SET
            name = COALESCE(?, name),
            brand = COALESCE(?, brand),
            category = COALESCE(?, category),
            description = COALESCE(?, description),
            price = COALESCE(?, price),
            discount_percent = COALESCE(?, discount_percent),
            images = COALESCE(?, images),
            sizes = COALESCE(?, sizes),
            stock = COALESCE(?, stock),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.brand)
    .bind(&req.category)
    .bind(&req.description)
    .bind(req.price)
    .bind(req.discount_percent)
    .bind(&images_json)
    .bind(&sizes_json)
    .bind(req.stock)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await?;

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(ok(product.to_response()))
}

/// DELETE /products/:id (admin)
///
/// Orders referencing the product keep their snapshotted lines; nothing
/// cascades.
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductResponse>>, ApiError> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    sqlx::query("DELETE FROM products WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    tracing::info!(product = %product.name, "Product deleted");
    Ok(ok(product.to_response()))
}
