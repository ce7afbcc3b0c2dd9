use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartLine, CartList},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartItem,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// One cart row joined with the product it points at, carrying the name and
/// price the line would be ordered at.
#[derive(Debug, FromRow)]
pub struct CartProductRow {
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub price: i64,
    pub quantity: i32,
}

impl CartProductRow {
    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }
}

/// Reads the user's cart joined with products and computes the order total.
/// An empty cart yields `(vec![], 0)`; rejecting that is the caller's job.
///
/// Takes any executor so checkout can run it inside its transaction.
pub async fn aggregate_cart<'e, E>(
    executor: E,
    user_id: Uuid,
) -> AppResult<(Vec<CartProductRow>, i64)>
where
    E: sqlx::PgExecutor<'e>,
{
    let rows: Vec<CartProductRow> = sqlx::query_as(
        r#"
        SELECT ci.id AS cart_id, ci.product_id, ci.quantity,
               p.name AS product_name, p.price
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    let total = rows.iter().map(CartProductRow::line_total).sum();

    Ok((rows, total))
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let (rows, total) = aggregate_cart(&state.pool, user.user_id).await?;

    let items = rows
        .into_iter()
        .map(|row| CartLine {
            cart_id: row.cart_id,
            product_id: row.product_id,
            line_total: row.line_total(),
            product_name: row.product_name,
            price: row.price,
            quantity: row.quantity,
        })
        .collect();

    Ok(ApiResponse::success(
        "OK",
        CartList { items, total },
        Some(Meta::empty()),
    ))
}

/// Adding a product already in the cart bumps its quantity by 1 instead of
/// inserting a second row. The bump is read-then-write, so two concurrent
/// adds for the same product can lose one increment.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exist.is_none() {
        return Err(AppError::BadRequest("product not found".to_string()));
    }

    let exist: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(payload.product_id)
            .fetch_optional(&state.pool)
            .await?;

    let cart_item = if let Some(item) = exist {
        sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items
            SET quantity = $3
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(user.user_id)
        .bind(item.quantity + 1)
        .fetch_one(&state.pool)
        .await?
    } else {
        sqlx::query_as(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, quantity)
            VALUES ($1, $2, $3, 1)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.user_id)
        .bind(payload.product_id)
        .fetch_one(&state.pool)
        .await?
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": cart_item.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("OK", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
