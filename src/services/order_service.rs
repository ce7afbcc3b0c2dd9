use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CheckoutResponse, OrderList, OrderWithItems, UpdateOrderStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service,
    state::AppState,
};

/// Creates an order from the caller's cart: one orders row, one order_items
/// row per cart line snapshotting the current product name and price, then
/// clears the cart. The whole sequence runs in a single transaction, so a
/// failed item insert cannot leave an orphaned order behind.
///
/// Not idempotent: two rapid checkouts can both read the same cart and each
/// produce an order. There is no compare-and-clear on cart consumption.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let mut txn = state.pool.begin().await?;

    let (lines, total_amount) = cart_service::aggregate_cart(&mut *txn, user.user_id).await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("cart is empty".into()));
    }

    let order: Order = sqlx::query_as(
        r#"
        INSERT INTO orders (id, user_id, total_amount, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(total_amount)
    .fetch_one(&mut *txn)
    .await?;

    for line in &lines {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, product_name, price, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order.id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(line.price)
        .bind(line.quantity)
        .execute(&mut *txn)
        .await?;
    }

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created",
        CheckoutResponse {
            order_id: order.id,
            total_amount: order.total_amount,
        },
        Some(Meta::empty()),
    ))
}

/// Admins see every order; everyone else only their own.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let status = query.status.as_deref().filter(|s| !s.is_empty());

    let sql = format!(
        r#"
        SELECT * FROM orders
        WHERE ($1 OR user_id = $2) AND ($3::text IS NULL OR status = $3)
        ORDER BY created_at {}
        LIMIT $4 OFFSET $5
        "#,
        sort_order.as_sql()
    );

    let orders: Vec<Order> = sqlx::query_as(&sql)
        .bind(user.is_admin())
        .bind(user.user_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.pool)
        .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT count(*) FROM orders
        WHERE ($1 OR user_id = $2) AND ($3::text IS NULL OR status = $3)
        "#,
    )
    .bind(user.is_admin())
    .bind(user.user_id)
    .bind(status)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if !user.is_admin() && order.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let items: Vec<OrderItem> =
        sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at")
            .bind(order.id)
            .fetch_all(&state.pool)
            .await?;

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

/// Simulated payment capture: no gateway, just the pending → paid
/// transition, restricted to the order's owner.
pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let mut txn = state.pool.begin().await?;

    let order: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    if OrderStatus::parse(&order.status) != Some(OrderStatus::Pending) {
        return Err(AppError::BadRequest(format!(
            "order cannot be paid (status: {})",
            order.status
        )));
    }

    let order: Order = sqlx::query_as("UPDATE orders SET status = 'paid' WHERE id = $1 RETURNING *")
        .bind(id)
        .fetch_one(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_paid",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment recorded",
        order,
        Some(Meta::empty()),
    ))
}

/// Admin-only status change, gated by the order state machine rather than a
/// free choice of the five values.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;

    let next = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::BadRequest("invalid order status".into()))?;

    let mut txn = state.pool.begin().await?;

    let existing: Option<Order> = sqlx::query_as("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *txn)
        .await?;
    let existing = match existing {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let current = OrderStatus::parse(&existing.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "order {} has unknown status {:?}",
            existing.id,
            existing.status
        ))
    })?;

    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "cannot change status from {current} to {next}"
        )));
    }

    let order: Order = sqlx::query_as("UPDATE orders SET status = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "from": current.as_str(), "to": order.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    ))
}

/// Admin-only. Items and order go in one transaction; deleting an order
/// that does not exist is a no-op success.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let mut txn = state.pool.begin().await?;

    sqlx::query("DELETE FROM order_items WHERE order_id = $1")
        .bind(id)
        .execute(&mut *txn)
        .await?;

    sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(&mut *txn)
        .await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delete",
        Some("orders"),
        Some(serde_json::json!({ "order_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
